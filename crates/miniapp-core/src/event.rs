//! Lifecycle events pushed by the host.

use crate::notification::NotificationDetails;
use crate::schema::{Object, Schema, ValidationError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Events sent from host to mini-app backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The user added the mini-app. Carries details if notifications were
    /// granted at the same time.
    FrameAdded {
        #[serde(
            rename = "notificationDetails",
            skip_serializing_if = "Option::is_none"
        )]
        notification_details: Option<NotificationDetails>,
    },
    /// The user removed the mini-app.
    FrameRemoved,
    NotificationsEnabled {
        #[serde(rename = "notificationDetails")]
        notification_details: NotificationDetails,
    },
    NotificationsDisabled,
}

impl ServerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::FrameAdded { .. } => EventKind::FrameAdded,
            Self::FrameRemoved => EventKind::FrameRemoved,
            Self::NotificationsEnabled { .. } => EventKind::NotificationsEnabled,
            Self::NotificationsDisabled => EventKind::NotificationsDisabled,
        }
    }

    /// Details carried by the event, if any.
    pub fn notification_details(&self) -> Option<&NotificationDetails> {
        match self {
            Self::FrameAdded {
                notification_details,
            } => notification_details.as_ref(),
            Self::NotificationsEnabled {
                notification_details,
            } => Some(notification_details),
            Self::FrameRemoved | Self::NotificationsDisabled => None,
        }
    }
}

/// Discriminant of a [`ServerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FrameAdded,
    FrameRemoved,
    NotificationsEnabled,
    NotificationsDisabled,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        Self::FrameAdded,
        Self::FrameRemoved,
        Self::NotificationsEnabled,
        Self::NotificationsDisabled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FrameAdded => "frame_added",
            Self::FrameRemoved => "frame_removed",
            Self::NotificationsEnabled => "notifications_enabled",
            Self::NotificationsDisabled => "notifications_disabled",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Schema for ServerEvent {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        let kind = obj.variant("event", &EventKind::ALL, EventKind::as_str)?;
        let details_path = obj.child("notificationDetails");

        let event = match kind {
            EventKind::FrameAdded => Self::FrameAdded {
                notification_details: obj
                    .get("notificationDetails")
                    .map(|v| NotificationDetails::validate_at(v, &details_path))
                    .transpose()?,
            },
            EventKind::FrameRemoved => Self::FrameRemoved,
            EventKind::NotificationsEnabled => Self::NotificationsEnabled {
                notification_details: NotificationDetails::validate_at(
                    obj.required("notificationDetails")?,
                    &details_path,
                )?,
            },
            EventKind::NotificationsDisabled => Self::NotificationsDisabled,
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ErrorKind, JsonType};
    use serde_json::json;

    fn details(token: &str) -> Value {
        json!({"url": "https://api.host.example/v1/notify", "token": token})
    }

    #[test]
    fn validates_every_variant_without_field_loss() {
        let samples = [
            json!({"event": "frame_added", "notificationDetails": details("t1")}),
            json!({"event": "frame_added"}),
            json!({"event": "frame_removed"}),
            json!({"event": "notifications_enabled", "notificationDetails": details("t2")}),
            json!({"event": "notifications_disabled"}),
        ];
        for raw in samples {
            let event = ServerEvent::validate(&raw).unwrap();
            assert_eq!(event.kind().as_str(), raw["event"]);
            assert_eq!(serde_json::to_value(&event).unwrap(), raw);
        }
    }

    #[test]
    fn frame_added_keeps_details() {
        let raw = json!({"event": "frame_added", "notificationDetails": details("t1")});
        let event = ServerEvent::validate(&raw).unwrap();
        assert_eq!(event.notification_details().unwrap().token, "t1");
    }

    #[test]
    fn unknown_event_is_rejected() {
        for raw in [
            json!({"event": "frame_updated"}),
            json!({"event": "FRAME_ADDED"}),
            json!({"event": 3}),
            json!({"notificationDetails": details("t")}),
        ] {
            let err = ServerEvent::validate(&raw).unwrap_err();
            assert!(
                matches!(err.kind, ErrorKind::UnknownVariant { ref field, .. } if field == "event"),
                "{raw}: {err}"
            );
        }
    }

    #[test]
    fn enabled_requires_details() {
        let err = ServerEvent::validate(&json!({"event": "notifications_enabled"})).unwrap_err();
        assert_eq!(err.path, "$.notificationDetails");
        assert_eq!(err.kind, ErrorKind::MissingField);
    }

    #[test]
    fn explicit_null_details_are_rejected() {
        let null_object = ErrorKind::InvalidType {
            expected: "object",
            found: JsonType::Null,
        };
        for event in ["frame_added", "notifications_enabled"] {
            let raw = json!({"event": event, "notificationDetails": null});
            let err = ServerEvent::validate(&raw).unwrap_err();
            assert_eq!(err.path, "$.notificationDetails", "{event}");
            assert_eq!(err.kind, null_object, "{event}");
        }
    }

    #[test]
    fn nested_error_path() {
        let raw = json!({
            "event": "notifications_enabled",
            "notificationDetails": {"url": "https://h.example", "token": 5}
        });
        let err = ServerEvent::validate(&raw).unwrap_err();
        assert_eq!(err.path, "$.notificationDetails.token");
    }

    #[test]
    fn removed_ignores_extra_fields() {
        let raw = json!({"event": "frame_removed", "notificationDetails": details("t")});
        assert_eq!(ServerEvent::validate(&raw).unwrap(), ServerEvent::FrameRemoved);
    }
}
