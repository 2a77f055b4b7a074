//! Notification credentials and the send-notification wire shapes.

use crate::schema::{Object, Schema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_TITLE_LEN: usize = 32;
pub const MAX_BODY_LEN: usize = 128;
pub const MAX_TARGET_URL_LEN: usize = 256;
pub const MAX_NOTIFICATION_ID_LEN: usize = 128;
pub const MAX_TOKENS_PER_REQUEST: usize = 100;

/// Credentials the host grants a mini-app for pushing notifications to one
/// user. Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationDetails {
    /// Endpoint the notification is POSTed to.
    pub url: String,
    pub token: String,
}

impl NotificationDetails {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }
}

impl Schema for NotificationDetails {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        Ok(Self {
            url: obj.web_url("url")?.to_string(),
            token: obj.bounded_str("token", usize::MAX)?.to_string(),
        })
    }
}

/// Body POSTed to [`NotificationDetails::url`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    /// Idempotency key; the host drops repeats for the same token.
    pub notification_id: String,
    pub title: String,
    pub body: String,
    /// Opened when the user taps the notification.
    pub target_url: String,
    pub tokens: Vec<String>,
}

impl SendNotificationRequest {
    /// Build a request, enforcing the host's field limits.
    pub fn new(
        notification_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        target_url: impl Into<String>,
        tokens: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let request = Self {
            notification_id: notification_id.into(),
            title: title.into(),
            body: body.into(),
            target_url: target_url.into(),
            tokens,
        };
        let raw = serde_json::json!({
            "notificationId": request.notification_id,
            "title": request.title,
            "body": request.body,
            "targetUrl": request.target_url,
            "tokens": request.tokens,
        });
        Self::validate(&raw)?;
        Ok(request)
    }
}

impl Schema for SendNotificationRequest {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        let tokens = obj.string_array("tokens")?;
        if tokens.is_empty() || tokens.len() > MAX_TOKENS_PER_REQUEST {
            return Err(ValidationError::format(
                obj.child("tokens"),
                format!("must contain 1 to {MAX_TOKENS_PER_REQUEST} tokens"),
            ));
        }
        Ok(Self {
            notification_id: obj
                .bounded_str("notificationId", MAX_NOTIFICATION_ID_LEN)?
                .to_string(),
            title: obj.bounded_str("title", MAX_TITLE_LEN)?.to_string(),
            body: obj.bounded_str("body", MAX_BODY_LEN)?.to_string(),
            target_url: obj.secure_url("targetUrl", MAX_TARGET_URL_LEN)?.to_string(),
            tokens,
        })
    }
}

/// Host reply to a [`SendNotificationRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResponse {
    pub successful_tokens: Vec<String>,
    /// Tokens the host no longer recognises.
    pub invalid_tokens: Vec<String>,
    pub rate_limited_tokens: Vec<String>,
}

impl Schema for SendNotificationResponse {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let outer = Object::new(raw, path)?;
        let result = outer.required_object("result")?;
        let result_path = outer.child("result");
        let obj = Object::new(result, &result_path)?;
        Ok(Self {
            successful_tokens: obj.string_array("successfulTokens")?,
            invalid_tokens: obj.string_array("invalidTokens")?,
            rate_limited_tokens: obj.string_array("rateLimitedTokens")?,
        })
    }
}
