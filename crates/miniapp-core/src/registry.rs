//! Runtime lookup of wire shapes by name.
//!
//! [`validate_shape`] is the untyped entry point for callers that only learn
//! which shape to expect at runtime, e.g. a bridge routing raw frames.

use crate::actions::{AddMiniAppResult, SignInResult};
use crate::embed::FrameEmbed;
use crate::event::ServerEvent;
use crate::manifest::DomainManifest;
use crate::notification::{NotificationDetails, SendNotificationResponse};
use crate::schema::{Schema, ValidationError};
use crate::webhook::WebhookHeader;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeId {
    ServerEvent,
    NotificationDetails,
    FrameEmbed,
    DomainManifest,
    AddMiniAppResult,
    SignInResult,
    WebhookHeader,
    SendNotificationResponse,
}

impl ShapeId {
    pub const ALL: [ShapeId; 8] = [
        Self::ServerEvent,
        Self::NotificationDetails,
        Self::FrameEmbed,
        Self::DomainManifest,
        Self::AddMiniAppResult,
        Self::SignInResult,
        Self::WebhookHeader,
        Self::SendNotificationResponse,
    ];
}

/// A validated value of some [`ShapeId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    ServerEvent(ServerEvent),
    NotificationDetails(NotificationDetails),
    FrameEmbed(FrameEmbed),
    DomainManifest(DomainManifest),
    AddMiniAppResult(AddMiniAppResult),
    SignInResult(SignInResult),
    WebhookHeader(WebhookHeader),
    SendNotificationResponse(SendNotificationResponse),
}

impl TypedValue {
    pub fn shape(&self) -> ShapeId {
        match self {
            Self::ServerEvent(_) => ShapeId::ServerEvent,
            Self::NotificationDetails(_) => ShapeId::NotificationDetails,
            Self::FrameEmbed(_) => ShapeId::FrameEmbed,
            Self::DomainManifest(_) => ShapeId::DomainManifest,
            Self::AddMiniAppResult(_) => ShapeId::AddMiniAppResult,
            Self::SignInResult(_) => ShapeId::SignInResult,
            Self::WebhookHeader(_) => ShapeId::WebhookHeader,
            Self::SendNotificationResponse(_) => ShapeId::SendNotificationResponse,
        }
    }
}

/// Validate `raw` against `shape`.
pub fn validate_shape(shape: ShapeId, raw: &Value) -> Result<TypedValue, ValidationError> {
    let typed = match shape {
        ShapeId::ServerEvent => TypedValue::ServerEvent(Schema::validate(raw)?),
        ShapeId::NotificationDetails => TypedValue::NotificationDetails(Schema::validate(raw)?),
        ShapeId::FrameEmbed => TypedValue::FrameEmbed(Schema::validate(raw)?),
        ShapeId::DomainManifest => TypedValue::DomainManifest(Schema::validate(raw)?),
        ShapeId::AddMiniAppResult => TypedValue::AddMiniAppResult(Schema::validate(raw)?),
        ShapeId::SignInResult => TypedValue::SignInResult(Schema::validate(raw)?),
        ShapeId::WebhookHeader => TypedValue::WebhookHeader(Schema::validate(raw)?),
        ShapeId::SendNotificationResponse => {
            TypedValue::SendNotificationResponse(Schema::validate(raw)?)
        }
    };
    Ok(typed)
}
