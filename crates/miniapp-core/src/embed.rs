//! The embed a mini-app publishes so hosts can render it in a feed.

use crate::schema::{Object, Schema, ValidationError};
use serde::Serialize;
use serde_json::Value;

pub const MAX_URL_LEN: usize = 1024;
pub const MAX_BUTTON_TITLE_LEN: usize = 32;
pub const MAX_APP_NAME_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:2")]
    Landscape,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 2] = [Self::Square, Self::Landscape];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "3:2",
        }
    }
}

/// Embed metadata, `version: "next"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEmbed {
    pub version: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    pub button: EmbedButton,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedButton {
    pub title: String,
    pub action: EmbedAction,
}

/// What tapping the embed button does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbedAction {
    LaunchFrame(LaunchFrame),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchFrame {
    pub name: String,
    /// Defaults to the page the embed was found on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splash_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splash_background_color: Option<String>,
}

impl Schema for FrameEmbed {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        let version = obj.discriminant("version", &["next"])?.to_string();
        let image_url = obj.secure_url("imageUrl", MAX_URL_LEN)?.to_string();
        let aspect_ratio = if obj.contains("aspectRatio") {
            Some(obj.variant("aspectRatio", &AspectRatio::ALL, AspectRatio::as_str)?)
        } else {
            None
        };
        let button_path = obj.child("button");
        let button = EmbedButton::validate_at(obj.required_object("button")?, &button_path)?;
        Ok(Self {
            version,
            image_url,
            aspect_ratio,
            button,
        })
    }
}

impl Schema for EmbedButton {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        let title = obj.bounded_str("title", MAX_BUTTON_TITLE_LEN)?.to_string();
        let action_path = obj.child("action");
        let action = EmbedAction::validate_at(obj.required_object("action")?, &action_path)?;
        Ok(Self { title, action })
    }
}

impl Schema for EmbedAction {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        obj.discriminant("type", &["launch_frame"])?;
        Ok(Self::LaunchFrame(LaunchFrame {
            name: obj.bounded_str("name", MAX_APP_NAME_LEN)?.to_string(),
            url: obj.optional_secure_url("url", MAX_URL_LEN)?.map(str::to_string),
            splash_image_url: obj
                .optional_secure_url("splashImageUrl", MAX_URL_LEN)?
                .map(str::to_string),
            splash_background_color: obj
                .optional_hex_color("splashBackgroundColor")?
                .map(str::to_string),
        }))
    }
}
