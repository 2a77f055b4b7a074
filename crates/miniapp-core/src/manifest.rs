//! The domain manifest a mini-app serves at `/.well-known/farcaster.json`.
//!
//! Hosts read it before adding a mini-app; a manifest that fails these checks
//! is what `invalid_domain_manifest` reports.

use crate::embed::{MAX_APP_NAME_LEN, MAX_BUTTON_TITLE_LEN, MAX_URL_LEN};
use crate::schema::{Object, Schema, ValidationError};
use serde::Serialize;
use serde_json::Value;

pub const WELL_KNOWN_PATH: &str = "/.well-known/farcaster.json";
pub const MAX_MANIFEST_URL_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainManifest {
    pub account_association: AccountAssociation,
    pub frame: FrameConfig,
}

/// Signed claim binding the domain to an account. The fields are
/// base64url-encoded and passed through unverified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountAssociation {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameConfig {
    pub version: String,
    pub name: String,
    pub home_url: String,
    pub icon_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splash_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splash_background_color: Option<String>,
    /// Where the host POSTs [`ServerEvent`](crate::ServerEvent)s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl Schema for DomainManifest {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        let association_path = obj.child("accountAssociation");
        let frame_path = obj.child("frame");
        Ok(Self {
            account_association: AccountAssociation::validate_at(
                obj.required_object("accountAssociation")?,
                &association_path,
            )?,
            frame: FrameConfig::validate_at(obj.required_object("frame")?, &frame_path)?,
        })
    }
}

impl Schema for AccountAssociation {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        Ok(Self {
            header: obj.bounded_str("header", usize::MAX)?.to_string(),
            payload: obj.bounded_str("payload", usize::MAX)?.to_string(),
            signature: obj.bounded_str("signature", usize::MAX)?.to_string(),
        })
    }
}

impl Schema for FrameConfig {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        let owned = |s: Option<&str>| s.map(str::to_string);
        Ok(Self {
            version: obj.discriminant("version", &["1", "next"])?.to_string(),
            name: obj.bounded_str("name", MAX_APP_NAME_LEN)?.to_string(),
            home_url: obj.secure_url("homeUrl", MAX_MANIFEST_URL_LEN)?.to_string(),
            icon_url: obj.secure_url("iconUrl", MAX_MANIFEST_URL_LEN)?.to_string(),
            image_url: owned(obj.optional_secure_url("imageUrl", MAX_URL_LEN)?),
            button_title: owned(obj.optional_bounded_str("buttonTitle", MAX_BUTTON_TITLE_LEN)?),
            splash_image_url: owned(
                obj.optional_secure_url("splashImageUrl", MAX_MANIFEST_URL_LEN)?,
            ),
            splash_background_color: owned(obj.optional_hex_color("splashBackgroundColor")?),
            webhook_url: owned(obj.optional_secure_url("webhookUrl", MAX_MANIFEST_URL_LEN)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "accountAssociation": {
                "header": "eyJmaWQiOjF9",
                "payload": "eyJkb21haW4iOiJhcHAuZXhhbXBsZSJ9",
                "signature": "MHgxMjM0"
            },
            "frame": {
                "version": "1",
                "name": "Demo",
                "homeUrl": "https://app.example",
                "iconUrl": "https://app.example/icon.png",
                "webhookUrl": "https://app.example/api/webhook"
            }
        })
    }

    #[test]
    fn valid_manifest() {
        let raw = sample();
        let manifest = DomainManifest::validate(&raw).unwrap();
        assert_eq!(
            manifest.frame.webhook_url.as_deref(),
            Some("https://app.example/api/webhook")
        );
        assert_eq!(serde_json::to_value(&manifest).unwrap(), raw);
    }

    #[test]
    fn missing_association() {
        let mut raw = sample();
        raw.as_object_mut().unwrap().remove("accountAssociation");
        assert_eq!(
            DomainManifest::validate(&raw).unwrap_err().path,
            "$.accountAssociation"
        );
    }

    #[test]
    fn home_url_length_limit() {
        let mut raw = sample();
        raw["frame"]["homeUrl"] = json!(format!("https://app.example/{}", "a".repeat(512)));
        assert_eq!(DomainManifest::validate(&raw).unwrap_err().path, "$.frame.homeUrl");
    }

    #[test]
    fn unknown_version() {
        let mut raw = sample();
        raw["frame"]["version"] = json!("0");
        assert_eq!(DomainManifest::validate(&raw).unwrap_err().path, "$.frame.version");
    }
}
