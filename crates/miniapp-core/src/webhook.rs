//! Decoded header of a signed webhook envelope.

use crate::identity::Fid;
use crate::schema::{Object, Schema, ValidationError};
use serde::Serialize;
use serde_json::Value;

/// Which key signed the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerKind {
    Custody,
    AppKey,
}

impl SignerKind {
    pub const ALL: [SignerKind; 2] = [Self::Custody, Self::AppKey];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Custody => "custody",
            Self::AppKey => "app_key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookHeader {
    pub fid: Fid,
    #[serde(rename = "type")]
    pub signer: SignerKind,
    /// Hex-encoded public key of the signer.
    pub key: String,
}

impl Schema for WebhookHeader {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        let key = obj.required_str("key")?;
        if !key.starts_with("0x") || key.len() <= 2 || !key[2..].chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(ValidationError::format(obj.child("key"), "key must be 0x-prefixed hex"));
        }
        Ok(Self {
            fid: Fid::new(obj.required_u64("fid")?),
            signer: obj.variant("type", &SignerKind::ALL, SignerKind::as_str)?,
            key: key.to_string(),
        })
    }
}
