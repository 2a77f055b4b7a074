//! `actions.signIn`: request a Sign-In-With-Farcaster message signed by the
//! user's custody key.

use crate::action::{Action, ActionErrorKind};
use crate::capability::CapabilityId;
use crate::schema::{Object, Schema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct SignIn;

impl Action for SignIn {
    const CAPABILITY: CapabilityId = CapabilityId::SignIn;
    type Params = SignInParams;
    type Output = SignInResult;
    type Error = SignInError;
}

pub const MIN_NONCE_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInParams {
    /// Server-issued nonce, alphanumeric.
    pub nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
}

impl SignInParams {
    pub fn new(nonce: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
            not_before: None,
            expiration_time: None,
        }
    }
}

impl Schema for SignInParams {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        let nonce = obj.required_str("nonce")?;
        if nonce.len() < MIN_NONCE_LEN || !nonce.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::format(
                obj.child("nonce"),
                format!("nonce must be at least {MIN_NONCE_LEN} alphanumeric characters"),
            ));
        }
        Ok(Self {
            nonce: nonce.to_string(),
            not_before: obj.optional_str("notBefore")?.map(str::to_string),
            expiration_time: obj.optional_str("expirationTime")?.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInResult {
    pub signature: String,
    pub message: String,
}

impl Schema for SignInResult {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        Ok(Self {
            signature: obj.bounded_str("signature", usize::MAX)?.to_string(),
            message: obj.bounded_str("message", usize::MAX)?.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignInError {
    RejectedByUser,
}

impl ActionErrorKind for SignInError {
    const ACTION: &'static str = "SignIn";
    const VARIANTS: &'static [Self] = &[Self::RejectedByUser];

    fn type_tag(&self) -> &'static str {
        match self {
            Self::RejectedByUser => "rejected_by_user",
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::RejectedByUser => "RejectedByUser",
        }
    }
}
