//! `actions.addMiniApp`: ask the user to add the mini-app to their client.

use crate::action::{Action, ActionErrorKind};
use crate::capability::CapabilityId;
use crate::notification::NotificationDetails;
use crate::schema::{Object, Schema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct AddMiniApp;

impl Action for AddMiniApp {
    const CAPABILITY: CapabilityId = CapabilityId::AddMiniApp;
    type Params = ();
    type Output = AddMiniAppResult;
    type Error = AddMiniAppError;
}

/// Present when the user also granted notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMiniAppResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_details: Option<NotificationDetails>,
}

impl Schema for AddMiniAppResult {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        let details_path = obj.child("notificationDetails");
        Ok(Self {
            notification_details: obj
                .get("notificationDetails")
                .map(|v| NotificationDetails::validate_at(v, &details_path))
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddMiniAppError {
    /// The host could not fetch or validate the domain manifest.
    InvalidDomainManifest,
    RejectedByUser,
}

impl ActionErrorKind for AddMiniAppError {
    const ACTION: &'static str = "AddMiniApp";
    const VARIANTS: &'static [Self] = &[Self::InvalidDomainManifest, Self::RejectedByUser];

    fn type_tag(&self) -> &'static str {
        match self {
            Self::InvalidDomainManifest => "invalid_domain_manifest",
            Self::RejectedByUser => "rejected_by_user",
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::InvalidDomainManifest => "InvalidDomainManifest",
            Self::RejectedByUser => "RejectedByUser",
        }
    }
}
