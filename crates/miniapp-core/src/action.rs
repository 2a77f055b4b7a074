//! Action outcomes and their two projections.
//!
//! An action's outcome is one canonical value, [`ActionResult`]. In-process
//! callers see it as `Result<T, ActionFailure<E>>` (the thrown form); callers
//! across a message boundary see it as JSON, `{"result": ...}` or
//! `{"error": {"type": ...}}` (the wire form). Both are projections of the
//! same value and convert losslessly into each other.

use crate::capability::CapabilityId;
use crate::schema::{ErrorKind, Object, ROOT, Schema, ValidationError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A host action a mini-app can invoke.
pub trait Action {
    /// Capability that must be negotiated before invoking.
    const CAPABILITY: CapabilityId;

    type Params: Schema + Serialize + Send + Sync;
    type Output: Schema + Serialize + Clone + PartialEq + fmt::Debug + Send;
    type Error: ActionErrorKind;
}

/// The enumerated business failures of one action.
///
/// Implementors serialize as an object tagged by `type`. Every variant has
/// exactly one wire tag and one variant name.
pub trait ActionErrorKind:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Prefix of [`ActionFailure::name`], e.g. `AddMiniApp`.
    const ACTION: &'static str;

    /// Every variant, with default field values where a variant has fields.
    const VARIANTS: &'static [Self];

    /// Wire discriminant, e.g. `rejected_by_user`.
    fn type_tag(&self) -> &'static str;

    /// In-process name, e.g. `RejectedByUser`.
    fn variant_name(&self) -> &'static str;

    fn from_type_tag(tag: &str) -> Option<Self> {
        Self::VARIANTS.iter().find(|v| v.type_tag() == tag).cloned()
    }

    fn from_variant_name(name: &str) -> Option<Self> {
        Self::VARIANTS.iter().find(|v| v.variant_name() == name).cloned()
    }
}

/// Thrown form of an action error.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionFailure<E> {
    name: String,
    kind: E,
}

impl<E: ActionErrorKind> ActionFailure<E> {
    pub fn new(kind: E) -> Self {
        Self {
            name: format!("{}.{}", E::ACTION, kind.variant_name()),
            kind,
        }
    }

    /// Stable diagnostic name, `<Action>.<ErrorVariant>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &E {
        &self.kind
    }

    pub fn into_kind(self) -> E {
        self.kind
    }
}

impl<E> fmt::Display for ActionFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<E: fmt::Debug> std::error::Error for ActionFailure<E> {}

impl<E: ActionErrorKind> From<E> for ActionFailure<E> {
    fn from(kind: E) -> Self {
        Self::new(kind)
    }
}

/// Canonical outcome: exactly one of a result or an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ActionResult<T, E> {
    #[serde(rename = "result")]
    Ok(T),
    #[serde(rename = "error")]
    Err(E),
}

impl<T, E: ActionErrorKind> ActionResult<T, E> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Project to the thrown form.
    pub fn into_thrown(self) -> Result<T, ActionFailure<E>> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(kind) => Err(ActionFailure::new(kind)),
        }
    }

    /// Rebuild the canonical outcome from the thrown form.
    pub fn from_thrown(thrown: Result<T, ActionFailure<E>>) -> Self {
        match thrown {
            Ok(value) => Self::Ok(value),
            Err(failure) => Self::Err(failure.into_kind()),
        }
    }
}

impl<T: Serialize, E: ActionErrorKind> ActionResult<T, E> {
    /// Project to the wire form.
    pub fn to_wire(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl<T: Schema, E: ActionErrorKind> ActionResult<T, E> {
    /// Parse a wire form. The object must carry exactly one of `result` or
    /// `error` and nothing else.
    pub fn from_wire(raw: &Value) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, ROOT)?;
        obj.deny_unknown(&["result", "error"])?;
        let result_path = obj.child("result");
        let error_path = obj.child("error");
        // A key holding `null` is still present.
        match (obj.get("result"), obj.get("error")) {
            (Some(result), None) => T::validate_at(result, &result_path).map(Self::Ok),
            (None, Some(error)) => parse_error(error, &error_path).map(Self::Err),
            _ => Err(ValidationError::new(
                ROOT,
                ErrorKind::ExclusiveKeys(vec!["result", "error"]),
            )),
        }
    }
}

fn parse_error<E: ActionErrorKind>(raw: &Value, path: &str) -> Result<E, ValidationError> {
    let obj = Object::new(raw, path)?;
    let tags: Vec<&str> = E::VARIANTS.iter().map(|v| v.type_tag()).collect();
    obj.discriminant("type", &tags)?;
    serde_json::from_value(raw.clone())
        .map_err(|e| ValidationError::format(path, e.to_string()))
}

/// Thrown form to wire form.
pub fn thrown_to_wire<T: Serialize + Clone, E: ActionErrorKind>(
    thrown: &Result<T, ActionFailure<E>>,
) -> Result<Value, serde_json::Error> {
    ActionResult::from_thrown(thrown.clone()).to_wire()
}

/// Wire form to thrown form.
pub fn wire_to_thrown<T: Schema, E: ActionErrorKind>(
    raw: &Value,
) -> Result<Result<T, ActionFailure<E>>, ValidationError> {
    ActionResult::<T, E>::from_wire(raw).map(ActionResult::into_thrown)
}
