//! Host capabilities and negotiation.
//!
//! The set of capabilities is closed per [`ProtocolVersion`]. Parsing an id
//! outside the set fails; negotiation never fails and simply drops what the
//! host does not support.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A host feature a mini-app may query and invoke.
///
/// `Ord` follows declaration order, which is also wire listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CapabilityId {
    Ready,
    OpenUrl,
    Close,
    SetPrimaryButton,
    AddMiniApp,
    SignIn,
    ViewProfile,
    ComposeCast,
    GetEthereumProvider,
}

impl CapabilityId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "actions.ready",
            Self::OpenUrl => "actions.openUrl",
            Self::Close => "actions.close",
            Self::SetPrimaryButton => "actions.setPrimaryButton",
            Self::AddMiniApp => "actions.addMiniApp",
            Self::SignIn => "actions.signIn",
            Self::ViewProfile => "actions.viewProfile",
            Self::ComposeCast => "actions.composeCast",
            Self::GetEthereumProvider => "wallet.getEthereumProvider",
        }
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityId {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProtocolVersion::LATEST
            .capabilities()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

impl TryFrom<String> for CapabilityId {
    type Error = UnknownCapability;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CapabilityId> for String {
    fn from(id: CapabilityId) -> Self {
        id.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capability: {0}")]
pub struct UnknownCapability(pub String);

/// Protocol version; each version owns a closed capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    #[default]
    V1,
}

const V1_CAPABILITIES: &[CapabilityId] = &[
    CapabilityId::Ready,
    CapabilityId::OpenUrl,
    CapabilityId::Close,
    CapabilityId::SetPrimaryButton,
    CapabilityId::AddMiniApp,
    CapabilityId::SignIn,
    CapabilityId::ViewProfile,
    CapabilityId::ComposeCast,
    CapabilityId::GetEthereumProvider,
];

impl ProtocolVersion {
    pub const LATEST: ProtocolVersion = ProtocolVersion::V1;

    /// All capabilities of this version, in declaration order.
    pub const fn capabilities(self) -> &'static [CapabilityId] {
        match self {
            Self::V1 => V1_CAPABILITIES,
        }
    }
}

/// The capabilities available in one host session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRegistry {
    version: ProtocolVersion,
    supported: BTreeSet<CapabilityId>,
}

impl CapabilityRegistry {
    /// Registry supporting every capability of `version`.
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            supported: version.capabilities().iter().copied().collect(),
        }
    }

    /// Registry narrowed to `supported`. Ids outside `version` are dropped.
    pub fn with_supported(
        version: ProtocolVersion,
        supported: impl IntoIterator<Item = CapabilityId>,
    ) -> Self {
        let all = version.capabilities();
        Self {
            version,
            supported: supported.into_iter().filter(|c| all.contains(c)).collect(),
        }
    }

    /// Registry built from the strings a host advertises. Unknown ids are
    /// rejected and logged, never accepted.
    pub fn from_advertised<S: AsRef<str>>(version: ProtocolVersion, advertised: &[S]) -> Self {
        let parsed = advertised.iter().filter_map(|raw| {
            let raw = raw.as_ref();
            match raw.parse::<CapabilityId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!("Rejecting advertised capability: {}", e);
                    None
                }
            }
        });
        Self::with_supported(version, parsed)
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Supported capabilities in declaration order.
    pub fn list_capabilities(&self) -> Vec<CapabilityId> {
        self.version
            .capabilities()
            .iter()
            .copied()
            .filter(|c| self.supported.contains(c))
            .collect()
    }

    /// Whether `id` is in the supported set.
    pub fn supports(&self, id: CapabilityId) -> bool {
        self.supported.contains(&id)
    }

    /// Intersection of `requested` and the supported set. Never fails; a
    /// missing capability means the caller should degrade gracefully.
    pub fn negotiate(
        &self,
        requested: impl IntoIterator<Item = CapabilityId>,
    ) -> BTreeSet<CapabilityId> {
        requested
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new(ProtocolVersion::LATEST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip_through_strings() {
        for &id in ProtocolVersion::V1.capabilities() {
            assert_eq!(id.as_str().parse::<CapabilityId>().unwrap(), id);
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(serde_json::from_str::<CapabilityId>(&json).unwrap(), id);
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert_eq!(
            "actions.teleport".parse::<CapabilityId>(),
            Err(UnknownCapability("actions.teleport".into()))
        );
        assert!(serde_json::from_str::<CapabilityId>("\"actions.teleport\"").is_err());
    }

    #[test]
    fn list_follows_declaration_order() {
        let registry = CapabilityRegistry::with_supported(
            ProtocolVersion::V1,
            [CapabilityId::SignIn, CapabilityId::Ready, CapabilityId::AddMiniApp],
        );
        assert_eq!(
            registry.list_capabilities(),
            vec![CapabilityId::Ready, CapabilityId::AddMiniApp, CapabilityId::SignIn]
        );
        assert_eq!(
            CapabilityRegistry::default().list_capabilities(),
            ProtocolVersion::V1.capabilities()
        );
    }

    #[test]
    fn negotiate_returns_intersection() {
        use CapabilityId::{AddMiniApp, ComposeCast, SignIn, ViewProfile};
        let registry =
            CapabilityRegistry::with_supported(ProtocolVersion::V1, [AddMiniApp, SignIn, ViewProfile]);
        let negotiated = registry.negotiate([SignIn, ViewProfile, ComposeCast]);
        assert_eq!(negotiated, BTreeSet::from([SignIn, ViewProfile]));
    }

    #[test]
    fn negotiate_empty_is_empty() {
        let registry = CapabilityRegistry::with_supported(ProtocolVersion::V1, std::iter::empty());
        assert!(registry.negotiate([CapabilityId::Close]).is_empty());
        assert!(!registry.supports(CapabilityId::Close));
    }

    #[test]
    fn advertised_unknown_ids_are_dropped() {
        let registry = CapabilityRegistry::from_advertised(
            ProtocolVersion::V1,
            &["actions.signIn", "actions.teleport", "wallet.getEthereumProvider"],
        );
        assert_eq!(
            registry.list_capabilities(),
            vec![CapabilityId::SignIn, CapabilityId::GetEthereumProvider]
        );
    }
}
