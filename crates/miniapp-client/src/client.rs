//! Mini-app side client: negotiates capabilities once, then invokes actions
//! in either thrown or wire form.

use crate::bridge::{BridgeError, HostBridge};
use miniapp_core::{
    Action, ActionErrorKind, ActionFailure, ActionResult, CapabilityId, CapabilityRegistry,
    ProtocolVersion, Schema, ValidationError,
};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// The invocation itself failed; no action outcome exists.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// The capability was not negotiated. The host was not contacted.
    #[error("capability {0} is not available")]
    CapabilityUnavailable(CapabilityId),
    /// Params did not pass their own schema. The host was not contacted.
    #[error("invalid params: {0}")]
    InvalidParams(ValidationError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// The host replied with something that is not a valid outcome.
    #[error("malformed reply: {0}")]
    MalformedReply(ValidationError),
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),
}

/// Error of [`MiniAppClient::invoke`]: the action's thrown failure, or an
/// invocation that never produced an outcome.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError<E: fmt::Debug + 'static> {
    #[error(transparent)]
    Action(ActionFailure<E>),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

impl<E: fmt::Debug + 'static> InvokeError<E> {
    /// The action failure, if the host produced an outcome at all.
    pub fn action(&self) -> Option<&ActionFailure<E>> {
        match self {
            Self::Action(failure) => Some(failure),
            Self::Invocation(_) => None,
        }
    }
}

/// Mini-app side of a host session.
pub struct MiniAppClient<B> {
    bridge: B,
    host: CapabilityRegistry,
    negotiated: BTreeSet<CapabilityId>,
}

impl<B: HostBridge> MiniAppClient<B> {
    /// Ask the host what it supports and keep the part of `requested` it
    /// covers.
    pub async fn connect(
        bridge: B,
        requested: impl IntoIterator<Item = CapabilityId>,
    ) -> Result<Self, BridgeError> {
        let advertised = bridge.capabilities().await?;
        let host = CapabilityRegistry::from_advertised(ProtocolVersion::LATEST, &advertised);
        let negotiated = host.negotiate(requested);
        tracing::info!(
            "Negotiated {} of {} host capabilities",
            negotiated.len(),
            host.list_capabilities().len()
        );
        Ok(Self {
            bridge,
            host,
            negotiated,
        })
    }

    /// What the host advertised, after dropping unknown ids.
    pub fn host_capabilities(&self) -> &CapabilityRegistry {
        &self.host
    }

    /// Requested capabilities the host also supports.
    pub fn negotiated(&self) -> &BTreeSet<CapabilityId> {
        &self.negotiated
    }

    pub fn has(&self, id: CapabilityId) -> bool {
        self.negotiated.contains(&id)
    }

    /// Invoke `A`, with action failures in thrown form.
    pub async fn invoke<A: Action>(
        &self,
        params: &A::Params,
    ) -> Result<A::Output, InvokeError<A::Error>> {
        let outcome = self.call::<A>(params).await?;
        outcome.into_thrown().map_err(InvokeError::Action)
    }

    /// Invoke `A` and return the outcome in wire form, `{"result": ...}` or
    /// `{"error": {"type": ...}}`.
    pub async fn invoke_wire<A: Action>(&self, params: &A::Params) -> Result<Value, InvocationError> {
        self.call::<A>(params)
            .await?
            .to_wire()
            .map_err(InvocationError::Encode)
    }

    async fn call<A: Action>(
        &self,
        params: &A::Params,
    ) -> Result<ActionResult<A::Output, A::Error>, InvocationError> {
        if !self.has(A::CAPABILITY) {
            return Err(InvocationError::CapabilityUnavailable(A::CAPABILITY));
        }
        let raw = serde_json::to_value(params).map_err(InvocationError::Encode)?;
        <A::Params as Schema>::validate(&raw).map_err(InvocationError::InvalidParams)?;

        let reply = self.bridge.request(A::CAPABILITY.as_str(), raw).await?;
        let outcome = ActionResult::<A::Output, A::Error>::from_wire(&reply)
            .map_err(InvocationError::MalformedReply)?;
        if let ActionResult::Err(kind) = &outcome {
            tracing::debug!("{} returned {}", A::CAPABILITY, kind.type_tag());
        }
        Ok(outcome)
    }
}
