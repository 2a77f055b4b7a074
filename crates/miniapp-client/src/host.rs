//! Host side of the bridge: runs actions on behalf of a mini-app.

use crate::bridge::{HostConnection, LIST_CAPABILITIES, RequestFrame, ResponseFrame};
use async_trait::async_trait;
use miniapp_core::actions::{
    AddMiniAppError, AddMiniAppResult, SignInError, SignInParams, SignInResult,
};
use miniapp_core::{
    ActionErrorKind, ActionResult, CapabilityId, CapabilityRegistry, ProtocolVersion, Schema,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Host-side implementations of the actions a mini-app can invoke.
///
/// Outcomes are returned as [`ActionResult`] so business failures reach the
/// mini-app as data.
#[async_trait]
pub trait HostActions: Send + Sync + 'static {
    /// Capabilities this host advertises.
    fn capabilities(&self) -> Vec<CapabilityId> {
        vec![CapabilityId::AddMiniApp, CapabilityId::SignIn]
    }

    async fn add_mini_app(&self) -> ActionResult<AddMiniAppResult, AddMiniAppError>;

    async fn sign_in(&self, params: SignInParams) -> ActionResult<SignInResult, SignInError>;
}

/// Serves bridge requests against a [`HostActions`] implementation.
pub struct HostEndpoint<H> {
    actions: H,
    registry: CapabilityRegistry,
}

impl<H: HostActions> HostEndpoint<H> {
    pub fn new(actions: H) -> Self {
        let registry = CapabilityRegistry::with_supported(ProtocolVersion::LATEST, actions.capabilities());
        Self { actions, registry }
    }

    /// What this host advertises in answer to `getCapabilities`.
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Answer one request. `Err` is a fault: the request could not be served
    /// and no action ran.
    pub async fn handle(&self, capability: &str, params: &Value) -> Result<Value, String> {
        if capability == LIST_CAPABILITIES {
            return serde_json::to_value(self.registry.list_capabilities()).map_err(|e| e.to_string());
        }
        let id = capability.parse::<CapabilityId>().map_err(|e| e.to_string())?;
        if !self.registry.supports(id) {
            return Err(format!("{id} is not supported by this host"));
        }
        match id {
            CapabilityId::AddMiniApp => {
                <()>::validate(params).map_err(|e| e.to_string())?;
                to_wire(self.actions.add_mini_app().await)
            }
            CapabilityId::SignIn => {
                let params = SignInParams::validate(params).map_err(|e| e.to_string())?;
                to_wire(self.actions.sign_in(params).await)
            }
            other => Err(format!("{other} has no handler")),
        }
    }

    /// Serve requests until the mini-app side closes.
    ///
    /// Each request runs on its own task, so a pending prompt does not hold
    /// up later requests. Replies may leave out of order; the bridge matches
    /// them by id.
    pub async fn serve(self, mut conn: HostConnection) {
        let endpoint = Arc::new(self);
        while let Some(text) = conn.requests.recv().await {
            let frame: RequestFrame = match serde_json::from_str(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("Dropping unparseable request frame: {}", e);
                    continue;
                }
            };
            let endpoint = endpoint.clone();
            let responses = conn.responses.clone();
            tokio::spawn(async move {
                let id = frame.id;
                let reply = endpoint.reply(frame).await;
                let text = match serde_json::to_string(&reply) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to encode response {}: {}", id, e);
                        return;
                    }
                };
                if responses.send(text).await.is_err() {
                    tracing::debug!("Mini-app side closed before response {}", id);
                }
            });
        }
        tracing::debug!("Host endpoint stopped");
    }

    async fn reply(&self, frame: RequestFrame) -> ResponseFrame {
        match self.handle(&frame.capability, &frame.params).await {
            Ok(response) => ResponseFrame::response(frame.id, response),
            Err(reason) => {
                tracing::warn!("Request {} for {} faulted: {}", frame.id, frame.capability, reason);
                ResponseFrame::fault(frame.id, reason)
            }
        }
    }
}

fn to_wire<T: Serialize, E: ActionErrorKind>(outcome: ActionResult<T, E>) -> Result<Value, String> {
    match &outcome {
        ActionResult::Ok(_) => tracing::info!("{} succeeded", E::ACTION),
        ActionResult::Err(kind) => tracing::info!("{} failed: {}", E::ACTION, kind.variant_name()),
    }
    outcome.to_wire().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ChannelBridge, HostBridge};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    struct Rejecting;

    #[async_trait]
    impl HostActions for Rejecting {
        async fn add_mini_app(&self) -> ActionResult<AddMiniAppResult, AddMiniAppError> {
            ActionResult::Err(AddMiniAppError::RejectedByUser)
        }

        async fn sign_in(&self, _params: SignInParams) -> ActionResult<SignInResult, SignInError> {
            ActionResult::Err(SignInError::RejectedByUser)
        }
    }

    #[tokio::test]
    async fn lists_capabilities_in_declaration_order() {
        let endpoint = HostEndpoint::new(Rejecting);
        let listed = endpoint.handle(LIST_CAPABILITIES, &Value::Null).await.unwrap();
        assert_eq!(listed, json!(["actions.addMiniApp", "actions.signIn"]));
    }

    #[tokio::test]
    async fn failure_is_replied_as_data() {
        let endpoint = HostEndpoint::new(Rejecting);
        let reply = endpoint.handle("actions.addMiniApp", &Value::Null).await.unwrap();
        assert_eq!(reply, json!({"error": {"type": "rejected_by_user"}}));
    }

    #[tokio::test]
    async fn unknown_or_unadvertised_capability_faults() {
        let endpoint = HostEndpoint::new(Rejecting);
        assert!(endpoint.handle("actions.teleport", &Value::Null).await.is_err());
        assert!(endpoint.handle("actions.openUrl", &Value::Null).await.is_err());
    }

    #[tokio::test]
    async fn invalid_params_fault_without_running_action() {
        let endpoint = HostEndpoint::new(Rejecting);
        let reason = endpoint
            .handle("actions.signIn", &json!({"nonce": "x"}))
            .await
            .unwrap_err();
        assert!(reason.starts_with("$.nonce"), "{reason}");
    }

    /// Holds `addMiniApp` open until a `signIn` arrives.
    #[derive(Default)]
    struct Prompting {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl HostActions for Arc<Prompting> {
        async fn add_mini_app(&self) -> ActionResult<AddMiniAppResult, AddMiniAppError> {
            self.started.notify_one();
            self.release.notified().await;
            ActionResult::Ok(AddMiniAppResult::default())
        }

        async fn sign_in(&self, _params: SignInParams) -> ActionResult<SignInResult, SignInError> {
            self.release.notify_one();
            ActionResult::Err(SignInError::RejectedByUser)
        }
    }

    #[tokio::test]
    async fn pending_action_does_not_block_later_requests() {
        let host = Arc::new(Prompting::default());
        let (bridge, conn) = ChannelBridge::pair(8);
        tokio::spawn(HostEndpoint::new(host.clone()).serve(conn));
        let bridge = Arc::new(bridge);

        let add = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.request("actions.addMiniApp", Value::Null).await }
        });
        timeout(Duration::from_secs(5), host.started.notified())
            .await
            .unwrap();

        let signed = timeout(
            Duration::from_secs(5),
            bridge.request("actions.signIn", json!({"nonce": "abcd1234"})),
        )
        .await
        .expect("sign-in waited behind the pending add")
        .unwrap();
        assert_eq!(signed, json!({"error": {"type": "rejected_by_user"}}));

        let added = timeout(Duration::from_secs(5), add).await.unwrap().unwrap().unwrap();
        assert_eq!(added, json!({"result": {}}));
    }
}
