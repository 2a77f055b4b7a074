//! Request/response bridge between a mini-app and its host.
//!
//! Frames are JSON text. Every request carries an id and the host echoes it,
//! so several requests can be in flight on one bridge.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Reserved request name for the host's advertised capability list.
pub const LIST_CAPABILITIES: &str = "getCapabilities";

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("bridge closed")]
    Closed,
    /// The host could not serve the request at all.
    #[error("host fault: {0}")]
    Fault(String),
    #[error("malformed frame: {0}")]
    Frame(#[from] serde_json::Error),
}

/// Transport between a mini-app and its host.
///
/// No timeout is applied; a request waits until the host answers or the
/// bridge closes.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Send one request and wait for its response payload.
    async fn request(&self, capability: &str, params: Value) -> Result<Value, BridgeError>;

    /// Capability ids the host advertises, unparsed.
    async fn capabilities(&self) -> Result<Vec<String>, BridgeError> {
        let listed = self.request(LIST_CAPABILITIES, Value::Null).await?;
        Ok(serde_json::from_value(listed)?)
    }
}

/// One request; `params` defaults to `null` when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: u64,
    pub capability: String,
    #[serde(default)]
    pub params: Value,
}

/// Carries either a `response` (an action outcome in wire form, or the
/// capability list) or a `fault` when the host could not serve the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl ResponseFrame {
    pub fn response(id: u64, response: Value) -> Self {
        Self {
            id,
            response: Some(response),
            fault: None,
        }
    }

    pub fn fault(id: u64, reason: impl Into<String>) -> Self {
        Self {
            id,
            response: None,
            fault: Some(reason.into()),
        }
    }

    /// A fault wins over a response when a frame carries both.
    pub fn into_result(self) -> Result<Value, BridgeError> {
        match (self.response, self.fault) {
            (Some(response), None) => Ok(response),
            (_, Some(reason)) => Err(BridgeError::Fault(reason)),
            (None, None) => Err(BridgeError::Fault("empty response frame".into())),
        }
    }
}

/// Host half of a [`ChannelBridge`]: request frames in, response frames out.
pub struct HostConnection {
    pub requests: mpsc::Receiver<String>,
    pub responses: mpsc::Sender<String>,
}

type Pending = Arc<Mutex<Option<HashMap<u64, oneshot::Sender<ResponseFrame>>>>>;

/// Bridge over in-process channels carrying JSON text frames.
///
/// Responses are matched to requests by `id`, so several requests may be in
/// flight at once.
pub struct ChannelBridge {
    outgoing: mpsc::Sender<String>,
    pending: Pending,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl ChannelBridge {
    /// Create a connected bridge and host connection. Must be called inside
    /// a tokio runtime.
    pub fn pair(buffer: usize) -> (Self, HostConnection) {
        let buffer = buffer.max(1);
        let (request_tx, request_rx) = mpsc::channel(buffer);
        let (response_tx, response_rx) = mpsc::channel(buffer);
        let pending: Pending = Arc::new(Mutex::new(Some(HashMap::new())));
        let reader = tokio::spawn(read_responses(response_rx, pending.clone()));
        let bridge = Self {
            outgoing: request_tx,
            pending,
            next_id: AtomicU64::new(1),
            reader,
        };
        let host = HostConnection {
            requests: request_rx,
            responses: response_tx,
        };
        (bridge, host)
    }

    async fn forget(&self, id: u64) {
        if let Some(pending) = self.pending.lock().await.as_mut() {
            pending.remove(&id);
        }
    }
}

#[async_trait]
impl HostBridge for ChannelBridge {
    async fn request(&self, capability: &str, params: Value) -> Result<Value, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        match self.pending.lock().await.as_mut() {
            Some(pending) => {
                pending.insert(id, tx);
            }
            None => return Err(BridgeError::Closed),
        }

        let frame = RequestFrame {
            id,
            capability: capability.to_string(),
            params,
        };
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                self.forget(id).await;
                return Err(e.into());
            }
        };
        tracing::trace!("-> {}", text);
        if self.outgoing.send(text).await.is_err() {
            self.forget(id).await;
            return Err(BridgeError::Closed);
        }

        rx.await.map_err(|_| BridgeError::Closed)?.into_result()
    }
}

impl Drop for ChannelBridge {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_responses(mut incoming: mpsc::Receiver<String>, pending: Pending) {
    while let Some(text) = incoming.recv().await {
        tracing::trace!("<- {}", text);
        let frame: ResponseFrame = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping unparseable response frame: {}", e);
                continue;
            }
        };
        let waiter = pending
            .lock()
            .await
            .as_mut()
            .and_then(|p| p.remove(&frame.id));
        match waiter {
            Some(tx) => {
                let _ = tx.send(frame);
            }
            None => tracing::warn!("Response for unknown request {}", frame.id),
        }
    }
    // Dropping the senders wakes every waiter with `Closed`.
    pending.lock().await.take();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frame_shapes() {
        let request = RequestFrame {
            id: 1,
            capability: "actions.addMiniApp".into(),
            params: Value::Null,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"id": 1, "capability": "actions.addMiniApp", "params": null})
        );
        let response = ResponseFrame::response(1, json!({"result": {}}));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"id": 1, "response": {"result": {}}})
        );
    }

    #[test]
    fn fault_frame_is_an_error() {
        let err = ResponseFrame::fault(3, "no handler").into_result().unwrap_err();
        assert!(matches!(err, BridgeError::Fault(reason) if reason == "no handler"));
    }

    #[tokio::test]
    async fn responses_are_matched_by_id() {
        let (bridge, mut host) = ChannelBridge::pair(4);
        let bridge = Arc::new(bridge);

        let first = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.request("a", json!(1)).await }
        });
        let second = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.request("b", json!(2)).await }
        });

        let mut frames = Vec::new();
        for _ in 0..2 {
            let text = host.requests.recv().await.unwrap();
            frames.push(serde_json::from_str::<RequestFrame>(&text).unwrap());
        }
        // Answer in reverse order of arrival.
        for frame in frames.into_iter().rev() {
            let reply = ResponseFrame::response(frame.id, json!(frame.capability));
            host.responses
                .send(serde_json::to_string(&reply).unwrap())
                .await
                .unwrap();
        }

        assert_eq!(first.await.unwrap().unwrap(), json!("a"));
        assert_eq!(second.await.unwrap().unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn closed_host_fails_requests() {
        let (bridge, host) = ChannelBridge::pair(1);
        drop(host);
        let err = bridge.request("a", Value::Null).await.unwrap_err();
        assert!(matches!(err, BridgeError::Closed));
    }
}
