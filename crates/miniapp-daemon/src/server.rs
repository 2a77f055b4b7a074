//! HTTP surface of the daemon.

use crate::config::{BackendKind, Config};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use miniapp_core::schema::{Schema, ValidationError};
use miniapp_dispatch::{DispatchError, DispatchQueue, EventDispatcher, WebhookEnvelope};
use miniapp_store::{MemoryBackend, NotificationBackend, NotificationStore, SqliteBackend};
use serde_json::{Value, json};
use std::sync::Arc;

type AppState = Arc<DispatchQueue>;

pub fn router(queue: Arc<DispatchQueue>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .with_state(queue)
}

pub fn open_store(config: &Config) -> anyhow::Result<NotificationStore> {
    let backend: Arc<dyn NotificationBackend> = match config.store.backend {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Sqlite => Arc::new(SqliteBackend::open(&config.store.path)?),
    };
    Ok(NotificationStore::new(backend, config.store.namespace.clone()))
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    tracing::info!(
        "Using {} store, namespace '{}'",
        store.backend_name(),
        config.store.namespace
    );
    let dispatcher = Arc::new(EventDispatcher::new(store));
    let queue = Arc::new(DispatchQueue::spawn(
        dispatcher,
        config.dispatch.shards,
        config.dispatch.capacity,
    ));

    let listener = tokio::net::TcpListener::bind(config.server.bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(queue.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(queue) {
        Ok(queue) => queue.shutdown().await,
        Err(_) => tracing::warn!("Dispatch queue still referenced at shutdown"),
    }
    tracing::info!("Stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn health() -> &'static str {
    "ok"
}

async fn webhook(State(queue): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let decoded = match parse_envelope(&body) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Rejected webhook: {}", e);
            return failure(StatusCode::BAD_REQUEST, e.to_string());
        }
    };
    let fid = decoded.fid();
    match queue.submit(fid, decoded.event).await {
        Ok(_) => (StatusCode::OK, Json(json!({"success": true}))),
        Err(e @ DispatchError::Validation(_)) => failure(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            tracing::error!("Dispatch failed for {}: {}", fid, e);
            failure(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

fn parse_envelope(body: &[u8]) -> Result<miniapp_dispatch::DecodedEnvelope, ValidationError> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationError::format("$", format!("invalid json: {e}")))?;
    WebhookEnvelope::validate(&raw)?.decode()
}

fn failure(status: StatusCode, error: String) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"success": false, "error": error})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use miniapp_core::webhook::{SignerKind, WebhookHeader};
    use miniapp_core::{Fid, NotificationDetails, ServerEvent};
    use miniapp_store::BackendError;
    use tower::ServiceExt;

    fn header(fid: u64) -> WebhookHeader {
        WebhookHeader {
            fid: Fid::new(fid),
            signer: SignerKind::AppKey,
            key: "0xabcdef".into(),
        }
    }

    fn details() -> NotificationDetails {
        NotificationDetails::new("https://api.host.example/v1/notify", "t1")
    }

    fn app_with(store: NotificationStore) -> Router {
        let dispatcher = Arc::new(EventDispatcher::new(store));
        router(Arc::new(DispatchQueue::spawn(dispatcher, 2, 8)))
    }

    async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
        post_raw(app, serde_json::to_vec(&body).unwrap()).await
    }

    async fn post_raw(app: Router, body: Vec<u8>) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn envelope(fid: u64, event: &ServerEvent) -> Value {
        serde_json::to_value(WebhookEnvelope::encode(&header(fid), event, b"sig").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app_with(NotificationStore::in_memory("test"));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn frame_added_is_stored() {
        let store = NotificationStore::in_memory("test");
        let app = app_with(store.clone());
        let event = ServerEvent::FrameAdded {
            notification_details: Some(details()),
        };
        let (status, body) = post_json(app, envelope(42, &event)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
        assert_eq!(store.get(Fid::new(42)).await.unwrap(), Some(details()));
    }

    #[tokio::test]
    async fn invalid_input_is_bad_request() {
        let store = NotificationStore::in_memory("test");
        let app = app_with(store.clone());

        let (status, body) = post_raw(app.clone(), b"not json".to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = post_json(app.clone(), json!({"header": "e30"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Valid envelope, unknown event.
        let mut raw = envelope(7, &ServerEvent::FrameRemoved);
        raw["payload"] = json!("eyJldmVudCI6ImZyYW1lX3VwZGF0ZWQifQ");
        let (status, body) = post_json(app, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("$.event"));
        assert_eq!(store.get(Fid::new(7)).await.unwrap(), None);
    }

    struct Down;

    #[async_trait]
    impl NotificationBackend for Down {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn get(&self, _key: &str) -> Result<Option<NotificationDetails>, BackendError> {
            Err("unavailable".into())
        }

        async fn upsert(&self, _key: &str, _details: &NotificationDetails) -> Result<(), BackendError> {
            Err("unavailable".into())
        }

        async fn delete(&self, _key: &str) -> Result<(), BackendError> {
            Err("unavailable".into())
        }
    }

    #[tokio::test]
    async fn storage_failure_is_unavailable() {
        let app = app_with(NotificationStore::new(Arc::new(Down), "test"));
        let (status, body) = post_json(app, envelope(1, &ServerEvent::NotificationsDisabled)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn sqlite_store_opens_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.store.backend = BackendKind::Sqlite;
        config.store.path = dir.path().join("n.db");
        let store = open_store(&config).unwrap();
        assert_eq!(store.backend_name(), "sqlite");
        assert!(config.store.path.exists());
    }
}
