use miniapp_core::notification::{SendNotificationRequest, SendNotificationResponse};
use miniapp_core::schema::{ROOT, Schema, ValidationError};
use miniapp_core::{Fid, NotificationDetails};
use miniapp_store::{NotificationStore, StorageError};
use serde_json::Value;
use uuid::Uuid;

/// A notification to send.
///
/// `id` is the host's idempotency key. It is generated once at construction,
/// so retrying the same value never notifies twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub target_url: String,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            target_url: target_url.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// The user has not enabled notifications.
    NoDetails,
    /// The host no longer recognises the token.
    InvalidToken,
    RateLimited,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid notification: {0}")]
    InvalidNotification(ValidationError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("host answered {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed reply: {0}")]
    MalformedReply(ValidationError),
}

pub struct NotificationSender {
    store: NotificationStore,
    http: reqwest::Client,
}

impl NotificationSender {
    pub fn new(store: NotificationStore) -> Self {
        Self::with_client(store, reqwest::Client::new())
    }

    pub fn with_client(store: NotificationStore, http: reqwest::Client) -> Self {
        Self { store, http }
    }

    pub async fn send(&self, fid: Fid, notification: &Notification) -> Result<SendOutcome, SendError> {
        let Some(details) = self.store.get(fid).await? else {
            tracing::debug!("No notification details for {}", fid);
            return Ok(SendOutcome::NoDetails);
        };
        let request = SendNotificationRequest::new(
            notification.id.clone(),
            notification.title.clone(),
            notification.body.clone(),
            notification.target_url.clone(),
            vec![details.token.clone()],
        )
        .map_err(SendError::InvalidNotification)?;

        let outcome = self.post(&details, &request).await?;
        tracing::info!("Notification {} to {}: {:?}", notification.id, fid, outcome);
        Ok(outcome)
    }

    async fn post(
        &self,
        details: &NotificationDetails,
        request: &SendNotificationRequest,
    ) -> Result<SendOutcome, SendError> {
        let response = self.http.post(&details.url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status(status));
        }
        let body: Value = response.json().await?;
        let reply = SendNotificationResponse::validate(&body).map_err(SendError::MalformedReply)?;
        classify(&reply, &details.token).map_err(SendError::MalformedReply)
    }
}

fn classify(reply: &SendNotificationResponse, token: &str) -> Result<SendOutcome, ValidationError> {
    let has = |bucket: &[String]| bucket.iter().any(|t| t == token);
    if has(&reply.successful_tokens) {
        Ok(SendOutcome::Sent)
    } else if has(&reply.invalid_tokens) {
        Ok(SendOutcome::InvalidToken)
    } else if has(&reply.rate_limited_tokens) {
        Ok(SendOutcome::RateLimited)
    } else {
        Err(ValidationError::format(
            format!("{ROOT}.result"),
            "token missing from every bucket",
        ))
    }
}
