//! Server event dispatch: validate, then apply to the notification store.

use miniapp_core::{EventKind, Fid, ServerEvent, ValidationError, validate};
use miniapp_store::{NotificationStore, StorageError};
use serde_json::Value;

/// What a dispatched event did to the identity's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Details were stored; notifications are enabled.
    Enabled,
    /// Details were cleared; notifications are disabled.
    Disabled,
    /// No store mutation (`frame_added` without details).
    Unchanged,
}

/// Result of one successfully dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub fid: Fid,
    pub event: EventKind,
    pub transition: Transition,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The payload was not a valid event. Nothing was written.
    #[error("invalid event: {0}")]
    Validation(#[from] ValidationError),
    /// The store failed; the caller should redeliver the whole event.
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("dispatch queue is closed")]
    QueueClosed,
}

/// Applies validated server events to a [`NotificationStore`].
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    store: NotificationStore,
}

impl EventDispatcher {
    pub fn new(store: NotificationStore) -> Self {
        Self { store }
    }

    /// The store this dispatcher writes to.
    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    /// Validate `raw` as a [`ServerEvent`] and apply it for `fid`.
    ///
    /// Validation failures never touch the store.
    pub async fn dispatch(&self, fid: Fid, raw: &Value) -> Result<DispatchOutcome, DispatchError> {
        let event: ServerEvent = validate(raw).inspect_err(|e| {
            tracing::warn!("Rejected event for {}: {}", fid, e);
        })?;
        let transition = self.apply(fid, &event).await?;
        Ok(DispatchOutcome {
            fid,
            event: event.kind(),
            transition,
        })
    }

    /// Apply an already validated event.
    ///
    /// Every transition is total and idempotent: replaying an event leaves
    /// the same state as applying it once.
    pub async fn apply(&self, fid: Fid, event: &ServerEvent) -> Result<Transition, StorageError> {
        let transition = match event {
            ServerEvent::FrameAdded {
                notification_details: Some(details),
            }
            | ServerEvent::NotificationsEnabled {
                notification_details: details,
            } => {
                self.store.set(fid, details).await?;
                Transition::Enabled
            }
            ServerEvent::FrameAdded {
                notification_details: None,
            } => Transition::Unchanged,
            ServerEvent::FrameRemoved | ServerEvent::NotificationsDisabled => {
                self.store.clear(fid).await?;
                Transition::Disabled
            }
        };
        tracing::info!("{} for {}: {:?}", event.kind(), fid, transition);
        Ok(transition)
    }
}
