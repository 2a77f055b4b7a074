//! Notification details keyed by identity.
//!
//! [`NotificationStore`] maps each fid to a namespaced string key and
//! delegates to a pluggable [`NotificationBackend`].

use async_trait::async_trait;
use miniapp_core::{Fid, NotificationDetails};
use std::fmt;
use std::sync::Arc;

pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Key-value storage the store is built on.
///
/// Each call must be atomic for its single key: a concurrent reader sees
/// either the old value or the new one, never a mix.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<NotificationDetails>, BackendError>;

    async fn upsert(&self, key: &str, details: &NotificationDetails) -> Result<(), BackendError>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), BackendError>;
}

/// Store operation named in a [`StorageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Get,
    Set,
    Clear,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Clear => "clear",
        })
    }
}

/// The backend was unreachable or rejected an operation.
#[derive(Debug, thiserror::Error)]
#[error("{backend} {op} failed for {fid}: {source}")]
pub struct StorageError {
    pub backend: &'static str,
    pub op: StorageOp,
    pub fid: Fid,
    #[source]
    pub source: BackendError,
}

/// Per-user notification details.
///
/// Sole writer of notification state. Cloning shares the same backend.
#[derive(Clone)]
pub struct NotificationStore {
    backend: Arc<dyn NotificationBackend>,
    namespace: String,
}

impl NotificationStore {
    pub fn new(backend: Arc<dyn NotificationBackend>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    /// Store over a fresh [`MemoryBackend`](crate::MemoryBackend).
    pub fn in_memory(namespace: impl Into<String>) -> Self {
        Self::new(Arc::new(crate::MemoryBackend::new()), namespace)
    }

    /// Name of the backend, for logs.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Storage key of `fid`'s record, `<namespace>:user:<n>`.
    pub fn key(&self, fid: Fid) -> String {
        format!("{}:user:{}", self.namespace, fid.get())
    }

    /// The most recently set details for `fid`, or `None` if cleared or
    /// never set.
    pub async fn get(&self, fid: Fid) -> Result<Option<NotificationDetails>, StorageError> {
        self.backend
            .get(&self.key(fid))
            .await
            .map_err(|source| self.error(StorageOp::Get, fid, source))
    }

    /// Replace any details for `fid`.
    pub async fn set(&self, fid: Fid, details: &NotificationDetails) -> Result<(), StorageError> {
        self.backend
            .upsert(&self.key(fid), details)
            .await
            .map_err(|source| self.error(StorageOp::Set, fid, source))?;
        tracing::debug!("Stored notification details for {}", fid);
        Ok(())
    }

    /// Remove details for `fid`. No-op if there are none.
    pub async fn clear(&self, fid: Fid) -> Result<(), StorageError> {
        self.backend
            .delete(&self.key(fid))
            .await
            .map_err(|source| self.error(StorageOp::Clear, fid, source))?;
        tracing::debug!("Cleared notification details for {}", fid);
        Ok(())
    }

    fn error(&self, op: StorageOp, fid: Fid, source: BackendError) -> StorageError {
        StorageError {
            backend: self.backend.name(),
            op,
            fid,
            source,
        }
    }
}

impl fmt::Debug for NotificationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationStore")
            .field("backend", &self.backend.name())
            .field("namespace", &self.namespace)
            .finish()
    }
}
