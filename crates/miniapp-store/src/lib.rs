//! Notification lifecycle store.
//!
//! [`NotificationStore`] maps a user identity to at most one
//! [`NotificationDetails`](miniapp_core::NotificationDetails) value. It
//! defines the policy (idempotent set/clear, last write wins) on top of an
//! injected [`NotificationBackend`], which owns persistence and per-row
//! atomicity.

mod memory;
mod sqlite;
mod store;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use store::{BackendError, NotificationBackend, NotificationStore, StorageError, StorageOp};
