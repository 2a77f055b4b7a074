//! In-process backend for tests and single-node development.

use crate::store::{BackendError, NotificationBackend};
use async_trait::async_trait;
use miniapp_core::NotificationDetails;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<String, NotificationDetails>>,
    mutations: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of upsert/delete calls served so far.
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl NotificationBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<NotificationDetails>, BackendError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn upsert(&self, key: &str, details: &NotificationDetails) -> Result<(), BackendError> {
        self.mutations.fetch_add(1, Ordering::Relaxed);
        self.records
            .write()
            .await
            .insert(key.to_string(), details.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.mutations.fetch_add(1, Ordering::Relaxed);
        self.records.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_mutations_not_reads() {
        let backend = MemoryBackend::new();
        let details = NotificationDetails::new("https://h.example/notify", "t");
        backend.get("k").await.unwrap();
        backend.upsert("k", &details).await.unwrap();
        backend.delete("k").await.unwrap();
        backend.delete("k").await.unwrap();
        assert_eq!(backend.mutation_count(), 3);
        assert!(backend.is_empty().await);
    }
}
