//! Sharded worker pool in front of an [`EventDispatcher`].

use crate::dispatcher::{DispatchError, DispatchOutcome, EventDispatcher};
use miniapp_core::Fid;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type Reply = oneshot::Sender<Result<DispatchOutcome, DispatchError>>;

struct Job {
    fid: Fid,
    raw: Value,
    reply: Reply,
}

/// Runs an [`EventDispatcher`] on a fixed set of worker tasks.
///
/// Events are sharded by identity, so events for one fid are applied in the
/// order they were enqueued while distinct identities proceed in parallel.
pub struct DispatchQueue {
    shards: Vec<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl DispatchQueue {
    /// Spawn `shards` workers, each with a bounded inbox of `capacity` jobs.
    ///
    /// Must be called inside a tokio runtime. Zero values are raised to one.
    pub fn spawn(dispatcher: Arc<EventDispatcher>, shards: usize, capacity: usize) -> Self {
        let shards = shards.max(1);
        let capacity = capacity.max(1);
        let mut senders = Vec::with_capacity(shards);
        let mut workers = Vec::with_capacity(shards);
        for shard in 0..shards {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            workers.push(tokio::spawn(run_worker(shard, dispatcher.clone(), rx)));
        }
        tracing::debug!("Dispatch queue started with {} shards", shards);
        Self {
            shards: senders,
            workers,
        }
    }

    /// Number of worker tasks.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_of(&self, fid: Fid) -> usize {
        (fid.get() % self.shards.len() as u64) as usize
    }

    /// Enqueue an event and return a handle to its outcome.
    ///
    /// Ordering is fixed once this returns, so callers may enqueue several
    /// events for one identity before awaiting any of them.
    pub async fn enqueue(
        &self,
        fid: Fid,
        raw: Value,
    ) -> Result<oneshot::Receiver<Result<DispatchOutcome, DispatchError>>, DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.shards[self.shard_of(fid)]
            .send(Job { fid, raw, reply })
            .await
            .map_err(|_| DispatchError::QueueClosed)?;
        Ok(rx)
    }

    /// Enqueue an event and wait for it to be applied.
    pub async fn submit(&self, fid: Fid, raw: Value) -> Result<DispatchOutcome, DispatchError> {
        let rx = self.enqueue(fid, raw).await?;
        rx.await.map_err(|_| DispatchError::QueueClosed)?
    }

    /// Stop accepting events and wait for queued ones to finish.
    pub async fn shutdown(self) {
        drop(self.shards);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::warn!("Dispatch worker ended abnormally: {}", e);
            }
        }
    }
}

async fn run_worker(shard: usize, dispatcher: Arc<EventDispatcher>, mut rx: mpsc::Receiver<Job>) {
    while let Some(job) = rx.recv().await {
        let result = dispatcher.dispatch(job.fid, &job.raw).await;
        // Submitter may have gone away; the event is applied regardless.
        let _ = job.reply.send(result);
    }
    tracing::debug!("Dispatch shard {} stopped", shard);
}
