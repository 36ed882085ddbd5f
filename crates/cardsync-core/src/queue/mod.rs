//! Durable FIFO queue of mutation intents.
//!
//! The whole queue lives under a single preferences key, encoded as one JSON
//! array. Reads and read-modify-write cycles are serialized behind an async
//! lock so an append racing a removal can never drop an intent.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::KeyValueStore;
use crate::error::Result;
use crate::models::{IntentId, MutationIntent};

/// Preferences key holding the encoded queue
pub const QUEUE_KEY: &str = "offline_queue_cards";

/// Prefix of the keys an unreadable queue is moved to
const QUARANTINE_PREFIX: &str = "offline_queue_cards.corrupt-";

/// Ordered, append-only list of intents awaiting remote replay
#[derive(Clone)]
pub struct MutationQueue<K> {
    storage: K,
    lock: Arc<Mutex<()>>,
}

impl<K: KeyValueStore> MutationQueue<K> {
    pub fn new(storage: K) -> Self {
        Self {
            storage,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Add an intent at the tail. Durable once this returns.
    pub async fn append(&self, intent: &MutationIntent) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut queue = self.load().await?;
        queue.push(intent.clone());
        self.save(&queue).await?;

        tracing::debug!(
            "Queued {} intent {} for card {} ({} pending)",
            intent.kind(),
            intent.id,
            intent.card_id(),
            queue.len()
        );
        Ok(())
    }

    /// The full queue in insertion order, without removing anything.
    pub async fn peek_all(&self) -> Result<Vec<MutationIntent>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Remove one intent by id. Unknown ids are a no-op.
    pub async fn remove(&self, intent_id: &IntentId) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut queue = self.load().await?;
        let before = queue.len();
        queue.retain(|intent| intent.id != *intent_id);

        if queue.len() == before {
            return Ok(());
        }
        self.save(&queue).await
    }

    /// Drop every queued intent.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.storage.remove(QUEUE_KEY).await?;
        tracing::warn!("Mutation queue cleared");
        Ok(())
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.peek_all().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Run `apply` on the current queue with appends held off until it
    /// returns.
    pub async fn with_snapshot<T, F, Fut>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(Vec<MutationIntent>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _guard = self.lock.lock().await;
        let queue = self.load().await?;
        apply(queue).await
    }

    /// How many times an unreadable queue was reset to empty, counted from
    /// the quarantined copies kept in storage.
    pub async fn reset_count(&self) -> Result<u64> {
        let kept = self.storage.keys_with_prefix(QUARANTINE_PREFIX).await?;
        Ok(kept.len() as u64)
    }

    async fn load(&self) -> Result<Vec<MutationIntent>> {
        let Some(raw) = self.storage.get(QUEUE_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<MutationIntent>>(&raw) {
            Ok(queue) => Ok(queue),
            Err(error) => {
                self.quarantine_corrupted(&raw, &error).await?;
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, queue: &[MutationIntent]) -> Result<()> {
        let raw = serde_json::to_string(queue)?;
        self.storage.set(QUEUE_KEY, &raw).await
    }

    /// Move an undecodable queue aside and start over from an empty queue.
    async fn quarantine_corrupted(&self, raw: &str, error: &serde_json::Error) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let backup_key = format!("{QUARANTINE_PREFIX}{timestamp}");

        self.storage.set(&backup_key, raw).await?;
        self.storage.remove(QUEUE_KEY).await?;

        tracing::warn!(
            "Mutation queue was unreadable ({}); reset to empty, previous value kept under {}",
            error,
            backup_key
        );
        Ok(())
    }
}
