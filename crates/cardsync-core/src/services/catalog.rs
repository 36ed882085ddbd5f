//! Card catalog facade used by presentation code.
//!
//! Every mutation is recorded as an intent before it touches the local store,
//! so a crash in between leaves a retryable intent rather than a local write
//! the remote store will never hear about.

use chrono::Utc;
use tokio::sync::watch;

use crate::db::{CardStore, KeyValueStore};
use crate::error::{Error, Result};
use crate::gate::NetworkStatus;
use crate::models::{Card, CardFields, CardId, IntentAction, LocalCard, MutationIntent};
use crate::queue::MutationQueue;
use crate::remote::RemoteCardStore;
use crate::state::SyncPhase;
use crate::sync::{SyncOrchestrator, SyncOutcome};

/// Snapshot for status displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatus {
    pub phase: SyncPhase,
    pub connected: bool,
    pub signed_in_as: Option<String>,
    pub pending_cards: usize,
    pub queued_intents: usize,
    pub queue_resets: u64,
}

/// Local-first card catalog with background-free, trigger-driven sync.
#[derive(Clone)]
pub struct Catalog<S, K, R> {
    store: S,
    queue: MutationQueue<K>,
    sync: SyncOrchestrator<S, K, R>,
    auto_sync: bool,
}

impl<S, K, R> Catalog<S, K, R>
where
    S: CardStore + Clone,
    K: KeyValueStore + Clone,
    R: RemoteCardStore,
{
    pub fn new(store: S, queue: MutationQueue<K>, sync: SyncOrchestrator<S, K, R>) -> Self {
        Self {
            store,
            queue,
            sync,
            auto_sync: true,
        }
    }

    /// Whether each mutation is followed by a sync attempt (default on).
    #[must_use]
    pub const fn with_auto_sync(mut self, auto_sync: bool) -> Self {
        self.auto_sync = auto_sync;
        self
    }

    #[must_use]
    pub const fn orchestrator(&self) -> &SyncOrchestrator<S, K, R> {
        &self.sync
    }

    pub async fn create_card(&self, fields: CardFields) -> Result<LocalCard> {
        let card = LocalCard::new(fields.normalized()?);
        self.apply(MutationIntent::create(card.clone())).await?;
        tracing::info!("Created card {} ({})", card.id(), card.fields().name);
        Ok(card)
    }

    /// Replace the business fields of an existing card.
    pub async fn update_card(&self, id: &CardId, fields: CardFields) -> Result<LocalCard> {
        let existing = self.require(id).await?;
        let card = LocalCard {
            card: Card {
                id: *id,
                fields: fields.normalized()?,
                created_at: existing.card.created_at,
                updated_at: Utc::now(),
            },
            pending: true,
        };

        self.apply(MutationIntent::update(card.clone())).await?;
        tracing::info!("Updated card {}", id);
        Ok(card)
    }

    pub async fn toggle_favorite(&self, id: &CardId) -> Result<LocalCard> {
        let existing = self.require(id).await?;
        let mut fields = existing.card.fields;
        fields.is_favorite = !fields.is_favorite;
        self.update_card(id, fields).await
    }

    pub async fn delete_card(&self, id: &CardId) -> Result<()> {
        self.require(id).await?;
        self.apply(MutationIntent::delete(*id)).await?;
        tracing::info!("Deleted card {}", id);
        Ok(())
    }

    /// All local cards, most recently modified first.
    pub async fn current_cards(&self) -> Result<Vec<LocalCard>> {
        self.store.get_all().await
    }

    pub async fn find_card(&self, id: &CardId) -> Result<Option<LocalCard>> {
        self.store.get(id).await
    }

    pub async fn pending_count(&self) -> Result<usize> {
        self.store.pending_count().await
    }

    pub async fn queued_intents(&self) -> Result<Vec<MutationIntent>> {
        self.queue.peek_all().await
    }

    /// Discard every queued intent. Affected cards stay pending until the
    /// next successful reconcile.
    pub async fn clear_queue(&self) -> Result<()> {
        self.queue.clear().await
    }

    pub async fn trigger_sync(&self) -> Result<SyncOutcome> {
        self.sync.trigger_sync().await
    }

    pub async fn status(&self) -> Result<CatalogStatus> {
        let gate = self.sync.gate();
        Ok(CatalogStatus {
            phase: self.sync.phase(),
            connected: gate.is_connected(),
            signed_in_as: gate.identity().map(|identity| identity.user_id),
            pending_cards: self.store.pending_count().await?,
            queued_intents: self.queue.len().await?,
            queue_resets: self.queue.reset_count().await?,
        })
    }

    /// Trigger a sync on every offline to online transition until the
    /// sender side of `status` goes away.
    pub async fn watch_connectivity(&self, mut status: watch::Receiver<NetworkStatus>) {
        let mut was_connected = status.borrow_and_update().connected;

        while status.changed().await.is_ok() {
            let connected = status.borrow_and_update().connected;
            if connected && !was_connected {
                tracing::info!("Connectivity regained; syncing");
                self.sync_and_log().await;
            }
            was_connected = connected;
        }
    }

    async fn require(&self, id: &CardId) -> Result<LocalCard> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Queue the intent, then write the local store.
    async fn apply(&self, intent: MutationIntent) -> Result<()> {
        self.queue.append(&intent).await?;

        match &intent.action {
            IntentAction::Create(card) => self.store.insert(&card.card).await?,
            IntentAction::Update(card) => self.store.update(&card.card).await?,
            IntentAction::Delete { id } => self.store.delete(id).await?,
        }

        if self.auto_sync {
            self.sync_and_log().await;
        }
        Ok(())
    }

    async fn sync_and_log(&self) {
        match self.sync.trigger_sync().await {
            Ok(SyncOutcome::Skipped(reason)) => {
                tracing::debug!("Automatic sync skipped: {:?}", reason);
            }
            Ok(outcome) if outcome.is_complete() => {
                tracing::debug!("Automatic sync replayed {} intents", outcome.replayed());
            }
            Ok(outcome) => {
                tracing::warn!("Automatic sync did not finish: {:?}", outcome);
            }
            Err(error) => {
                tracing::warn!("Automatic sync failed on local storage: {}", error);
            }
        }
    }
}
