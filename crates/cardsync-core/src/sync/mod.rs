//! Single-flight sync: drain the mutation queue, then reconcile from the
//! remote listing.
//!
//! A run replays queued intents strictly in insertion order and removes each
//! one only after the remote store accepted it. The first rejection stops the
//! run and leaves that intent and everything after it queued for the next
//! trigger. Only a complete drain is followed by a reconcile, which makes the
//! remote listing the new confirmed local state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::db::{CardStore, KeyValueStore};
use crate::error::Result;
use crate::gate::Gate;
use crate::models::{Card, CardId, IntentId, MutationIntent};
use crate::queue::MutationQueue;
use crate::remote::{RemoteCall, RemoteCardStore, RemoteError};
use crate::state::SyncPhase;

/// Why a trigger did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Offline,
    Unauthenticated,
    AlreadyRunning,
}

/// Result of one sync trigger.
///
/// Remote failures are reported here rather than returned as errors; only
/// local storage faults make [`SyncOrchestrator::trigger_sync`] fail.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Preconditions unmet or another sync in flight; nothing was touched
    Skipped(SkipReason),
    /// Queue fully drained and local state reconciled
    Completed { replayed: usize, reconciled: usize },
    /// The remote store rejected an intent; it and later intents stay queued
    Stopped {
        replayed: usize,
        remaining: usize,
        failed_intent: IntentId,
        error: RemoteError,
    },
    /// Queue fully drained but the listing failed; local state untouched
    ReconcileFailed { replayed: usize, error: RemoteError },
}

impl SyncOutcome {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Number of intents acknowledged by the remote store during this run.
    #[must_use]
    pub const fn replayed(&self) -> usize {
        match self {
            Self::Skipped(_) => 0,
            Self::Completed { replayed, .. }
            | Self::Stopped { replayed, .. }
            | Self::ReconcileFailed { replayed, .. } => *replayed,
        }
    }
}

/// Holds the running phase; dropping it returns the orchestrator to idle.
struct PhaseGuard<'a> {
    phase: &'a watch::Sender<SyncPhase>,
}

impl<'a> PhaseGuard<'a> {
    /// Move `Idle -> Draining` atomically, or return `None` if a run is active.
    fn acquire(phase: &'a watch::Sender<SyncPhase>) -> Option<Self> {
        let acquired = phase.send_if_modified(|current| {
            if current.is_running() {
                false
            } else {
                *current = SyncPhase::Draining;
                true
            }
        });
        acquired.then(|| Self { phase })
    }

    fn advance(&self, next: SyncPhase) {
        self.phase.send_replace(next);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(SyncPhase::Idle);
    }
}

/// Moves queued intents to the remote store and pulls remote state back.
///
/// Clones share the same phase, so at most one run is in flight across all
/// of them.
#[derive(Clone)]
pub struct SyncOrchestrator<S, K, R> {
    store: S,
    queue: MutationQueue<K>,
    remote: R,
    gate: Gate,
    phase: Arc<watch::Sender<SyncPhase>>,
}

impl<S, K, R> SyncOrchestrator<S, K, R>
where
    S: CardStore,
    K: KeyValueStore,
    R: RemoteCardStore,
{
    pub fn new(store: S, queue: MutationQueue<K>, remote: R, gate: Gate) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            store,
            queue,
            remote,
            gate,
            phase: Arc::new(phase),
        }
    }

    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    #[must_use]
    pub const fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Run one sync if the device is online, signed in, and idle.
    pub async fn trigger_sync(&self) -> Result<SyncOutcome> {
        if !self.gate.is_connected() {
            tracing::debug!("Sync skipped: offline");
            return Ok(SyncOutcome::Skipped(SkipReason::Offline));
        }
        let Some(identity) = self.gate.identity() else {
            tracing::debug!("Sync skipped: not signed in");
            return Ok(SyncOutcome::Skipped(SkipReason::Unauthenticated));
        };
        let Some(guard) = PhaseGuard::acquire(&self.phase) else {
            tracing::debug!("Sync skipped: already running");
            return Ok(SyncOutcome::Skipped(SkipReason::AlreadyRunning));
        };

        let started = Instant::now();
        let pending = self.queue.peek_all().await?;
        let total = pending.len();
        let mut replayed = 0;

        for intent in &pending {
            tracing::debug!(
                "Replaying {} intent {} for card {}",
                intent.kind(),
                intent.id,
                intent.card_id()
            );

            if let Err(error) = RemoteCall::from_action(&intent.action)
                .send(&self.remote)
                .await
            {
                let remaining = total - replayed;
                tracing::warn!(
                    "Sync stopped at {} intent {} for card {}: {} ({} intents left queued)",
                    intent.kind(),
                    intent.id,
                    intent.card_id(),
                    error,
                    remaining
                );
                return Ok(SyncOutcome::Stopped {
                    replayed,
                    remaining,
                    failed_intent: intent.id,
                    error,
                });
            }

            self.queue.remove(&intent.id).await?;
            replayed += 1;
        }

        guard.advance(SyncPhase::Reconciling);

        let listing = match self.remote.list().await {
            Ok(cards) => cards,
            Err(error) => {
                tracing::warn!("Sync drained {} intents but listing failed: {}", replayed, error);
                return Ok(SyncOutcome::ReconcileFailed { replayed, error });
            }
        };

        // Holding the queue keeps a local edit from landing between the
        // filter and the write.
        let reconciled = self
            .queue
            .with_snapshot(|queued| async move {
                let confirmed = without_queued_cards(listing, &queued);
                self.store.bulk_replace(&confirmed).await?;
                Ok(confirmed.len())
            })
            .await?;

        tracing::info!(
            "Sync for {} replayed {} intents and reconciled {} cards in {:?}",
            identity.user_id,
            replayed,
            reconciled,
            started.elapsed()
        );
        drop(guard);

        Ok(SyncOutcome::Completed {
            replayed,
            reconciled,
        })
    }
}

/// Drop remote cards that still have queued intents, so a mutation made
/// while the run was in flight is not overwritten.
fn without_queued_cards(listing: Vec<Card>, queued: &[MutationIntent]) -> Vec<Card> {
    let queued = queued
        .iter()
        .map(MutationIntent::card_id)
        .collect::<HashSet<CardId>>();

    if queued.is_empty() {
        return listing;
    }

    tracing::debug!(
        "Keeping local state for {} cards with queued intents",
        queued.len()
    );
    listing
        .into_iter()
        .filter(|card| !queued.contains(&card.id))
        .collect()
}
