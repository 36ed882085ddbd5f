//! Authoritative remote card store.
//!
//! The sync orchestrator only needs the [`RemoteCardStore`] trait; the
//! Supabase implementation lives in [`supabase`].

mod supabase;
mod translate;

use thiserror::Error;

use crate::models::{Card, CardId};

pub use supabase::SupabaseCardsClient;
pub use translate::{CardInsert, CardPatch, RemoteCall};

/// Errors returned by a remote store call
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("No signed-in session; sign in before syncing")]
    NotAuthenticated,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("Unexpected remote payload: {0}")]
    InvalidPayload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Networked CRUD over the shared card table (async).
///
/// Timestamps on returned cards are assigned by the server.
#[allow(async_fn_in_trait)]
pub trait RemoteCardStore {
    /// Insert a card under its client-generated id
    async fn create(&self, card: &CardInsert) -> RemoteResult<Card>;

    /// Patch the business fields of an existing card
    async fn update(&self, id: &CardId, patch: &CardPatch) -> RemoteResult<Card>;

    /// Delete a card by id
    async fn delete(&self, id: &CardId) -> RemoteResult<()>;

    /// Every card, newest `created_at` first
    async fn list(&self) -> RemoteResult<Vec<Card>>;
}
