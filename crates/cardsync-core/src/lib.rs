//! cardsync-core - Core library for cardsync
//!
//! Offline-first card catalog: a local libSQL store, a durable queue of
//! mutation intents, and a single-flight orchestrator that replays the queue
//! against Supabase and reconciles local state from the remote listing.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod models;
pub mod queue;
pub mod remote;
pub mod services;
pub mod state;
pub mod sync;
mod util;

pub use error::{Error, Result};
pub use models::{Card, CardFields, CardId, LocalCard, MutationIntent};
pub use services::{Catalog, CatalogStatus};
pub use state::SyncPhase;
pub use sync::{SkipReason, SyncOrchestrator, SyncOutcome};
