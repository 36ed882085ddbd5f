use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] cardsync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Card name cannot be empty")]
    EmptyName,
    #[error("Card ID cannot be empty")]
    EmptyCardId,
    #[error("Card not found for id/prefix: {0}")]
    CardNotFound(String),
    #[error("{0}")]
    AmbiguousCardId(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Remote error: {0}")]
    Remote(String),
    #[error(
        "Supabase is not configured. Run `cardsync config init --supabase-url <URL> --supabase-anon-key <KEY>` or set CARDSYNC_SUPABASE_URL and CARDSYNC_SUPABASE_ANON_KEY."
    )]
    SupabaseNotConfigured,
    #[error("Refusing to discard queued changes without --yes")]
    ConfirmationRequired,
}
