//! Data models for cardsync

mod card;
mod intent;

pub use card::{Card, CardFields, CardId, LocalCard, Rarity, Role};
pub use intent::{IntentAction, IntentId, IntentKind, MutationIntent};
