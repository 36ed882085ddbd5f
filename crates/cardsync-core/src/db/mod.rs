//! Database layer for cardsync

mod card_store;
mod connection;
mod migrations;
mod preferences;

pub use card_store::{CardStore, LibSqlCardStore};
pub use connection::{Database, SharedDatabase};
pub use preferences::{KeyValueStore, LibSqlKeyValueStore};
