//! Key-value preferences repository

use super::SharedDatabase;
use crate::error::Result;

/// Trait for durable string key-value storage (async)
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; absent keys are a no-op
    async fn remove(&self, key: &str) -> Result<()>;

    /// Every key starting with `prefix`, sorted
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// libSQL implementation of `KeyValueStore`
#[derive(Clone)]
pub struct LibSqlKeyValueStore {
    db: SharedDatabase,
}

impl LibSqlKeyValueStore {
    /// Create a new store over the shared database
    pub const fn new(db: SharedDatabase) -> Self {
        Self { db }
    }
}

impl KeyValueStore for LibSqlKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query("SELECT value FROM preferences WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.connection()
            .execute(
                "INSERT OR REPLACE INTO preferences (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.connection()
            .execute("DELETE FROM preferences WHERE key = ?", [key])
            .await?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        // instr() rather than LIKE: keys contain `_`, a LIKE wildcard.
        let mut rows = db
            .connection()
            .query(
                "SELECT key FROM preferences WHERE instr(key, ?1) = 1 ORDER BY key",
                [prefix],
            )
            .await?;

        let mut keys = Vec::new();
        while let Some(row) = rows.next().await? {
            keys.push(row.get::<String>(0)?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> LibSqlKeyValueStore {
        let db = Database::open_in_memory().await.unwrap();
        LibSqlKeyValueStore::new(db.into_shared())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_key_is_none() {
        let store = setup().await;
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_replaces_previous_value() {
        let store = setup().await;

        store.set("queue", "[]").await.unwrap();
        store.set("queue", "[1]").await.unwrap();

        assert_eq!(store.get("queue").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_is_idempotent() {
        let store = setup().await;
        store.set("queue", "[]").await.unwrap();

        store.remove("queue").await.unwrap();
        store.remove("queue").await.unwrap();

        assert_eq!(store.get("queue").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_keys_with_prefix_treats_underscore_literally() {
        let store = setup().await;
        for key in ["queue.corrupt-2", "queue.corrupt-1", "queueXcorrupt-3", "queue"] {
            store.set(key, "x").await.unwrap();
        }
        store.set("queue_corrupt-4", "x").await.unwrap();

        assert_eq!(
            store.keys_with_prefix("queue.corrupt-").await.unwrap(),
            vec!["queue.corrupt-1".to_string(), "queue.corrupt-2".to_string()]
        );
        assert_eq!(
            store.keys_with_prefix("queue_").await.unwrap(),
            vec!["queue_corrupt-4".to_string()]
        );
    }
}
