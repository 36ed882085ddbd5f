//! Local card store

use libsql::{params, Connection, Row};

use super::SharedDatabase;
use crate::error::{Error, Result};
use crate::models::{Card, CardFields, CardId, LocalCard};
use crate::util::timestamp_from_millis;

const CARD_COLUMNS: &str = "id, name, rarity, elixir_cost, role, hitpoints, damage, arena, \
     is_favorite, created_at, updated_at, pending";

const UPSERT_CARD: &str = "INSERT INTO cards (
        id, name, rarity, elixir_cost, role, hitpoints, damage, arena,
        is_favorite, created_at, updated_at, pending
     ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
     ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        rarity = excluded.rarity,
        elixir_cost = excluded.elixir_cost,
        role = excluded.role,
        hitpoints = excluded.hitpoints,
        damage = excluded.damage,
        arena = excluded.arena,
        is_favorite = excluded.is_favorite,
        created_at = excluded.created_at,
        updated_at = excluded.updated_at,
        pending = excluded.pending";

/// Trait for the durable local card store (async)
///
/// Every write is an upsert keyed by card id, so there is never more than one
/// record per id.
#[allow(async_fn_in_trait)]
pub trait CardStore {
    /// All cards, most recently modified first
    async fn get_all(&self) -> Result<Vec<LocalCard>>;

    /// A single card by id
    async fn get(&self, id: &CardId) -> Result<Option<LocalCard>>;

    /// Insert-or-replace a locally created card, marking it pending
    async fn insert(&self, card: &Card) -> Result<()>;

    /// Insert-or-replace a locally edited card, marking it pending
    async fn update(&self, card: &Card) -> Result<()>;

    /// Remove a card; absent ids are a no-op
    async fn delete(&self, id: &CardId) -> Result<()>;

    /// Upsert server-confirmed cards with `pending = false`.
    ///
    /// Cards missing from `cards` are left untouched.
    async fn bulk_replace(&self, cards: &[Card]) -> Result<()>;

    /// Number of cards with unconfirmed local writes
    async fn pending_count(&self) -> Result<usize>;
}

/// libSQL implementation of `CardStore`
#[derive(Clone)]
pub struct LibSqlCardStore {
    db: SharedDatabase,
}

impl LibSqlCardStore {
    /// Create a new store over the shared database
    pub const fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    async fn upsert(conn: &Connection, card: &Card, pending: bool) -> Result<()> {
        let fields = &card.fields;
        conn.execute(
            UPSERT_CARD,
            params![
                card.id.as_str(),
                fields.name.as_str(),
                fields.rarity.as_str(),
                fields.elixir_cost,
                fields.role.as_str(),
                fields.hitpoints,
                fields.damage,
                fields.arena,
                i64::from(fields.is_favorite),
                card.created_at.timestamp_millis(),
                card.updated_at.timestamp_millis(),
                i64::from(pending)
            ],
        )
        .await?;
        Ok(())
    }

    /// Parse a card from a database row
    fn parse_card(row: &Row) -> Result<LocalCard> {
        let id: String = row.get(0)?;
        let id = id
            .parse::<CardId>()
            .map_err(|_| Error::Database(format!("Invalid card id '{id}'")))?;

        let rarity: String = row.get(2)?;
        let role: String = row.get(4)?;
        let created_at: i64 = row.get(9)?;
        let updated_at: i64 = row.get(10)?;

        Ok(LocalCard {
            card: Card {
                id,
                fields: CardFields {
                    name: row.get(1)?,
                    rarity: rarity.parse()?,
                    elixir_cost: row.get(3)?,
                    role: role.parse()?,
                    hitpoints: row.get(5)?,
                    damage: row.get(6)?,
                    arena: row.get(7)?,
                    is_favorite: row.get::<i64>(8)? != 0,
                },
                created_at: timestamp_from_millis(created_at).ok_or_else(|| {
                    Error::Database(format!("Invalid created_at for card {id}"))
                })?,
                updated_at: timestamp_from_millis(updated_at).ok_or_else(|| {
                    Error::Database(format!("Invalid updated_at for card {id}"))
                })?,
            },
            pending: row.get::<i64>(11)? != 0,
        })
    }
}

impl CardStore for LibSqlCardStore {
    async fn get_all(&self) -> Result<Vec<LocalCard>> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                &format!(
                    "SELECT {CARD_COLUMNS} FROM cards ORDER BY updated_at DESC, created_at DESC"
                ),
                (),
            )
            .await?;

        let mut cards = Vec::new();
        while let Some(row) = rows.next().await? {
            cards.push(Self::parse_card(&row)?);
        }
        Ok(cards)
    }

    async fn get(&self, id: &CardId) -> Result<Option<LocalCard>> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?"),
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_card(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, card: &Card) -> Result<()> {
        let db = self.db.lock().await;
        Self::upsert(db.connection(), card, true).await
    }

    async fn update(&self, card: &Card) -> Result<()> {
        let db = self.db.lock().await;
        Self::upsert(db.connection(), card, true).await
    }

    async fn delete(&self, id: &CardId) -> Result<()> {
        let db = self.db.lock().await;
        db.connection()
            .execute("DELETE FROM cards WHERE id = ?", [id.as_str()])
            .await?;
        Ok(())
    }

    async fn bulk_replace(&self, cards: &[Card]) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute("BEGIN TRANSACTION", ()).await?;
        for card in cards {
            if let Err(e) = Self::upsert(conn, card, false).await {
                conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        }
        if let Err(e) = conn.execute("COMMIT", ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        tracing::debug!("Replaced {} confirmed cards", cards.len());
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query("SELECT COUNT(*) FROM cards WHERE pending = 1", ())
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
