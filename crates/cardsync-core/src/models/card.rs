//! Card model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A unique identifier for a card, using UUID v7 (time-sortable)
///
/// Assigned by the local writer when the card is created so the same id is
/// used by the local store, the mutation queue and the remote table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(Uuid);

impl CardId {
    /// Create a new unique card ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CardId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Card rarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "common" => Ok(Self::Common),
            "rare" => Ok(Self::Rare),
            "epic" => Ok(Self::Epic),
            "legendary" => Ok(Self::Legendary),
            other => Err(Error::InvalidInput(format!("unknown rarity '{other}'"))),
        }
    }
}

/// Card role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Troop,
    Spell,
    Building,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Troop => "troop",
            Self::Spell => "spell",
            Self::Building => "building",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "troop" => Ok(Self::Troop),
            "spell" => Ok(Self::Spell),
            "building" => Ok(Self::Building),
            other => Err(Error::InvalidInput(format!("unknown role '{other}'"))),
        }
    }
}

/// The business fields of a card, shared by every representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    pub name: String,
    pub rarity: Rarity,
    pub elixir_cost: i64,
    pub role: Role,
    pub hitpoints: i64,
    pub damage: i64,
    pub arena: i64,
    pub is_favorite: bool,
}

impl CardFields {
    /// Trim the name and reject empty names or negative stats.
    pub fn normalized(mut self) -> Result<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Card name cannot be empty".to_string()));
        }
        self.name = name.to_string();

        for (field, value) in [
            ("elixir_cost", self.elixir_cost),
            ("hitpoints", self.hitpoints),
            ("damage", self.damage),
            ("arena", self.arena),
        ] {
            if value < 0 {
                return Err(Error::InvalidInput(format!(
                    "{field} cannot be negative (got {value})"
                )));
            }
        }

        Ok(self)
    }
}

/// A card as held by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique identifier
    pub id: CardId,
    #[serde(flatten)]
    pub fields: CardFields,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// A card as held by the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCard {
    #[serde(flatten)]
    pub card: Card,
    /// A local write exists that the remote store has not accepted yet
    pub pending: bool,
}

impl LocalCard {
    /// Build a brand new card, stamped with local provisional timestamps.
    #[must_use]
    pub fn new(fields: CardFields) -> Self {
        let now = Utc::now();
        Self {
            card: Card {
                id: CardId::new(),
                fields,
                created_at: now,
                updated_at: now,
            },
            pending: true,
        }
    }

    #[must_use]
    pub const fn id(&self) -> CardId {
        self.card.id
    }

    #[must_use]
    pub const fn fields(&self) -> &CardFields {
        &self.card.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::sample_fields;

    #[test]
    fn test_card_id_unique() {
        assert_ne!(CardId::new(), CardId::new());
    }

    #[test]
    fn test_card_id_parse() {
        let id = CardId::new();
        let parsed: CardId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_new_local_card_is_pending() {
        let card = LocalCard::new(sample_fields("Knight"));
        assert!(card.pending);
        assert_eq!(card.card.created_at, card.card.updated_at);
    }

    #[test]
    fn normalized_trims_name_and_rejects_negative_stats() {
        let fields = CardFields {
            name: "  Knight ".to_string(),
            ..sample_fields("x")
        };
        assert_eq!(fields.normalized().unwrap().name, "Knight");

        let blank = sample_fields("   ");
        assert!(matches!(blank.normalized(), Err(Error::InvalidInput(_))));

        let negative = CardFields {
            damage: -1,
            ..sample_fields("Knight")
        };
        let err = negative.normalized().unwrap_err();
        assert!(err.to_string().contains("damage"));
    }

    #[test]
    fn rarity_and_role_parse_case_insensitively() {
        assert_eq!("Legendary".parse::<Rarity>().unwrap(), Rarity::Legendary);
        assert_eq!(" spell ".parse::<Role>().unwrap(), Role::Spell);
        assert!("mythic".parse::<Rarity>().is_err());
    }

    #[test]
    fn local_card_serializes_flat() {
        let card = LocalCard::new(sample_fields("Knight"));
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["name"], "Knight");
        assert_eq!(value["rarity"], "rare");
        assert_eq!(value["pending"], true);
        assert!(value.get("card").is_none());
    }

    #[test]
    fn remote_card_ignores_unknown_columns() {
        let payload = r#"{
            "id": "01890a5d-ac96-774b-bcce-b302099a8057",
            "name": "Fireball",
            "rarity": "rare",
            "elixir_cost": 4,
            "role": "spell",
            "hitpoints": 0,
            "damage": 572,
            "arena": 0,
            "is_favorite": true,
            "user_id": "someone",
            "created_at": "2024-05-01T10:00:00.123456+00:00",
            "updated_at": "2024-05-02T10:00:00+00:00"
        }"#;
        let card: Card = serde_json::from_str(payload).unwrap();
        assert_eq!(card.fields.name, "Fireball");
        assert_eq!(card.fields.role, Role::Spell);
        assert!(card.fields.is_favorite);
    }
}
