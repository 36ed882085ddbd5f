//! Mutation intent model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CardId, LocalCard};

/// Identifier of a queued intent, independent of the card it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentId(Uuid);

impl IntentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for IntentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IntentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Create,
    Update,
    Delete,
}

impl IntentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user asked for, with the data needed to replay it remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "UPPERCASE")]
pub enum IntentAction {
    /// Full local snapshot of the created card
    Create(LocalCard),
    /// Full local snapshot of the card after the edit
    Update(LocalCard),
    /// Only the id of the deleted card
    Delete { id: CardId },
}

impl IntentAction {
    #[must_use]
    pub const fn kind(&self) -> IntentKind {
        match self {
            Self::Create(_) => IntentKind::Create,
            Self::Update(_) => IntentKind::Update,
            Self::Delete { .. } => IntentKind::Delete,
        }
    }

    #[must_use]
    pub const fn card_id(&self) -> CardId {
        match self {
            Self::Create(card) | Self::Update(card) => card.card.id,
            Self::Delete { id } => *id,
        }
    }
}

/// An immutable, replayable record of one user mutation.
///
/// `created_at` is kept for diagnostics only; queue order is insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationIntent {
    pub id: IntentId,
    pub action: IntentAction,
    pub created_at: DateTime<Utc>,
}

impl MutationIntent {
    fn with_action(action: IntentAction) -> Self {
        Self {
            id: IntentId::new(),
            action,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn create(card: LocalCard) -> Self {
        Self::with_action(IntentAction::Create(card))
    }

    #[must_use]
    pub fn update(card: LocalCard) -> Self {
        Self::with_action(IntentAction::Update(card))
    }

    #[must_use]
    pub fn delete(id: CardId) -> Self {
        Self::with_action(IntentAction::Delete { id })
    }

    #[must_use]
    pub const fn kind(&self) -> IntentKind {
        self.action.kind()
    }

    #[must_use]
    pub const fn card_id(&self) -> CardId {
        self.action.card_id()
    }
}
