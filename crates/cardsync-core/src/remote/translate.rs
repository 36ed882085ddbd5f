//! Mapping from queued intents to remote calls.
//!
//! Local-only bookkeeping (`pending`) and timestamps never leave the device:
//! the remote store assigns its own `created_at` and `updated_at`.

use serde::Serialize;

use super::{RemoteCardStore, RemoteResult};
use crate::models::{CardFields, CardId, IntentAction, LocalCard};

/// Body of a remote insert: the card id plus its business fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardInsert {
    pub id: CardId,
    #[serde(flatten)]
    pub fields: CardFields,
}

impl From<&LocalCard> for CardInsert {
    fn from(card: &LocalCard) -> Self {
        Self {
            id: card.id(),
            fields: card.fields().clone(),
        }
    }
}

/// Body of a remote update; the id travels in the request filter instead
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardPatch {
    #[serde(flatten)]
    pub fields: CardFields,
}

impl From<&LocalCard> for CardPatch {
    fn from(card: &LocalCard) -> Self {
        Self {
            fields: card.fields().clone(),
        }
    }
}

/// One remote request derived from one intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Create(CardInsert),
    Update { id: CardId, patch: CardPatch },
    Delete { id: CardId },
}

impl RemoteCall {
    #[must_use]
    pub fn from_action(action: &IntentAction) -> Self {
        match action {
            IntentAction::Create(card) => Self::Create(CardInsert::from(card)),
            IntentAction::Update(card) => Self::Update {
                id: card.id(),
                patch: CardPatch::from(card),
            },
            IntentAction::Delete { id } => Self::Delete { id: *id },
        }
    }

    /// Issue the call. The returned card, if any, is discarded; the listing
    /// that follows a full drain is what lands locally.
    pub async fn send<R: RemoteCardStore>(&self, remote: &R) -> RemoteResult<()> {
        match self {
            Self::Create(insert) => remote.create(insert).await.map(drop),
            Self::Update { id, patch } => remote.update(id, patch).await.map(drop),
            Self::Delete { id } => remote.delete(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;
    use crate::models::test_support::sample_fields;

    fn keys(value: &Value) -> Vec<&str> {
        let mut keys = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn create_keeps_id_and_strips_local_bookkeeping() {
        let card = LocalCard::new(sample_fields("Knight"));
        let RemoteCall::Create(insert) = RemoteCall::from_action(&IntentAction::Create(card.clone()))
        else {
            panic!("expected a create call");
        };

        let body = serde_json::to_value(&insert).unwrap();
        assert_eq!(
            keys(&body),
            vec![
                "arena",
                "damage",
                "elixir_cost",
                "hitpoints",
                "id",
                "is_favorite",
                "name",
                "rarity",
                "role",
            ]
        );
        assert_eq!(body["id"], card.id().to_string());
        assert_eq!(body["rarity"], "rare");
        assert_eq!(body["role"], "troop");
    }

    #[test]
    fn update_moves_id_out_of_the_body() {
        let mut card = LocalCard::new(sample_fields("Knight"));
        card.card.fields.is_favorite = true;

        let call = RemoteCall::from_action(&IntentAction::Update(card.clone()));
        let RemoteCall::Update { id, patch } = call else {
            panic!("expected an update call");
        };

        assert_eq!(id, card.id());
        let body = serde_json::to_value(&patch).unwrap();
        assert!(body.get("id").is_none());
        assert!(body.get("pending").is_none());
        assert!(body.get("created_at").is_none());
        assert!(body.get("updated_at").is_none());
        assert_eq!(body["is_favorite"], true);
    }

    #[test]
    fn delete_carries_only_the_id() {
        let id = CardId::new();
        assert_eq!(
            RemoteCall::from_action(&IntentAction::Delete { id }),
            RemoteCall::Delete { id }
        );
    }

    #[test]
    fn translation_is_deterministic() {
        let action = IntentAction::Update(LocalCard::new(sample_fields("Giant")));
        assert_eq!(
            RemoteCall::from_action(&action),
            RemoteCall::from_action(&action)
        );
    }
}
