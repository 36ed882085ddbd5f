//! Supabase PostgREST client for the cards table.

use std::time::Duration;

use reqwest::{Client, Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{CardInsert, CardPatch, RemoteCardStore, RemoteError, RemoteResult};
use crate::auth::describe_api_error;
use crate::gate::SharedSession;
use crate::models::{Card, CardId};
use crate::util::is_http_url;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Stateless request/response client; every call carries the current
/// session's bearer token.
#[derive(Clone)]
pub struct SupabaseCardsClient {
    table_url: String,
    anon_key: String,
    client: Client,
    session: SharedSession,
}

impl SupabaseCardsClient {
    pub fn new(
        url: &str,
        anon_key: &str,
        table: &str,
        timeout: Duration,
        session: SharedSession,
    ) -> RemoteResult<Self> {
        let base = url.trim().trim_end_matches('/');
        if !is_http_url(base) {
            return Err(RemoteError::Api(
                "Supabase URL must include http:// or https://".to_string(),
            ));
        }
        let table = table.trim();
        if table.is_empty() {
            return Err(RemoteError::Api("Cards table name must not be empty".to_string()));
        }

        Ok(Self {
            table_url: format!("{base}/rest/v1/{table}"),
            anon_key: anon_key.trim().to_string(),
            client: Client::builder().timeout(timeout).build()?,
            session,
        })
    }

    #[must_use]
    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn authorized(&self, request: RequestBuilder) -> RemoteResult<RequestBuilder> {
        let token = self
            .session
            .access_token()
            .ok_or(RemoteError::NotAuthenticated)?;
        Ok(request.header("apikey", &self.anon_key).bearer_auth(token))
    }

    fn single_row(request: RequestBuilder) -> RequestBuilder {
        request
            .header("Prefer", "return=representation")
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
    }

    fn id_filter(id: &CardId) -> [(&'static str, String); 1] {
        [("id", format!("eq.{id}"))]
    }

    fn create_request(&self, card: &CardInsert) -> RemoteResult<Request> {
        let builder = self.authorized(self.client.post(&self.table_url))?;
        Ok(Self::single_row(builder).json(card).build()?)
    }

    fn update_request(&self, id: &CardId, patch: &CardPatch) -> RemoteResult<Request> {
        let builder = self.authorized(self.client.patch(&self.table_url))?;
        Ok(Self::single_row(builder)
            .query(&Self::id_filter(id))
            .json(patch)
            .build()?)
    }

    fn delete_request(&self, id: &CardId) -> RemoteResult<Request> {
        Ok(self
            .authorized(self.client.delete(&self.table_url))?
            .query(&Self::id_filter(id))
            .build()?)
    }

    fn list_request(&self) -> RemoteResult<Request> {
        Ok(self
            .authorized(self.client.get(&self.table_url))?
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .build()?)
    }

    async fn send(&self, request: Request) -> RemoteResult<Response> {
        let response = self.client.execute(request).await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Api(describe_api_error(status, &body)))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|error| RemoteError::InvalidPayload(error.to_string()))
    }
}

impl RemoteCardStore for SupabaseCardsClient {
    async fn create(&self, card: &CardInsert) -> RemoteResult<Card> {
        let response = self.send(self.create_request(card)?).await?;
        let created: Card = Self::decode(response).await?;
        tracing::debug!("Remote created card {}", created.id);
        Ok(created)
    }

    async fn update(&self, id: &CardId, patch: &CardPatch) -> RemoteResult<Card> {
        let response = self.send(self.update_request(id, patch)?).await?;
        let updated: Card = Self::decode(response).await?;
        tracing::debug!("Remote updated card {}", updated.id);
        Ok(updated)
    }

    async fn delete(&self, id: &CardId) -> RemoteResult<()> {
        self.send(self.delete_request(id)?).await?;
        tracing::debug!("Remote deleted card {}", id);
        Ok(())
    }

    async fn list(&self) -> RemoteResult<Vec<Card>> {
        let response = self.send(self.list_request()?).await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reqwest::Method;

    use super::*;
    use crate::auth::{AuthSession, AuthUser};
    use crate::models::test_support::sample_fields;
    use crate::models::{LocalCard, Rarity, Role};

    fn client(session: SharedSession) -> SupabaseCardsClient {
        SupabaseCardsClient::new(
            "https://demo.supabase.co/",
            "anon",
            "cards",
            Duration::from_secs(5),
            session,
        )
        .unwrap()
    }

    fn signed_in() -> SharedSession {
        SharedSession::new(Some(AuthSession {
            access_token: "user-access".to_string(),
            refresh_token: "user-refresh".to_string(),
            expires_at: 1_900_000_000,
            user: AuthUser {
                id: "user-1".to_string(),
                email: None,
            },
        }))
    }

    fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    fn query_pairs(request: &Request) -> Vec<(String, String)> {
        request
            .url()
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn json_body(request: &Request) -> serde_json::Value {
        let bytes = request.body().and_then(reqwest::Body::as_bytes).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    fn assert_authorized(request: &Request) {
        assert_eq!(header(request, "apikey"), Some("anon"));
        assert_eq!(header(request, "authorization"), Some("Bearer user-access"));
    }

    fn assert_single_row(request: &Request) {
        assert_eq!(header(request, "prefer"), Some("return=representation"));
        assert_eq!(header(request, "accept"), Some(SINGLE_OBJECT));
    }

    #[test]
    fn create_posts_id_and_fields_only() {
        let client = client(signed_in());
        let card = LocalCard::new(sample_fields("Hog Rider"));

        let request = client.create_request(&CardInsert::from(&card)).unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().path(), "/rest/v1/cards");
        assert!(request.url().query().is_none());
        assert_authorized(&request);
        assert_single_row(&request);

        let body = json_body(&request);
        assert_eq!(body["id"], card.id().to_string());
        assert_eq!(body["name"], "Hog Rider");
        for local_only in ["pending", "created_at", "updated_at"] {
            assert!(body.get(local_only).is_none(), "{local_only} leaked");
        }
    }

    #[test]
    fn update_patches_by_id_filter_without_id_in_body() {
        let client = client(signed_in());
        let card = LocalCard::new(sample_fields("Hog Rider"));

        let request = client
            .update_request(&card.id(), &CardPatch::from(&card))
            .unwrap();

        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(
            query_pairs(&request),
            vec![("id".to_string(), format!("eq.{}", card.id()))]
        );
        assert_authorized(&request);
        assert_single_row(&request);

        let body = json_body(&request);
        assert_eq!(body["elixir_cost"], 4);
        for excluded in ["id", "pending", "created_at", "updated_at"] {
            assert!(body.get(excluded).is_none(), "{excluded} leaked");
        }
    }

    #[test]
    fn delete_targets_one_id_without_body() {
        let client = client(signed_in());
        let id = CardId::new();

        let request = client.delete_request(&id).unwrap();

        assert_eq!(request.method(), &Method::DELETE);
        assert_eq!(
            query_pairs(&request),
            vec![("id".to_string(), format!("eq.{id}"))]
        );
        assert_authorized(&request);
        assert!(request.body().is_none());
        assert!(header(&request, "prefer").is_none());
    }

    #[test]
    fn list_selects_all_newest_first() {
        let client = client(signed_in());

        let request = client.list_request().unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(
            query_pairs(&request),
            vec![
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
        assert_authorized(&request);
        assert!(header(&request, "accept").is_none());
    }

    #[test]
    fn table_url_targets_rest_endpoint() {
        let client = client(SharedSession::default());
        assert_eq!(client.table_url(), "https://demo.supabase.co/rest/v1/cards");
    }

    #[test]
    fn rejects_url_without_scheme() {
        let result = SupabaseCardsClient::new(
            "demo.supabase.co",
            "anon",
            "cards",
            Duration::from_secs(5),
            SharedSession::default(),
        );
        assert!(matches!(result, Err(RemoteError::Api(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn calls_without_session_are_rejected_before_sending() {
        let client = client(SharedSession::default());

        let result = client.list().await;

        assert!(matches!(result, Err(RemoteError::NotAuthenticated)));
    }

    #[test]
    fn remote_rows_with_extra_columns_decode() {
        let row = r#"{
            "id": "0190d6c2-7d4e-7c3a-9f57-3b9b7c1d2e4f",
            "user_id": "5f0c1d3e-0000-4000-8000-000000000000",
            "name": "Mini P.E.K.K.A",
            "rarity": "rare",
            "elixir_cost": 4,
            "role": "troop",
            "hitpoints": 1129,
            "damage": 598,
            "arena": 4,
            "is_favorite": true,
            "created_at": "2025-03-01T10:15:30.123456+00:00",
            "updated_at": "2025-03-02T08:00:00+00:00"
        }"#;

        let card: Card = serde_json::from_str(row).unwrap();
        assert_eq!(card.fields.rarity, Rarity::Rare);
        assert_eq!(card.fields.role, Role::Troop);
        assert!(card.fields.is_favorite);
        assert!(card.updated_at > card.created_at);
    }
}
