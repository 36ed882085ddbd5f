//! Supabase GoTrue email/password auth.
//!
//! Every session the client obtains is written through a
//! [`SessionPersistence`] store, so the next process can restore it without
//! asking for credentials again.

mod file_store;
mod gotrue;

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Request, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gate::Identity;
use crate::util::{is_http_url, unix_timestamp_now};

pub use file_store::FileSessionStore;
pub(crate) use gotrue::describe_api_error;
use gotrue::GoTrueResponse;

/// Sessions this close to expiry are refreshed before use
const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user.id.clone(),
            email: self.user.email.clone(),
        }
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The project auto-confirms accounts; the session is stored
    SignedIn(AuthSession),
    /// A confirmation email was sent; sign in after following it
    ConfirmationPending,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("{0} is required")]
    MissingCredential(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Session storage error: {0}")]
    Storage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where a signed-in session survives between processes
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl<'a> Credentials<'a> {
    fn new(email: &'a str, password: &'a str) -> AuthResult<Self> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingCredential("Email"));
        }
        if password.trim().is_empty() {
            return Err(AuthError::MissingCredential("Password"));
        }
        Ok(Self { email, password })
    }
}

/// `/token` grants used by this client
enum TokenGrant<'a> {
    Password(Credentials<'a>),
    RefreshToken(&'a str),
}

impl TokenGrant<'_> {
    const fn grant_type(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::RefreshToken(_) => "refresh_token",
        }
    }
}

#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    endpoint: String,
    anon_key: String,
    http: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(
        url: impl AsRef<str>,
        anon_key: impl Into<String>,
        timeout: Duration,
        store: S,
    ) -> AuthResult<Self> {
        let endpoint = auth_endpoint(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        Ok(Self {
            endpoint,
            anon_key,
            http: Client::builder().timeout(timeout).build()?,
            store,
        })
    }

    /// The stored session, refreshed first when it is about to expire.
    ///
    /// A session that cannot be refreshed is dropped from storage.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored) = self.store.load_session()? else {
            return Ok(None);
        };
        if !stored.is_expired() {
            return Ok(Some(stored));
        }

        tracing::debug!("Stored session for {} expired, refreshing", stored.user.id);
        match self.refresh_session(&stored.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Dropping stored session that failed to refresh: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        let credentials = Credentials::new(email, password)?;
        let response = self.execute(self.signup_request(&credentials)?).await?;

        match response.into_session(unix_timestamp_now())? {
            Some(session) => {
                self.store.save_session(&session)?;
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => Ok(SignUpOutcome::ConfirmationPending),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let credentials = Credentials::new(email, password)?;
        self.grant_session(&TokenGrant::Password(credentials)).await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::MissingCredential("Refresh token"));
        }
        self.grant_session(&TokenGrant::RefreshToken(refresh_token))
            .await
    }

    /// Revoke the session remotely and forget it locally.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self.http.execute(self.logout_request(access_token)?).await?;
        let status = response.status();
        // 401: the token already expired, which is as signed out as it gets.
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(describe_api_error(status, &body)));
        }

        self.store.clear_session()
    }

    async fn grant_session(&self, grant: &TokenGrant<'_>) -> AuthResult<AuthSession> {
        let response = self.execute(self.token_request(grant)?).await?;
        let session = response
            .into_session(unix_timestamp_now())?
            .ok_or_else(|| {
                AuthError::Api(format!(
                    "{} grant did not return a session",
                    grant.grant_type()
                ))
            })?;

        self.store.save_session(&session)?;
        tracing::debug!("Stored session for user {}", session.user.id);
        Ok(session)
    }

    fn token_request(&self, grant: &TokenGrant<'_>) -> AuthResult<Request> {
        let builder = self
            .http
            .post(format!("{}/token", self.endpoint))
            .query(&[("grant_type", grant.grant_type())]);
        let builder = match grant {
            TokenGrant::Password(credentials) => builder.json(credentials),
            TokenGrant::RefreshToken(refresh_token) => {
                builder.json(&serde_json::json!({ "refresh_token": refresh_token }))
            }
        };
        Ok(self.with_anon_key(builder).build()?)
    }

    fn signup_request(&self, credentials: &Credentials<'_>) -> AuthResult<Request> {
        let builder = self
            .http
            .post(format!("{}/signup", self.endpoint))
            .json(credentials);
        Ok(self.with_anon_key(builder).build()?)
    }

    fn logout_request(&self, access_token: &str) -> AuthResult<Request> {
        Ok(self
            .http
            .post(format!("{}/logout", self.endpoint))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .build()?)
    }

    /// Public endpoints take the anon key both as api key and as bearer.
    fn with_anon_key(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn execute(&self, request: Request) -> AuthResult<GoTrueResponse> {
        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Api(describe_api_error(status, &body)));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// `{project}/auth/v1`, whether or not `url` already ends with the auth path.
fn auth_endpoint(url: &str) -> AuthResult<String> {
    let base = url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must not be empty",
        ));
    }
    if !is_http_url(base) {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must include http:// or https://",
        ));
    }

    Ok(if base.ends_with("/auth/v1") {
        base.to_string()
    } else {
        format!("{base}/auth/v1")
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reqwest::Method;
    use tempfile::TempDir;

    use super::*;

    fn session(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "user-access".to_string(),
            refresh_token: "user-refresh".to_string(),
            expires_at,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("player@example.com".to_string()),
            },
        }
    }

    fn client(url: &str, dir: &TempDir) -> SupabaseAuthClient<FileSessionStore> {
        SupabaseAuthClient::new(
            url,
            "anon-key",
            Duration::from_secs(2),
            FileSessionStore::new(dir.path().join("session.json")),
        )
        .unwrap()
    }

    fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    fn json_body(request: &Request) -> serde_json::Value {
        let bytes = request.body().and_then(reqwest::Body::as_bytes).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn auth_endpoint_appends_auth_path_once() {
        assert_eq!(
            auth_endpoint("https://demo.supabase.co/").unwrap(),
            "https://demo.supabase.co/auth/v1"
        );
        assert_eq!(
            auth_endpoint("https://demo.supabase.co/auth/v1/").unwrap(),
            "https://demo.supabase.co/auth/v1"
        );
        assert!(matches!(
            auth_endpoint("demo.supabase.co"),
            Err(AuthError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn blank_credentials_are_rejected_before_any_request() {
        assert!(matches!(
            Credentials::new("  ", "secret"),
            Err(AuthError::MissingCredential("Email"))
        ));
        assert!(matches!(
            Credentials::new("player@example.com", " "),
            Err(AuthError::MissingCredential("Password"))
        ));
    }

    #[test]
    fn password_grant_request_shape() {
        let dir = TempDir::new().unwrap();
        let client = client("https://demo.supabase.co", &dir);
        let grant = TokenGrant::Password(Credentials::new(" player@example.com ", "pw").unwrap());

        let request = client.token_request(&grant).unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().path(), "/auth/v1/token");
        assert_eq!(request.url().query(), Some("grant_type=password"));
        assert_eq!(header(&request, "apikey"), Some("anon-key"));
        assert_eq!(header(&request, "authorization"), Some("Bearer anon-key"));
        assert_eq!(
            json_body(&request),
            serde_json::json!({ "email": "player@example.com", "password": "pw" })
        );
    }

    #[test]
    fn refresh_and_signup_request_shapes() {
        let dir = TempDir::new().unwrap();
        let client = client("https://demo.supabase.co", &dir);

        let refresh = client
            .token_request(&TokenGrant::RefreshToken("user-refresh"))
            .unwrap();
        assert_eq!(refresh.url().query(), Some("grant_type=refresh_token"));
        assert_eq!(
            json_body(&refresh),
            serde_json::json!({ "refresh_token": "user-refresh" })
        );

        let credentials = Credentials::new("player@example.com", "pw").unwrap();
        let signup = client.signup_request(&credentials).unwrap();
        assert_eq!(signup.url().path(), "/auth/v1/signup");
        assert_eq!(signup.url().query(), None);
        assert_eq!(json_body(&signup)["email"], "player@example.com");
    }

    #[test]
    fn logout_uses_the_user_token() {
        let dir = TempDir::new().unwrap();
        let client = client("https://demo.supabase.co", &dir);

        let request = client.logout_request("user-access").unwrap();

        assert_eq!(request.url().path(), "/auth/v1/logout");
        assert_eq!(header(&request, "apikey"), Some("anon-key"));
        assert_eq!(header(&request, "authorization"), Some("Bearer user-access"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn expired_session_that_cannot_refresh_is_dropped() {
        let dir = TempDir::new().unwrap();
        let client = client("http://127.0.0.1:9", &dir);
        client.store.save_session(&session(1)).unwrap();

        assert!(client.restore_session().await.unwrap().is_none());
        assert!(client.store.load_session().unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fresh_session_is_restored_without_network() {
        let dir = TempDir::new().unwrap();
        let client = client("http://127.0.0.1:9", &dir);
        let stored = session(unix_timestamp_now() + 3600);
        client.store.save_session(&stored).unwrap();

        assert_eq!(client.restore_session().await.unwrap(), Some(stored));
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session(1_700_000_000));
        assert!(!rendered.contains("user-access"));
        assert!(!rendered.contains("user-refresh"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
