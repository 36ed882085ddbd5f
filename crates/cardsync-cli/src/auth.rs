//! CLI Supabase auth/session helpers with file-backed persistence.

use std::path::Path;

use cardsync_core::auth::{
    AuthResult, FileSessionStore, SessionPersistence, SignUpOutcome, SupabaseAuthClient,
};
use cardsync_core::config::CardsyncConfig;
pub use cardsync_core::auth::AuthSession;

use crate::error::CliError;

#[derive(Clone)]
pub struct SupabaseAuthService {
    inner: SupabaseAuthClient<FileSessionStore>,
}

impl SupabaseAuthService {
    /// Build the service, or `None` when Supabase is not configured.
    pub fn from_config(
        config: &CardsyncConfig,
        session_path: &Path,
    ) -> Result<Option<Self>, CliError> {
        let Some(settings) = config.supabase()? else {
            return Ok(None);
        };

        let inner = SupabaseAuthClient::new(
            &settings.url,
            settings.anon_key,
            config.request_timeout(),
            FileSessionStore::new(session_path),
        )
        .map_err(|error| CliError::Auth(error.to_string()))?;
        Ok(Some(Self { inner }))
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        self.inner.sign_up(email, password).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        self.inner.restore_session().await
    }

    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        self.inner.sign_out(access_token).await
    }
}

pub fn load_stored_session(session_path: &Path) -> Result<Option<AuthSession>, CliError> {
    FileSessionStore::new(session_path)
        .load_session()
        .map_err(|error| CliError::Auth(error.to_string()))
}

pub fn clear_stored_session(session_path: &Path) -> Result<(), CliError> {
    FileSessionStore::new(session_path)
        .clear_session()
        .map_err(|error| CliError::Auth(error.to_string()))
}

/// The current usable session: restored (and refreshed if needed) through
/// Supabase when configured, otherwise nothing.
pub async fn resolve_session(
    service: Option<&SupabaseAuthService>,
) -> Result<Option<AuthSession>, CliError> {
    match service {
        Some(service) => service
            .restore_session()
            .await
            .map_err(|error| CliError::Auth(error.to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use cardsync_core::auth::AuthUser;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn unconfigured_supabase_has_no_service() {
        let dir = TempDir::new().unwrap();
        let service =
            SupabaseAuthService::from_config(&CardsyncConfig::default(), &dir.path().join("s"))
                .unwrap();
        assert!(service.is_none());
    }

    #[test]
    fn half_configured_supabase_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = CardsyncConfig {
            supabase_url: Some("https://demo.supabase.co".to_string()),
            ..Default::default()
        };
        assert!(SupabaseAuthService::from_config(&config, &dir.path().join("s")).is_err());
    }

    #[tokio::test]
    async fn valid_stored_session_is_restored_without_network() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let session = AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX / 2,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("player@example.com".to_string()),
            },
        };
        FileSessionStore::new(&path).save_session(&session).unwrap();
        let config = CardsyncConfig {
            supabase_url: Some("http://127.0.0.1:9".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            ..Default::default()
        };

        let service = SupabaseAuthService::from_config(&config, &path).unwrap();
        let restored = resolve_session(service.as_ref()).await.unwrap();

        assert_eq!(restored, Some(session));
        clear_stored_session(&path).unwrap();
        assert!(load_stored_session(&path).unwrap().is_none());
    }
}
