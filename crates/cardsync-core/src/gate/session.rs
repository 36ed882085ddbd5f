//! In-process holder of the signed-in session.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::SessionGate;
use crate::auth::AuthSession;

/// Who is signed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

/// Shared handle to the session the process started with.
///
/// Satisfies the session gate and hands the bearer token to the remote
/// client, so both always agree on who is signed in.
#[derive(Clone, Default)]
pub struct SharedSession {
    inner: Arc<Option<AuthSession>>,
}

impl SharedSession {
    #[must_use]
    pub fn new(session: Option<AuthSession>) -> Self {
        Self {
            inner: Arc::new(session),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        (*self.inner)
            .as_ref()
            .map(|session| session.access_token.clone())
    }
}

impl SessionGate for SharedSession {
    fn current_identity(&self) -> Option<Identity> {
        (*self.inner).as_ref().map(AuthSession::identity)
    }
}
