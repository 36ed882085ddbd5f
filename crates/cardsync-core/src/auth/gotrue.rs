//! GoTrue response bodies and error rendering shared with the cards client.

use reqwest::StatusCode;
use serde::Deserialize;

use super::{AuthError, AuthResult, AuthSession, AuthUser};
use crate::util::compact_text;

/// Body of `/token` and `/signup`.
///
/// Token grants and auto-confirmed sign-ups carry every field; a sign-up
/// that still needs email confirmation carries the user and no tokens.
#[derive(Debug, Deserialize)]
pub(super) struct GoTrueResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<GoTrueUser>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

impl GoTrueResponse {
    /// The session in the body, or `None` when no access token was issued.
    ///
    /// `now` anchors a relative `expires_in`.
    pub(super) fn into_session(self, now: i64) -> AuthResult<Option<AuthSession>> {
        let Some(access_token) = self.access_token else {
            return Ok(None);
        };
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|seconds| now.saturating_add(seconds)));

        match (self.refresh_token, expires_at, self.user) {
            (Some(refresh_token), Some(expires_at), Some(user)) => Ok(Some(AuthSession {
                access_token,
                refresh_token,
                expires_at,
                user: user.into(),
            })),
            _ => Err(AuthError::Api(
                "Auth response is missing refresh_token, expiry or user".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    details: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        [
            self.message,
            self.msg,
            self.error_description,
            self.error,
            self.details,
        ]
        .into_iter()
        .flatten()
        .map(|message| message.trim().to_string())
        .find(|message| !message.is_empty())
    }
}

/// One-line summary of a GoTrue or PostgREST error response.
pub(crate) fn describe_api_error(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| compact_text(body));

    if message.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{message} ({})", status.as_u16())
    }
}
