use cardsync_core::auth::SignUpOutcome;
use chrono::DateTime;

use crate::auth::{clear_stored_session, load_stored_session, SupabaseAuthService};
use crate::cli::AuthCommands;
use crate::commands::common::{resolve_settings, GlobalArgs};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global: &GlobalArgs) -> Result<(), CliError> {
    let (config, paths) = resolve_settings(global)?;

    match command {
        AuthCommands::Signup { email, password } => {
            let service = SupabaseAuthService::from_config(&config, &paths.session)?
                .ok_or(CliError::SupabaseNotConfigured)?;
            let outcome = service
                .sign_up(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            println!("{}", describe_sign_up(&outcome, &email));
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let service = SupabaseAuthService::from_config(&config, &paths.session)?
                .ok_or(CliError::SupabaseNotConfigured)?;
            let session = service
                .sign_in(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in as {email_label}");
            Ok(())
        }
        AuthCommands::Status => {
            let Some(session) = load_stored_session(&paths.session)? else {
                println!("Not signed in.");
                return Ok(());
            };
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            let expires = DateTime::from_timestamp(session.expires_at, 0)
                .map_or_else(|| session.expires_at.to_string(), |at| at.to_rfc3339());
            let state = if session.is_expired() {
                "expired, refreshed on next sync"
            } else {
                "valid"
            };
            println!("Signed in as {email_label} (user {})", session.user.id);
            println!("Session {state}; expires at {expires}");
            Ok(())
        }
        AuthCommands::Logout => {
            let stored_session = load_stored_session(&paths.session)?;
            let service = SupabaseAuthService::from_config(&config, &paths.session)?;

            if let (Some(service), Some(session), false) =
                (service, stored_session, global.offline)
            {
                if let Err(error) = service.sign_out(&session.access_token).await {
                    tracing::warn!("Remote sign-out failed, forgetting session locally: {}", error);
                }
            }
            clear_stored_session(&paths.session)?;

            println!("Signed out");
            Ok(())
        }
    }
}

#[must_use]
pub fn describe_sign_up(outcome: &SignUpOutcome, email: &str) -> String {
    match outcome {
        SignUpOutcome::SignedIn(session) => format!(
            "Signed up and signed in as {}",
            session.user.email.as_deref().unwrap_or(email)
        ),
        SignUpOutcome::ConfirmationPending => format!(
            "Check {} for a confirmation link, then run `cardsync auth login`",
            email.trim()
        ),
    }
}
