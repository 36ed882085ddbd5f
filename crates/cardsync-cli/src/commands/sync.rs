use cardsync_core::{CatalogStatus, SyncOutcome};
use serde::Serialize;

use crate::commands::common::{describe_outcome, AppContext, GlobalArgs, NetworkMode};
use crate::error::CliError;

pub async fn run_sync(global: &GlobalArgs) -> Result<(), CliError> {
    let ctx = AppContext::open(global, NetworkMode::MaySync).await?;
    let outcome = ctx.catalog.trigger_sync().await?;

    let message = describe_outcome(&outcome);
    match outcome {
        SyncOutcome::Stopped { .. } | SyncOutcome::ReconcileFailed { .. } => {
            Err(CliError::Remote(message))
        }
        SyncOutcome::Skipped(_) | SyncOutcome::Completed { .. } => {
            println!("{message}");
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SyncStatusItem {
    pub phase: String,
    pub connected: bool,
    pub signed_in_as: Option<String>,
    pub pending_cards: usize,
    pub queued_changes: usize,
    pub queue_resets: u64,
}

impl From<&CatalogStatus> for SyncStatusItem {
    fn from(status: &CatalogStatus) -> Self {
        Self {
            phase: status.phase.to_string(),
            connected: status.connected,
            signed_in_as: status.signed_in_as.clone(),
            pending_cards: status.pending_cards,
            queued_changes: status.queued_intents,
            queue_resets: status.queue_resets,
        }
    }
}

pub fn format_status_lines(status: &SyncStatusItem) -> Vec<String> {
    vec![
        format!("phase:          {}", status.phase),
        format!(
            "network:        {}",
            if status.connected { "online" } else { "offline" }
        ),
        format!(
            "signed in as:   {}",
            status.signed_in_as.as_deref().unwrap_or("(nobody)")
        ),
        format!("pending cards:  {}", status.pending_cards),
        format!("queued changes: {}", status.queued_changes),
        format!("queue resets:   {}", status.queue_resets),
    ]
}

pub async fn run_sync_status(as_json: bool, global: &GlobalArgs) -> Result<(), CliError> {
    let ctx = AppContext::open(global, NetworkMode::MaySync).await?;
    let status = SyncStatusItem::from(&ctx.catalog.status().await?);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    for line in format_status_lines(&status) {
        println!("{line}");
    }
    Ok(())
}
