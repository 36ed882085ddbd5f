use crate::cli::QueueCommands;
use crate::commands::common::{
    format_intent_lines, intent_to_list_item, AppContext, GlobalArgs, IntentListItem, NetworkMode,
};
use crate::error::CliError;

pub async fn run_queue(command: QueueCommands, global: &GlobalArgs) -> Result<(), CliError> {
    let ctx = AppContext::open(global, NetworkMode::LocalOnly).await?;

    match command {
        QueueCommands::List { json } => {
            let intents = ctx.catalog.queued_intents().await?;
            if json {
                let json_items = intents
                    .iter()
                    .map(intent_to_list_item)
                    .collect::<Vec<IntentListItem>>();
                println!("{}", serde_json::to_string_pretty(&json_items)?);
            } else if intents.is_empty() {
                println!("Queue is empty.");
            } else {
                for line in format_intent_lines(&intents) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        QueueCommands::Clear { yes } => {
            if !yes {
                return Err(CliError::ConfirmationRequired);
            }
            let discarded = ctx.catalog.queued_intents().await?.len();
            ctx.catalog.clear_queue().await?;
            println!("Discarded {discarded} queued change(s)");
            Ok(())
        }
    }
}
