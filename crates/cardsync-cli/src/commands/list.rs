use crate::commands::common::{
    card_to_list_item, format_card_lines, AppContext, CardListItem, GlobalArgs, NetworkMode,
};
use crate::error::CliError;

pub async fn run_list(pending_only: bool, as_json: bool, global: &GlobalArgs) -> Result<(), CliError> {
    let ctx = AppContext::open(global, NetworkMode::LocalOnly).await?;
    let mut cards = ctx.catalog.current_cards().await?;
    if pending_only {
        cards.retain(|card| card.pending);
    }

    if as_json {
        let json_items = cards
            .iter()
            .map(card_to_list_item)
            .collect::<Vec<CardListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if cards.is_empty() {
        println!("No cards yet.");
        return Ok(());
    }

    for line in format_card_lines(&cards) {
        println!("{line}");
    }
    Ok(())
}
