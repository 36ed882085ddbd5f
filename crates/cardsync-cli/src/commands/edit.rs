use cardsync_core::CardFields;

use crate::cli::CardStatsUpdate;
use crate::commands::common::{AppContext, GlobalArgs, NetworkMode};
use crate::error::CliError;

/// Apply the flags that were given on top of the current fields.
pub fn merge_card_fields(
    current: &CardFields,
    name: Option<&str>,
    stats: &CardStatsUpdate,
) -> Result<CardFields, CliError> {
    let name = match name {
        Some(name) if name.trim().is_empty() => return Err(CliError::EmptyName),
        Some(name) => name.trim().to_string(),
        None => current.name.clone(),
    };

    Ok(CardFields {
        name,
        rarity: stats.rarity.unwrap_or(current.rarity),
        elixir_cost: stats.elixir.unwrap_or(current.elixir_cost),
        role: stats.role.unwrap_or(current.role),
        hitpoints: stats.hitpoints.unwrap_or(current.hitpoints),
        damage: stats.damage.unwrap_or(current.damage),
        arena: stats.arena.unwrap_or(current.arena),
        is_favorite: current.is_favorite,
    })
}

pub async fn run_edit(
    id: &str,
    name: Option<&str>,
    stats: &CardStatsUpdate,
    global: &GlobalArgs,
) -> Result<(), CliError> {
    let ctx = AppContext::open(global, NetworkMode::MaySync).await?;
    let card = ctx.resolve_card(id).await?;

    let fields = merge_card_fields(card.fields(), name, stats)?;
    if &fields == card.fields() {
        println!("{}", card.id());
        return Ok(());
    }

    let updated = ctx.catalog.update_card(&card.id(), fields).await?;
    println!("{}", updated.id());
    ctx.report_unsynced().await
}
