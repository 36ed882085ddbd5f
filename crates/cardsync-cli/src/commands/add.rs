use cardsync_core::CardFields;

use crate::cli::CardStats;
use crate::commands::common::{AppContext, GlobalArgs, NetworkMode};
use crate::error::CliError;

pub fn card_fields_from_args(
    name_parts: &[String],
    stats: &CardStats,
    favorite: bool,
) -> Result<CardFields, CliError> {
    let name = name_parts.join(" ").trim().to_string();
    if name.is_empty() {
        return Err(CliError::EmptyName);
    }

    Ok(CardFields {
        name,
        rarity: stats.rarity,
        elixir_cost: stats.elixir,
        role: stats.role,
        hitpoints: stats.hitpoints,
        damage: stats.damage,
        arena: stats.arena,
        is_favorite: favorite,
    })
}

pub async fn run_add(
    name_parts: &[String],
    stats: &CardStats,
    favorite: bool,
    global: &GlobalArgs,
) -> Result<(), CliError> {
    let fields = card_fields_from_args(name_parts, stats, favorite)?;

    let ctx = AppContext::open(global, NetworkMode::MaySync).await?;
    let card = ctx.catalog.create_card(fields).await?;

    println!("{}", card.id());
    ctx.report_unsynced().await
}
