use crate::commands::common::{AppContext, GlobalArgs, NetworkMode};
use crate::error::CliError;

pub async fn run_favorite(id: &str, global: &GlobalArgs) -> Result<(), CliError> {
    let ctx = AppContext::open(global, NetworkMode::MaySync).await?;
    let card = ctx.resolve_card(id).await?;

    let updated = ctx.catalog.toggle_favorite(&card.id()).await?;
    let state = if updated.fields().is_favorite {
        "Favorited"
    } else {
        "Unfavorited"
    };
    println!("{state} {}", updated.fields().name);
    ctx.report_unsynced().await
}
