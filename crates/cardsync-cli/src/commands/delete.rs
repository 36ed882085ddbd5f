use crate::commands::common::{AppContext, GlobalArgs, NetworkMode};
use crate::error::CliError;

pub async fn run_delete(id: &str, global: &GlobalArgs) -> Result<(), CliError> {
    let ctx = AppContext::open(global, NetworkMode::MaySync).await?;
    let card = ctx.resolve_card(id).await?;

    ctx.catalog.delete_card(&card.id()).await?;
    println!("Deleted {}", card.id());
    ctx.report_unsynced().await
}
