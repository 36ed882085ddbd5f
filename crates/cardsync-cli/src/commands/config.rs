use cardsync_core::config::CardsyncConfig;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::commands::common::{resolve_config_path, resolve_settings, GlobalArgs};
use crate::error::CliError;

/// Values passed to `config init`; `None` keeps what the file already has.
#[derive(Debug, Clone, Default)]
pub struct ConfigInitArgs {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub cards_table: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

pub fn run_config(command: ConfigCommands, global: &GlobalArgs) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            cards_table,
            request_timeout_secs,
        } => run_config_init(
            ConfigInitArgs {
                supabase_url,
                supabase_anon_key,
                cards_table,
                request_timeout_secs,
            },
            global,
        ),
        ConfigCommands::Show => run_config_show(global),
    }
}

pub fn merge_config_init(
    existing: CardsyncConfig,
    args: ConfigInitArgs,
) -> Result<CardsyncConfig, CliError> {
    let mut config = existing;
    if let Some(url) = args.supabase_url {
        config.supabase_url = Some(url);
    }
    if let Some(anon_key) = args.supabase_anon_key {
        config.supabase_anon_key = Some(anon_key);
    }
    if let Some(table) = args.cards_table {
        config.cards_table = table;
    }
    if let Some(secs) = args.request_timeout_secs {
        config.request_timeout_secs = secs;
    }

    let config = config
        .normalized()
        .map_err(|error| CliError::Config(error.to_string()))?;
    config
        .supabase()
        .map_err(|error| CliError::Config(error.to_string()))?;
    Ok(config)
}

fn run_config_init(args: ConfigInitArgs, global: &GlobalArgs) -> Result<(), CliError> {
    let path = resolve_config_path(global.config_path.clone());
    // The file on disk only; env overrides are not persisted.
    let existing = CardsyncConfig::load(&path)?;
    let config = merge_config_init(existing, args)?;
    config.save(&path)?;

    println!("Config written to {}", path.display());
    if config.supabase_url.is_none() {
        println!("Supabase is not configured yet; cards stay local until it is.");
    } else {
        println!("Run `cardsync auth login --email <email> --password <password>` to start syncing.");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ConfigView<'a> {
    config_path: String,
    db_path: String,
    session_path: String,
    #[serde(flatten)]
    config: &'a CardsyncConfig,
}

fn run_config_show(global: &GlobalArgs) -> Result<(), CliError> {
    let (config, paths) = resolve_settings(global)?;
    let view = ConfigView {
        config_path: paths.config.display().to_string(),
        db_path: paths.db.display().to_string(),
        session_path: paths.session.display().to_string(),
        config: &config,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
