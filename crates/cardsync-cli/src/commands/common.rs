use std::env;
use std::path::{Path, PathBuf};

use cardsync_core::config::CardsyncConfig;
use cardsync_core::db::{Database, LibSqlCardStore, LibSqlKeyValueStore};
use cardsync_core::gate::{Gate, NetworkMonitor, NetworkStatus, SharedSession};
use cardsync_core::models::{Card, CardId, IntentAction, MutationIntent};
use cardsync_core::queue::MutationQueue;
use cardsync_core::remote::{
    CardInsert, CardPatch, RemoteCardStore, RemoteError, RemoteResult, SupabaseCardsClient,
};
use cardsync_core::{Catalog, LocalCard, SkipReason, SyncOrchestrator, SyncOutcome};
use chrono::Utc;
use serde::Serialize;

use crate::auth::{load_stored_session, resolve_session, SupabaseAuthService};
use crate::error::CliError;

pub type CliCatalog = Catalog<LibSqlCardStore, LibSqlKeyValueStore, CliRemote>;

/// Flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub offline: bool,
}

/// Whether a command may talk to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMode {
    /// Read-only local commands; never checks reachability or refreshes
    LocalOnly,
    /// Commands that may sync
    MaySync,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config: PathBuf,
    pub db: PathBuf,
    pub session: PathBuf,
}

/// Remote store as seen by the CLI: Supabase when configured.
#[derive(Clone)]
pub enum CliRemote {
    Supabase(SupabaseCardsClient),
    Unconfigured,
}

fn unconfigured() -> RemoteError {
    RemoteError::Api("Supabase is not configured".to_string())
}

impl RemoteCardStore for CliRemote {
    async fn create(&self, card: &CardInsert) -> RemoteResult<Card> {
        match self {
            Self::Supabase(client) => client.create(card).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn update(&self, id: &CardId, patch: &CardPatch) -> RemoteResult<Card> {
        match self {
            Self::Supabase(client) => client.update(id, patch).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn delete(&self, id: &CardId) -> RemoteResult<()> {
        match self {
            Self::Supabase(client) => client.delete(id).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn list(&self) -> RemoteResult<Vec<Card>> {
        match self {
            Self::Supabase(client) => client.list().await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }
}

/// Everything a command needs, wired from config, the local database and the
/// stored session.
pub struct AppContext {
    pub paths: Paths,
    pub config: CardsyncConfig,
    pub network: NetworkMonitor,
    pub catalog: CliCatalog,
}

impl AppContext {
    pub async fn open(global: &GlobalArgs, mode: NetworkMode) -> Result<Self, CliError> {
        let (config, paths) = resolve_settings(global)?;

        let db = Database::open(&paths.db).await?.into_shared();
        let auth = SupabaseAuthService::from_config(&config, &paths.session)?;

        let network = NetworkMonitor::new(NetworkStatus::offline());
        let may_check = mode == NetworkMode::MaySync && !global.offline;
        if let (true, Some(settings)) = (may_check, config.supabase()?) {
            let health_url = format!("{}/auth/v1/health", settings.url);
            network.check_reachability(&health_url, config.request_timeout()).await;
        }

        let session = if network.status().connected {
            resolve_session(auth.as_ref()).await?
        } else {
            load_stored_session(&paths.session)?
        };
        let session = SharedSession::new(session);

        let remote = match config.supabase()? {
            Some(settings) => CliRemote::Supabase(
                SupabaseCardsClient::new(
                    &settings.url,
                    &settings.anon_key,
                    &config.cards_table,
                    config.request_timeout(),
                    session.clone(),
                )
                .map_err(|error| CliError::Remote(error.to_string()))?,
            ),
            None => CliRemote::Unconfigured,
        };

        let store = LibSqlCardStore::new(db.clone());
        let queue = MutationQueue::new(LibSqlKeyValueStore::new(db));
        let gate = Gate::new(network.clone(), session);
        let sync = SyncOrchestrator::new(store.clone(), queue.clone(), remote, gate);
        let catalog =
            Catalog::new(store, queue, sync).with_auto_sync(mode == NetworkMode::MaySync);

        Ok(Self {
            paths,
            config,
            network,
            catalog,
        })
    }

    /// Resolve a card by full id or unique id prefix.
    pub async fn resolve_card(&self, query: &str) -> Result<LocalCard, CliError> {
        let query = normalize_card_identifier(query)?;
        if let Ok(id) = query.parse::<CardId>() {
            if let Some(card) = self.catalog.find_card(&id).await? {
                return Ok(card);
            }
        }

        let cards = self.catalog.current_cards().await?;
        resolve_card_prefix(&query, &cards).cloned()
    }

    /// Tell the user about changes still waiting for the remote store.
    pub async fn report_unsynced(&self) -> Result<(), CliError> {
        let queued = self.catalog.queued_intents().await?.len();
        if queued > 0 {
            eprintln!("{queued} change(s) waiting to sync");
        }
        Ok(())
    }
}

/// Effective config (file plus env overlay) and the paths derived from it.
pub fn resolve_settings(global: &GlobalArgs) -> Result<(CardsyncConfig, Paths), CliError> {
    let config_path = resolve_config_path(global.config_path.clone());
    let config = load_config(&config_path)?;
    let paths = resolve_paths(config_path, global.db_path.clone(), &config);
    Ok((config, paths))
}

pub fn load_config(path: &Path) -> Result<CardsyncConfig, CliError> {
    Ok(CardsyncConfig::load(path)?
        .with_env_overrides()
        .normalized()?)
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> PathBuf {
    cli_config_path
        .or_else(|| env::var_os("CARDSYNC_CONFIG").map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cardsync")
        .join("config.json")
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cardsync")
        .join("cardsync.db")
}

/// `--db-path` wins over the config file (and its env overlay), then the
/// platform data dir. The session file lives next to the database.
pub fn resolve_paths(config: PathBuf, cli_db_path: Option<PathBuf>, cfg: &CardsyncConfig) -> Paths {
    let db = cli_db_path
        .or_else(|| cfg.db_path.clone())
        .unwrap_or_else(default_db_path);
    let session = db.with_extension("session.json");
    Paths {
        config,
        db,
        session,
    }
}

pub fn normalize_card_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyCardId)
    } else {
        Ok(trimmed.to_ascii_lowercase())
    }
}

pub fn resolve_card_prefix<'a>(
    query: &str,
    cards: &'a [LocalCard],
) -> Result<&'a LocalCard, CliError> {
    let matches = cards
        .iter()
        .filter(|card| card.id().to_string().starts_with(query))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(CliError::CardNotFound(query.to_string())),
        [card] => Ok(card),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|card| short_id(&card.id()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousCardId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &CardId) -> String {
    id.to_string().chars().take(13).collect()
}

#[derive(Debug, Serialize)]
pub struct CardListItem {
    pub id: String,
    pub name: String,
    pub rarity: String,
    pub elixir_cost: i64,
    pub role: String,
    pub hitpoints: i64,
    pub damage: i64,
    pub arena: i64,
    pub is_favorite: bool,
    pub pending: bool,
    pub created_at: String,
    pub updated_at: String,
    pub relative_time: String,
}

pub fn card_to_list_item(card: &LocalCard) -> CardListItem {
    let now_ms = Utc::now().timestamp_millis();
    let fields = card.fields();
    CardListItem {
        id: card.id().to_string(),
        name: fields.name.clone(),
        rarity: fields.rarity.to_string(),
        elixir_cost: fields.elixir_cost,
        role: fields.role.to_string(),
        hitpoints: fields.hitpoints,
        damage: fields.damage,
        arena: fields.arena,
        is_favorite: fields.is_favorite,
        pending: card.pending,
        created_at: card.card.created_at.to_rfc3339(),
        updated_at: card.card.updated_at.to_rfc3339(),
        relative_time: format_relative_time(card.card.updated_at.timestamp_millis(), now_ms),
    }
}

pub fn format_card_lines(cards: &[LocalCard]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    cards
        .iter()
        .map(|card| {
            let fields = card.fields();
            let name = truncate(&fields.name, 24);
            let markers = format!(
                "{}{}",
                if fields.is_favorite { '*' } else { ' ' },
                if card.pending { '~' } else { ' ' }
            );
            let relative_time =
                format_relative_time(card.card.updated_at.timestamp_millis(), now_ms);
            format!(
                "{:<13}  {markers}  {name:<24}  {:<9}  {:<8}  {:>2}e  {relative_time}",
                short_id(&card.id()),
                fields.rarity.as_str(),
                fields.role.as_str(),
                fields.elixir_cost,
            )
        })
        .collect()
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut truncated = text
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

#[derive(Debug, Serialize)]
pub struct IntentListItem {
    pub id: String,
    pub kind: String,
    pub card_id: String,
    pub card_name: Option<String>,
    pub created_at: String,
}

pub fn intent_to_list_item(intent: &MutationIntent) -> IntentListItem {
    let card_name = match &intent.action {
        IntentAction::Create(card) | IntentAction::Update(card) => Some(card.fields().name.clone()),
        IntentAction::Delete { .. } => None,
    };
    IntentListItem {
        id: intent.id.to_string(),
        kind: intent.kind().to_string(),
        card_id: intent.card_id().to_string(),
        card_name,
        created_at: intent.created_at.to_rfc3339(),
    }
}

pub fn format_intent_lines(intents: &[MutationIntent]) -> Vec<String> {
    intents
        .iter()
        .enumerate()
        .map(|(position, intent)| {
            let item = intent_to_list_item(intent);
            let label = item.card_name.unwrap_or_default();
            format!(
                "{:>3}. {:<6}  {}  {}",
                position + 1,
                item.kind,
                short_id(&intent.card_id()),
                label
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn describe_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Skipped(SkipReason::Offline) => {
            "Offline; changes stay queued until the network is back".to_string()
        }
        SyncOutcome::Skipped(SkipReason::Unauthenticated) => {
            "Not signed in; run `cardsync auth login` to sync".to_string()
        }
        SyncOutcome::Skipped(SkipReason::AlreadyRunning) => {
            "A sync is already running".to_string()
        }
        SyncOutcome::Completed {
            replayed,
            reconciled,
        } => format!("Sync completed: pushed {replayed} change(s), refreshed {reconciled} card(s)"),
        SyncOutcome::Stopped {
            replayed,
            remaining,
            error,
            ..
        } => format!(
            "Sync stopped after {replayed} change(s): {error}. {remaining} change(s) still queued"
        ),
        SyncOutcome::ReconcileFailed { replayed, error } => format!(
            "Pushed {replayed} change(s) but refreshing cards failed: {error}"
        ),
    }
}
