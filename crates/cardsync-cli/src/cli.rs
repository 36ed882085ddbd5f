use std::path::PathBuf;

use cardsync_core::models::{Rarity, Role};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "cardsync")]
#[command(about = "Offline-first card catalog synced with Supabase")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Treat the network as unreachable; changes are only queued
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new card
    #[command(alias = "new")]
    Add {
        /// Card name
        name: Vec<String>,
        #[command(flatten)]
        stats: CardStats,
        /// Mark the card as a favorite
        #[arg(long)]
        favorite: bool,
    },
    /// List local cards, most recently modified first
    List {
        /// Only show cards with unsynced local changes
        #[arg(long)]
        pending: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing card
    Edit {
        /// Card ID or unique ID prefix
        id: String,
        /// New card name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        stats: CardStatsUpdate,
    },
    /// Toggle the favorite flag of a card
    Favorite {
        /// Card ID or unique ID prefix
        id: String,
    },
    /// Delete an existing card
    Delete {
        /// Card ID or unique ID prefix
        id: String,
    },
    /// Push queued changes and refresh local cards
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Inspect or reset the queue of unsynced changes
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
    /// Authenticate with Supabase
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CardStats {
    /// common, rare, epic or legendary
    #[arg(long, default_value = "common", value_parser = parse_rarity)]
    pub rarity: Rarity,
    /// Elixir cost
    #[arg(long, default_value_t = 3)]
    pub elixir: i64,
    /// troop, spell or building
    #[arg(long, default_value = "troop", value_parser = parse_role)]
    pub role: Role,
    #[arg(long, default_value_t = 0)]
    pub hitpoints: i64,
    #[arg(long, default_value_t = 0)]
    pub damage: i64,
    /// Arena where the card unlocks
    #[arg(long, default_value_t = 0)]
    pub arena: i64,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CardStatsUpdate {
    #[arg(long, value_parser = parse_rarity)]
    pub rarity: Option<Rarity>,
    #[arg(long)]
    pub elixir: Option<i64>,
    #[arg(long, value_parser = parse_role)]
    pub role: Option<Role>,
    #[arg(long)]
    pub hitpoints: Option<i64>,
    #[arg(long)]
    pub damage: Option<i64>,
    #[arg(long)]
    pub arena: Option<i64>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show sync state without syncing
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// List queued changes in replay order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Discard every queued change
    Clear {
        /// Confirm discarding unsynced changes
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the config file
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Remote table holding the cards
        #[arg(long, value_name = "NAME")]
        cards_table: Option<String>,
        /// Per-request timeout in seconds
        #[arg(long, value_name = "SECS")]
        request_timeout_secs: Option<u64>,
    },
    /// Print the effective configuration
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create a Supabase account; signs in when no email confirmation is needed
    Signup {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Login with Supabase email/password and store the session
    Login {
        /// Supabase account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Supabase account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show who is signed in
    Status,
    /// Logout and clear the stored session
    Logout,
}

fn parse_rarity(value: &str) -> Result<Rarity, String> {
    value.parse::<Rarity>().map_err(|error| error.to_string())
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse::<Role>().map_err(|error| error.to_string())
}
