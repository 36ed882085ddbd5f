//! Client configuration.
//!
//! Loaded from a JSON file, then overlaid by `CARDSYNC_*` environment
//! variables. Only public values belong here: the Supabase anon key is safe
//! to ship, user credentials are not.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const ENV_SUPABASE_URL: &str = "CARDSYNC_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "CARDSYNC_SUPABASE_ANON_KEY";
pub const ENV_DB_PATH: &str = "CARDSYNC_DB_PATH";

const DEFAULT_CARDS_TABLE: &str = "cards";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CardsyncConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default = "default_cards_table")]
    pub cards_table: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Default for CardsyncConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            cards_table: default_cards_table(),
            request_timeout_secs: default_request_timeout_secs(),
            db_path: None,
        }
    }
}

/// Endpoint and public key of a Supabase project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
}

impl CardsyncConfig {
    /// Read the config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|error| {
                Error::InvalidInput(format!("Invalid config file {}: {error}", path.display()))
            }),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(error.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Overlay values from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`; unset or blank variables keep the file value.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = normalize_text_option(lookup(ENV_SUPABASE_URL)) {
            self.supabase_url = Some(url);
        }
        if let Some(anon_key) = normalize_text_option(lookup(ENV_SUPABASE_ANON_KEY)) {
            self.supabase_anon_key = Some(anon_key);
        }
        if let Some(db_path) = normalize_text_option(lookup(ENV_DB_PATH)) {
            self.db_path = Some(PathBuf::from(db_path));
        }
        self
    }

    /// Trim values, drop empties and validate what is left.
    pub fn normalized(mut self) -> Result<Self> {
        self.supabase_url = normalize_text_option(self.supabase_url)
            .map(|url| url.trim_end_matches('/').to_string());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key);
        self.cards_table = normalize_text_option(Some(self.cards_table))
            .unwrap_or_else(default_cards_table);

        if let Some(url) = &self.supabase_url {
            if !is_http_url(url) {
                return Err(Error::InvalidInput(
                    "supabase_url must include http:// or https://".to_string(),
                ));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    /// Supabase settings, `None` when neither value is set.
    ///
    /// Setting only one of the two is a configuration error.
    pub fn supabase(&self) -> Result<Option<SupabaseSettings>> {
        let url = normalize_text_option(self.supabase_url.clone());
        let anon_key = normalize_text_option(self.supabase_anon_key.clone());

        match (url, anon_key) {
            (None, None) => Ok(None),
            (Some(url), Some(anon_key)) => Ok(Some(SupabaseSettings { url, anon_key })),
            (Some(_), None) => Err(Error::InvalidInput(
                "supabase_anon_key is required when supabase_url is set".to_string(),
            )),
            (None, Some(_)) => Err(Error::InvalidInput(
                "supabase_url is required when supabase_anon_key is set".to_string(),
            )),
        }
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_cards_table() -> String {
    DEFAULT_CARDS_TABLE.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CardsyncConfig::load(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, CardsyncConfig::default());
        assert_eq!(config.cards_table, "cards");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = CardsyncConfig {
            supabase_url: Some("https://demo.supabase.co".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            ..Default::default()
        };

        config.save(&path).unwrap();

        assert_eq!(CardsyncConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "turso_url": "libsql://x" }"#).unwrap();

        let error = CardsyncConfig::load(&path).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let env = HashMap::from([
            (ENV_SUPABASE_URL, "https://env.supabase.co"),
            (ENV_SUPABASE_ANON_KEY, "   "),
            (ENV_DB_PATH, "/tmp/cards.db"),
        ]);
        let config = CardsyncConfig {
            supabase_url: Some("https://file.supabase.co".to_string()),
            supabase_anon_key: Some("file-key".to_string()),
            ..Default::default()
        }
        .with_overrides(|name| env.get(name).map(ToString::to_string));

        assert_eq!(
            config.supabase_url.as_deref(),
            Some("https://env.supabase.co")
        );
        assert_eq!(config.supabase_anon_key.as_deref(), Some("file-key"));
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/cards.db")));
    }

    #[test]
    fn normalized_trims_and_validates() {
        let config = CardsyncConfig {
            supabase_url: Some(" https://demo.supabase.co/ ".to_string()),
            supabase_anon_key: Some("  ".to_string()),
            cards_table: " ".to_string(),
            ..Default::default()
        }
        .normalized()
        .unwrap();

        assert_eq!(
            config.supabase_url.as_deref(),
            Some("https://demo.supabase.co")
        );
        assert_eq!(config.supabase_anon_key, None);
        assert_eq!(config.cards_table, "cards");

        let bad = CardsyncConfig {
            supabase_url: Some("demo.supabase.co".to_string()),
            ..Default::default()
        };
        assert!(bad.normalized().is_err());
    }

    #[test]
    fn supabase_requires_both_values() {
        let none = CardsyncConfig::default();
        assert_eq!(none.supabase().unwrap(), None);

        let half = CardsyncConfig {
            supabase_url: Some("https://demo.supabase.co".to_string()),
            ..Default::default()
        };
        assert!(half.supabase().is_err());

        let full = CardsyncConfig {
            supabase_anon_key: Some("anon".to_string()),
            ..half
        };
        assert_eq!(
            full.supabase().unwrap(),
            Some(SupabaseSettings {
                url: "https://demo.supabase.co".to_string(),
                anon_key: "anon".to_string(),
            })
        );
    }
}
