//! Application configuration for Whatson.
//!
//! User config lives at `~/.whatson/whatson.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WhatsonError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "whatson.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".whatson";

// ---------------------------------------------------------------------------
// Config structs (matching whatson.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Lifecycle sweeper settings.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Scheduled-run settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Source adapter settings.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// City assigned to candidates whose source omits one.
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Maximum summary length derived from a description.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Catalog database path.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            default_city: default_city(),
            summary_max_chars: default_summary_max_chars(),
            db_path: default_db_path(),
        }
    }
}

fn default_city() -> String {
    "Sydney".into()
}
fn default_summary_max_chars() -> usize {
    200
}
fn default_db_path() -> String {
    "~/.whatson/whatson.db".into()
}

/// `[sweep]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Records not seen by ingestion for this many days are retired.
    #[serde(default = "default_staleness_days")]
    pub staleness_days: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            staleness_days: default_staleness_days(),
        }
    }
}

fn default_staleness_days() -> i64 {
    30
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Hours between scheduled ingestion runs.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
        }
    }
}

fn default_interval_hours() -> u64 {
    6
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Source adapters to run, by name.
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<String>,

    /// Use the deterministic fixture adapter instead of live sources.
    #[serde(default)]
    pub use_fixture: bool,

    /// Listing URL overrides (defaults baked into each adapter).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eventbrite_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eventfinda_url: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_sources(),
            use_fixture: false,
            eventbrite_url: None,
            facebook_url: None,
            eventfinda_url: None,
        }
    }
}

fn default_enabled_sources() -> Vec<String> {
    vec!["eventbrite".into(), "facebook".into(), "eventfinda".into()]
}

// ---------------------------------------------------------------------------
// Ingest options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime options consumed by the normalizer and sweeper.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// City assigned when a candidate has none.
    pub default_city: String,
    /// Summary truncation bound, in characters.
    pub summary_max_chars: usize,
    /// Staleness retirement window, in days.
    pub staleness_days: i64,
}

impl From<&AppConfig> for IngestOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_city: config.defaults.default_city.clone(),
            summary_max_chars: config.defaults.summary_max_chars,
            staleness_days: config.sweep.staleness_days,
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.whatson/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| WhatsonError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.whatson/whatson.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WhatsonError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| WhatsonError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| WhatsonError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WhatsonError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| WhatsonError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

impl AppConfig {
    /// Resolve the catalog database path, expanding a leading `~`.
    pub fn db_path(&self) -> Result<PathBuf> {
        let raw = &self.defaults.db_path;
        if let Some(rest) = raw.strip_prefix("~/") {
            let home = dirs::home_dir()
                .ok_or_else(|| WhatsonError::config("could not determine home directory"))?;
            return Ok(home.join(rest));
        }
        Ok(PathBuf::from(raw))
    }
}
