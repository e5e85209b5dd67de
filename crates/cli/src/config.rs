//! CLI configuration
//!
//! TOML file under `$KEEPSAKE_HOME` (or the platform config directory),
//! covering the sync timing knobs and the store location.

use anyhow::{bail, Context, Result};
use keepsake_draft::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepsakeConfig {
    pub sync: SyncConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay after the last edit before an automatic save (ms)
    pub debounce_delay_ms: u64,
    /// Window after session open during which edits are treated as
    /// programmatic population (ms)
    pub suppression_window_ms: u64,
    /// Bound on how long closing a session may block per flush phase (ms)
    pub close_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store directory; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: 2000,
            suppression_window_ms: 500,
            close_timeout_ms: 5000,
        }
    }
}

impl Default for KeepsakeConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl KeepsakeConfig {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60_000).contains(&self.sync.debounce_delay_ms) {
            bail!("sync.debounce_delay_ms must be between 100 and 60000");
        }
        if self.sync.suppression_window_ms > 10_000 {
            bail!("sync.suppression_window_ms must be at most 10000");
        }
        if !(500..=120_000).contains(&self.sync.close_timeout_ms) {
            bail!("sync.close_timeout_ms must be between 500 and 120000");
        }
        Ok(())
    }

    /// Session timing for an interactive edit
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            debounce_delay: Duration::from_millis(self.sync.debounce_delay_ms),
            suppression_window: Duration::from_millis(self.sync.suppression_window_ms),
        }
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.sync.close_timeout_ms)
    }

    /// Store directory, configured or platform default
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store.path {
            return Ok(path.clone());
        }
        Ok(keepsake_home()?.join("journal"))
    }
}

/// Base directory: `$KEEPSAKE_HOME`, or `<config dir>/keepsake`
pub fn keepsake_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("KEEPSAKE_HOME") {
        return Ok(PathBuf::from(home));
    }
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("keepsake"))
}

pub fn config_file_path() -> Result<PathBuf> {
    Ok(keepsake_home()?.join("config.toml"))
}

/// Load configuration, falling back to defaults when the file is absent
pub fn load() -> Result<KeepsakeConfig> {
    let path = config_file_path()?;
    if !path.exists() {
        return Ok(KeepsakeConfig::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let config: KeepsakeConfig = toml::from_str(&content).context("Failed to parse config")?;
    config.validate()?;
    Ok(config)
}

pub fn save(config: &KeepsakeConfig) -> Result<()> {
    config.validate()?;
    let path = config_file_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(())
}
