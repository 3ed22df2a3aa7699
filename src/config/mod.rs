use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::{
    core::utils::{ensure_dir, PathResolver},
    ledger::seed,
    storage::json_backend::{tmp_path, write_atomic},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Runtime settings. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub active_outlet: String,
    /// Source account used when a posting names none.
    pub default_cash_account: String,
    pub retained_earnings_account: String,
    pub search_limit: usize,
    pub recent_limit: usize,
    pub backup_retention: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_outlet: "main".into(),
            default_cash_account: seed::CASH.into(),
            retained_earnings_account: seed::RETAINED_EARNINGS.into(),
            search_limit: 50,
            recent_limit: 10,
            backup_retention: 5,
            data_root: None,
            log_filter: None,
        }
    }
}

impl Config {
    /// Directory holding outlet documents: `data_root` when set, otherwise
    /// the application data directory.
    pub fn resolve_data_root(&self) -> PathBuf {
        PathResolver::resolve_base(self.data_root.clone())
    }
}

/// Loads and saves [`Config`] as pretty JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Manager for `<base>/config/config.json`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        ensure_dir(&base)?;
        Ok(Self::new(PathResolver::config_file_in(&base)))
    }

    pub fn new_default() -> Result<Self, ConfigError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
