use crate::error::AppError;
use crate::storage::backup::BackupPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "planner";
const CONFIG_FILE_NAME: &str = "config.json";
const STORE_FILE_NAME: &str = "tasks.csv";
const BACKUP_DIR_NAME: &str = "backups";
const CONFIG_ENV_VAR: &str = "PLANNER_CONFIG_PATH";
const STORE_ENV_VAR: &str = "PLANNER_STORE_PATH";

pub const DEFAULT_BACKUP_KEEP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Defaults to a `backups` directory next to the store.
    pub dir: Option<PathBuf>,
    pub keep: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            keep: DEFAULT_BACKUP_KEEP,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub backup: BackupConfig,
}

impl Config {
    /// The configured store file, or `tasks.csv` in the app directory.
    pub fn resolved_store_path(&self) -> Result<PathBuf, AppError> {
        match self.store_path.as_ref() {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dir()?.join(STORE_FILE_NAME)),
        }
    }

    pub fn backup_policy(&self, store_path: &Path) -> Option<BackupPolicy> {
        if !self.backup.enabled || self.backup.keep == 0 {
            return None;
        }

        let dir = match self.backup.dir.as_ref() {
            Some(dir) => dir.clone(),
            None => store_path
                .parent()
                .map(|parent| parent.join(BACKUP_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from(BACKUP_DIR_NAME)),
        };

        Some(BackupPolicy {
            dir,
            keep: self.backup.keep,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub store_path: Option<PathBuf>,
    pub backup_enabled: Option<bool>,
    pub backup_dir: Option<PathBuf>,
    pub backup_keep: Option<usize>,
}

fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the config file, falling back to defaults when it is unreadable.
/// `PLANNER_STORE_PATH` takes precedence over the file's `store_path`.
pub fn load_config_with_fallback() -> ConfigLoad {
    let mut load = match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    };
    load.config = apply_store_env(load.config);
    load
}

fn apply_store_env(config: Config) -> Config {
    with_store_override(config, std::env::var(STORE_ENV_VAR).ok())
}

fn with_store_override(mut config: Config, value: Option<String>) -> Config {
    if let Some(path) = value
        && !path.trim().is_empty()
    {
        config.store_path = Some(PathBuf::from(path));
    }
    config
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(path) = overrides.store_path.as_ref() {
        merged.store_path = Some(path.clone());
    }
    if let Some(enabled) = overrides.backup_enabled {
        merged.backup.enabled = enabled;
    }
    if let Some(dir) = overrides.backup_dir.as_ref() {
        merged.backup.dir = Some(dir.clone());
    }
    if let Some(keep) = overrides.backup_keep {
        merged.backup.keep = keep;
    }
    merged
}
