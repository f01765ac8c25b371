use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::session::IDLE_TIMEOUT_MS;
use crate::time_series::DEFAULT_WINDOW_MS;

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_TARGET_WPM: u64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub idle_timeout_ms: u64,
    pub refresh_interval_ms: u64,
    pub smoothing_window_ms: u64,
    pub target_wpm: u64,
    pub log_level: String,
    /// Overrides the stats record location
    pub data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout_ms: IDLE_TIMEOUT_MS,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            smoothing_window_ms: DEFAULT_WINDOW_MS,
            target_wpm: DEFAULT_TARGET_WPM,
            log_level: "info".to_string(),
            data_file: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_ms == 0 {
            return Err(Error::Config("idle_timeout_ms must be positive".into()));
        }
        if self.refresh_interval_ms == 0 {
            return Err(Error::Config("refresh_interval_ms must be positive".into()));
        }
        if self.target_wpm == 0 {
            return Err(Error::Config("target_wpm must be positive".into()));
        }
        Ok(())
    }

    pub fn stats_path(&self) -> PathBuf {
        self.data_file.clone().unwrap_or_else(AppDirs::stats_path)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };

        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => match cfg.validate() {
                Ok(()) => cfg,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "ignoring invalid config");
                    Config::default()
                }
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not parse config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
