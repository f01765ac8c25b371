use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "codetime";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/codetime`, or the platform data dir without a HOME
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    pub fn stats_path() -> PathBuf {
        Self::state_dir().join("timeData.json")
    }

    pub fn log_dir() -> PathBuf {
        Self::state_dir()
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("codetime_config.json")
        }
    }
}
