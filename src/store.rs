use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::language_stats::LanguageStat;

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    /// Milliseconds of active typing across all closed sessions
    #[serde(default)]
    pub total_active_time: u64,
    #[serde(default)]
    pub language_stats: BTreeMap<String, LanguageStat>,
}

pub trait StatsStore {
    /// Never fails: a missing or unreadable record loads as the default.
    fn load(&self) -> StatsRecord;
    fn save(&self, record: &StatsRecord) -> Result<()>;
    /// Removes the record. A record that does not exist is not an error.
    fn erase(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StatsStore for FileStatsStore {
    fn load(&self) -> StatsRecord {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stats record yet");
                return StatsRecord::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read stats record");
                return StatsRecord::default();
            }
        };

        match serde_json::from_slice::<StatsRecord>(&bytes) {
            Ok(record) => {
                info!(total_active_ms = record.total_active_time, "loaded previous time");
                record
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not parse stats record");
                StatsRecord::default()
            }
        }
    }

    fn save(&self, record: &StatsRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(record)?;

        // Write beside the record then swap it in, so a crash mid-write leaves
        // the previous record intact.
        let tmp = self.temp_path();
        fs::write(&tmp, data)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
