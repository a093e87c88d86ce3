use crate::errors::ConfigError;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_CONFIG_FILE: &str = "cardwall.toml";

/// Settings read from `cardwall.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub board_file: PathBuf,
    pub log_dir: PathBuf,
    /// How often the board re-reads the clock so date badges age.
    pub refresh_interval_secs: u64,
    /// Offset of the timezone dates are typed and shown in.
    pub utc_offset_minutes: i32,
    /// Lists created on a board that has none yet.
    pub default_lists: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board_file: PathBuf::from("cardwall.json"),
            log_dir: PathBuf::from(".cardwall/logs"),
            refresh_interval_secs: 60,
            utc_offset_minutes: 0,
            default_lists: vec!["Todo".into(), "Doing".into(), "Done".into()],
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }

    /// Never shorter than one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// Falls back to UTC when the offset is out of range.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}
