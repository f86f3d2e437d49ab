//! Season definition and runtime settings, read from TOML.
//!
//! The reference season ships inside the binary and is used when no
//! `--config` path is given.

use std::path::{Path, PathBuf};

use fixture_engine::{Season, SeasonError, WeekDef};
use serde::Deserialize;
use thiserror::Error;

pub const REFERENCE_SEASON: &str = include_str!("../season.toml");
const REFERENCE_NAME: &str = "<built-in reference season>";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {name}: {source}")]
    Parse {
        name: String,
        source: toml::de::Error,
    },
    #[error("invalid season in {name}: {source}")]
    Season { name: String, source: SeasonError },
    #[error("invalid config {name}: search.queue_capacity must be at least 1")]
    ZeroQueue { name: String },
}

// ── Config structs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub files: FilesConfig,
    pub weeks: Vec<WeekDef>,
    #[serde(skip)]
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Schedules between checkpoints (0 disables)
    pub checkpoint_every: u64,
    /// Schedules between progress log lines (0 disables)
    pub progress_every: u64,
    /// Bounded hand-off between producer and consumer
    pub queue_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: 1_000_000,
            progress_every: 100_000,
            queue_capacity: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub checkpoint: PathBuf,
    pub best: PathBuf,
    /// Minutes past the hour every timeslot starts at, as printed ("6.15")
    pub minute_mark: String,
    /// Commit best + checkpoint files to git after every checkpoint
    pub git_commit: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            checkpoint: PathBuf::from("breakpoint"),
            best: PathBuf::from("best"),
            minute_mark: "15".to_string(),
            git_commit: false,
        }
    }
}

impl Config {
    /// Loads `path`, or the built-in reference season when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::parse(&text, &path.display().to_string())
            }
            None => Self::parse(REFERENCE_SEASON, REFERENCE_NAME),
        }
    }

    pub fn parse(text: &str, name: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            name: name.to_string(),
            source,
        })?;
        config.name = name.to_string();
        if config.search.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueue { name: config.name });
        }
        Ok(config)
    }

    /// Where this config came from, for log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn season(&self) -> Result<Season, ConfigError> {
        Season::from_defs(&self.weeks).map_err(|source| ConfigError::Season {
            name: self.name.clone(),
            source,
        })
    }
}
