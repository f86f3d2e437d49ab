//! Checkpoint and best-schedule files.
//!
//! - checkpoint: the position vector as whitespace-separated decimal integers
//! - best: the score on the first line, then one line per game
//!
//! A missing file means "nothing stored yet". A file that exists but cannot be
//! read or parsed is fatal: resuming from corrupted state is never safe.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fixture_engine::{ScheduledPairing, Score};
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::FilesConfig;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("file {path} found but could not be read or written: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("file {path} found but is not a list of non-negative integers")]
    MalformedCheckpoint { path: String },
    #[error("file {path} found but does not start with a score")]
    MalformedBest { path: String },
}

// ── Text formats ──────────────────────────────────────────────────────────────

/// Parses `"  1241   32 1 "` into `[1241, 32, 1]`. Anything other than ASCII
/// digits and ASCII whitespace (space, tab, CR, LF, form feed), or no number
/// at all, is rejected.
pub fn parse_position(text: &str) -> Option<Vec<u64>> {
    let position = text
        .split(|c: char| c.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token.bytes().all(|b| b.is_ascii_digit()) {
                token.parse::<u64>().ok()
            } else {
                None
            }
        })
        .collect::<Option<Vec<_>>>()?;
    if position.is_empty() {
        return None;
    }
    Some(position)
}

pub fn render_position(position: &[u64]) -> String {
    let mut out = position
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    out.push('\n');
    out
}

/// The first run of decimal digits in the file is the stored score.
pub fn parse_best_score(text: &str) -> Option<Score> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits = &text[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// `30 Sep, 6.15, A: 25 v 26`
pub fn render_game(game: &ScheduledPairing, minute_mark: &str) -> String {
    format!(
        "{}, {}.{}, {}: {}",
        game.date, game.timeslot, minute_mark, game.court, game.pairing
    )
}

pub fn render_best(score: Score, schedule: &[ScheduledPairing], minute_mark: &str) -> String {
    let mut out = format!("{score}\n");
    for game in schedule {
        out.push_str(&render_game(game, minute_mark));
        out.push('\n');
    }
    out
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// The persistence collaborator for one search run.
#[derive(Debug, Clone)]
pub struct Store {
    checkpoint: PathBuf,
    best: PathBuf,
    minute_mark: String,
    git_commit: bool,
}

impl Store {
    pub fn new(files: &FilesConfig) -> Self {
        Self {
            checkpoint: files.checkpoint.clone(),
            best: files.best.clone(),
            minute_mark: files.minute_mark.clone(),
            git_commit: files.git_commit,
        }
    }

    /// Resume point, or `None` when no checkpoint has been written yet.
    pub async fn load_checkpoint(&self) -> Result<Option<Vec<u64>>, PersistError> {
        let Some(text) = read_optional(&self.checkpoint).await? else {
            info!("No checkpoint found at {}", self.checkpoint.display());
            return Ok(None);
        };
        let position = parse_position(&text).ok_or_else(|| PersistError::MalformedCheckpoint {
            path: self.checkpoint.display().to_string(),
        })?;
        info!("Found checkpoint in {}: {position:?}", self.checkpoint.display());
        Ok(Some(position))
    }

    pub async fn save_checkpoint(&self, position: &[u64]) -> Result<(), PersistError> {
        write_atomic(&self.checkpoint, &render_position(position)).await?;
        debug!("Checkpoint written: {position:?}");
        Ok(())
    }

    /// Previously recorded best score, or `None` when no best file exists.
    pub async fn load_best_score(&self) -> Result<Option<Score>, PersistError> {
        let Some(text) = read_optional(&self.best).await? else {
            info!("No best schedule found at {}", self.best.display());
            return Ok(None);
        };
        let score = parse_best_score(&text).ok_or_else(|| PersistError::MalformedBest {
            path: self.best.display().to_string(),
        })?;
        info!("Found best score in {}: {score}", self.best.display());
        Ok(Some(score))
    }

    pub async fn save_best(
        &self,
        score: Score,
        schedule: &[ScheduledPairing],
    ) -> Result<(), PersistError> {
        write_atomic(&self.best, &render_best(score, schedule, &self.minute_mark)).await
    }

    /// Commits both files when enabled and reports whether a commit was made.
    /// Failures are logged, never fatal.
    pub async fn commit(&self) -> bool {
        if !self.git_commit {
            return false;
        }
        let output = Command::new("git")
            .arg("commit")
            .arg("-m")
            .arg("Latest status")
            .arg(&self.best)
            .arg(&self.checkpoint)
            .output()
            .await;
        match output {
            Ok(out) if out.status.success() => {
                debug!("Committed search state");
                true
            }
            Ok(out) => {
                warn!(
                    "git commit failed ({}): {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                );
                false
            }
            Err(e) => {
                warn!("git commit could not start: {e}");
                false
            }
        }
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, PersistError> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PersistError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Writes through a sibling temp file so a crash never leaves a torn file.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), PersistError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)
        .await
        .map_err(|source| PersistError::Io {
            path: tmp.display().to_string(),
            source,
        })?;
    fs::rename(&tmp, path)
        .await
        .map_err(|source| PersistError::Io {
            path: path.display().to_string(),
            source,
        })
}
