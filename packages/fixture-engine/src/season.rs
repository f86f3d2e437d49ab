//! Season iterator: a mixed-radix odometer over the weeks' combination
//! indices.
//!
//! Week 0 is the most significant digit and never wraps: once it reaches its
//! own combination count the iterator is exhausted for good. Every other digit
//! wraps to 0 and carries left.

use thiserror::Error;

use crate::pairing::Schedule;
use crate::week::{Week, WeekDef, WeekError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeasonError {
    #[error("season has no weeks")]
    NoWeeks,
    #[error(transparent)]
    Week(#[from] WeekError),
}

// ── Season ────────────────────────────────────────────────────────────────────

/// Ordered, non-empty list of weeks. Immutable once built.
#[derive(Debug, Clone)]
pub struct Season {
    weeks: Vec<Week>,
    pairing_count: usize,
}

impl Season {
    pub fn new(weeks: Vec<Week>) -> Result<Self, SeasonError> {
        if weeks.is_empty() {
            return Err(SeasonError::NoWeeks);
        }
        let pairing_count = weeks.iter().map(Week::pairing_count).sum();
        Ok(Self {
            weeks,
            pairing_count,
        })
    }

    pub fn from_defs(defs: &[WeekDef]) -> Result<Self, SeasonError> {
        let weeks = defs.iter().map(WeekDef::build).collect::<Result<Vec<_>, _>>()?;
        Self::new(weeks)
    }

    pub fn weeks(&self) -> &[Week] {
        &self.weeks
    }

    /// Total pairings across all weeks (length of every full schedule).
    pub fn pairing_count(&self) -> usize {
        self.pairing_count
    }

    pub fn combination_counts(&self) -> Vec<u64> {
        self.weeks.iter().map(Week::combination_count).collect()
    }

    /// `log10` of the number of full-season schedules.
    pub fn log10_size(&self) -> f64 {
        self.weeks
            .iter()
            .map(|w| (w.combination_count() as f64).log10())
            .sum()
    }

    /// Normalizes a caller-supplied resume point: one entry per week, missing
    /// entries are 0, extra entries are dropped, and an entry at or beyond its
    /// week's combination count is reset to 0.
    pub fn clamp_position(&self, start: &[u64]) -> Vec<u64> {
        self.weeks
            .iter()
            .enumerate()
            .map(|(i, week)| match start.get(i) {
                Some(&v) if v < week.combination_count() => v,
                _ => 0,
            })
            .collect()
    }

    /// Full-season schedule for an explicit position vector (clamped like a
    /// resume point).
    pub fn schedule_at(&self, position: &[u64]) -> Schedule {
        let position = self.clamp_position(position);
        self.assemble(&position)
    }

    pub fn iter(&self) -> SeasonIterator<'_> {
        self.iter_from(&[])
    }

    pub fn iter_from(&self, start: &[u64]) -> SeasonIterator<'_> {
        SeasonIterator {
            season: self,
            position: self.clamp_position(start),
        }
    }

    fn assemble(&self, position: &[u64]) -> Schedule {
        let mut schedule = Vec::with_capacity(self.pairing_count);
        for (week, &index) in self.weeks.iter().zip(position) {
            week.extend_combination(index, &mut schedule);
        }
        schedule
    }
}

// ── Iterator ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SeasonIterator<'s> {
    season: &'s Season,
    position: Vec<u64>,
}

impl SeasonIterator<'_> {
    /// The next position to produce; after a successful `next()` this is the
    /// resume point that skips everything already yielded.
    pub fn position(&self) -> &[u64] {
        &self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position[0] >= self.season.weeks[0].combination_count()
    }

    fn advance(&mut self) {
        for i in (0..self.position.len()).rev() {
            self.position[i] += 1;
            if i == 0 || self.position[i] < self.season.weeks[i].combination_count() {
                break;
            }
            self.position[i] = 0;
        }
    }
}

impl Iterator for SeasonIterator<'_> {
    type Item = Schedule;

    fn next(&mut self) -> Option<Schedule> {
        if self.is_exhausted() {
            return None;
        }
        let schedule = self.season.assemble(&self.position);
        self.advance();
        Some(schedule)
    }
}
