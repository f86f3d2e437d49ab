//! Pairings and their scheduled instances.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Hour-of-evening value a game starts at (6 = the 6.15 slot).
pub type Timeslot = u8;

/// A full season assignment, week-major then slot-position-minor.
pub type Schedule = Vec<ScheduledPairing>;

// ── Court ─────────────────────────────────────────────────────────────────────

/// One of the two courts available in every timeslot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Court {
    A,
    B,
}

impl Court {
    pub const ALL: [Court; 2] = [Court::A, Court::B];

    pub fn index(self) -> usize {
        match self {
            Court::A => 0,
            Court::B => 1,
        }
    }
}

impl fmt::Display for Court {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Court::A => f.write_str("A"),
            Court::B => f.write_str("B"),
        }
    }
}

// ── Pairing ───────────────────────────────────────────────────────────────────

/// Two participants due to meet once. Order is kept for display only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Pairing {
    first: Arc<str>,
    second: Arc<str>,
}

impl Pairing {
    pub fn new(first: impl Into<Arc<str>>, second: impl Into<Arc<str>>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// Both participants, in display order.
    pub fn participants(&self) -> [&str; 2] {
        [&self.first, &self.second]
    }

    pub fn involves(&self, participant: &str) -> bool {
        *self.first == *participant || *self.second == *participant
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v {}", self.first, self.second)
    }
}

// ── Scheduled pairing ─────────────────────────────────────────────────────────

/// A pairing bound to a date, a timeslot and a court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledPairing {
    pub pairing: Pairing,
    pub date: Arc<str>,
    pub timeslot: Timeslot,
    pub court: Court,
}

impl ScheduledPairing {
    pub fn new(pairing: Pairing, date: Arc<str>, timeslot: Timeslot, court: Court) -> Self {
        Self {
            pairing,
            date,
            timeslot,
            court,
        }
    }
}
