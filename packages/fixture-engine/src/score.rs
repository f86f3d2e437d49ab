//! Fairness scoring. Lower is better; a season scores as its worst-off
//! participant.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::pairing::{Court, ScheduledPairing, Timeslot};

pub type Score = u32;

/// Timeslots every participant is expected to play in evenly.
pub const CANONICAL_TIMESLOTS: [Timeslot; 4] = [6, 7, 8, 9];

/// Score given to a participant with too many early or late games.
pub const VIOLATION_SCORE: Score = 100;

const EARLY_SLOT: Timeslot = 5;
const EARLY_LIMIT: u32 = 1;
const LATE_SLOT: Timeslot = 9;
const LATE_LIMIT: u32 = 2;
const TIMESLOT_WEIGHT: Score = 10;

// ── Tallies ───────────────────────────────────────────────────────────────────

/// Games per timeslot. Canonical slots are always present (possibly zero);
/// any other slot appears once played.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TimeslotTally(BTreeMap<Timeslot, u32>);

impl TimeslotTally {
    fn new() -> Self {
        Self(CANONICAL_TIMESLOTS.iter().map(|&t| (t, 0)).collect())
    }

    fn add(&mut self, timeslot: Timeslot) {
        *self.0.entry(timeslot).or_insert(0) += 1;
    }

    fn get(&self, timeslot: Timeslot) -> u32 {
        self.0.get(&timeslot).copied().unwrap_or(0)
    }

    fn imbalance(&self) -> u32 {
        imbalance(self.0.values().copied())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CourtTally([u32; 2]);

impl CourtTally {
    fn add(&mut self, court: Court) {
        self.0[court.index()] += 1;
    }

    fn imbalance(&self) -> u32 {
        imbalance(self.0.iter().copied())
    }
}

/// Spread between the largest and smallest count; 0 when there are none.
fn imbalance(counts: impl Iterator<Item = u32>) -> u32 {
    let bounds = counts.fold(None, |acc: Option<(u32, u32)>, c| match acc {
        None => Some((c, c)),
        Some((lo, hi)) => Some((lo.min(c), hi.max(c))),
    });
    bounds.map_or(0, |(lo, hi)| hi - lo)
}

// ── Participant sub-schedules ─────────────────────────────────────────────────

/// The games one participant plays, in schedule order.
#[derive(Debug, Clone)]
pub struct ParticipantSchedule<'a> {
    participant: &'a str,
    games: Vec<&'a ScheduledPairing>,
}

impl<'a> ParticipantSchedule<'a> {
    pub fn participant(&self) -> &'a str {
        self.participant
    }

    pub fn games(&self) -> &[&'a ScheduledPairing] {
        &self.games
    }

    pub fn fairness(&self) -> Score {
        let mut timeslots = TimeslotTally::new();
        let mut courts = CourtTally::default();
        for game in &self.games {
            timeslots.add(game.timeslot);
            courts.add(game.court);
        }

        if timeslots.get(EARLY_SLOT) > EARLY_LIMIT || timeslots.get(LATE_SLOT) > LATE_LIMIT {
            return VIOLATION_SCORE;
        }
        TIMESLOT_WEIGHT * timeslots.imbalance() + courts.imbalance()
    }
}

/// Splits a schedule into one sub-schedule per participant, sorted by
/// participant identifier.
pub fn participant_schedules(schedule: &[ScheduledPairing]) -> Vec<ParticipantSchedule<'_>> {
    let mut by_participant: BTreeMap<&str, Vec<&ScheduledPairing>> = BTreeMap::new();
    for game in schedule {
        for participant in game.pairing.participants() {
            by_participant.entry(participant).or_default().push(game);
        }
    }
    by_participant
        .into_iter()
        .map(|(participant, games)| ParticipantSchedule { participant, games })
        .collect()
}

// ── Season score ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantScore<'a> {
    pub participant: &'a str,
    pub games: usize,
    pub score: Score,
}

pub fn score_breakdown(schedule: &[ScheduledPairing]) -> Vec<ParticipantScore<'_>> {
    participant_schedules(schedule)
        .iter()
        .map(|ps| ParticipantScore {
            participant: ps.participant,
            games: ps.games.len(),
            score: ps.fairness(),
        })
        .collect()
}

/// Season score: the worst participant's fairness score.
pub fn evaluate(schedule: &[ScheduledPairing]) -> Score {
    participant_schedules(schedule)
        .iter()
        .map(ParticipantSchedule::fairness)
        .max()
        .unwrap_or(0)
}
