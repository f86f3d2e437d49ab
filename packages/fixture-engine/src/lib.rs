//! # fixture-engine
//!
//! Exhaustive search core for a multi-week league season.
//!
//! These types are used by:
//! - `fixture-search`: the batch runner that drives the enumeration, persists
//!   the best schedule and checkpoints the position vector
//! - integration tests: golden values against the reference season
//!
//! ## Pipeline
//!
//! [`Season`] (odometer over [`Week`] permutations) → [`Schedule`] →
//! [`evaluate`] (worst-off participant) → [`SearchTracker`] (best so far,
//! checkpoint and progress intervals).
//!
//! ## Invariants
//! - Every week holds exactly one timeslot per pairing.
//! - `Week::combination` is a bijection between `[0, n!)` and the `n!`
//!   orderings of the week's pairings; a persisted index always decodes to the
//!   same assignment.
//! - The season iterator yields `∏ n_w!` schedules in lexicographic odometer
//!   order, each exactly once.
//!
//! Nothing in this crate performs I/O.

pub mod pairing;
pub mod score;
pub mod search;
pub mod season;
pub mod week;

pub use pairing::{Court, Pairing, Schedule, ScheduledPairing, Timeslot};
pub use score::{
    evaluate, participant_schedules, score_breakdown, ParticipantSchedule, ParticipantScore, Score,
};
pub use search::{EvaluationResult, Interval, Outcome, SearchTracker};
pub use season::{Season, SeasonError, SeasonIterator};
pub use week::{factorial, Week, WeekDef, WeekError};
