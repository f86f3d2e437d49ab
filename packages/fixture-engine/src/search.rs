//! Search bookkeeping shared by the producer and consumer roles: the record
//! handed between them and the consumer's best-score/interval state.

use crate::pairing::Schedule;
use crate::score::Score;

/// One scored schedule, tagged with the position to resume from once it has
/// been processed.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub position: Vec<u64>,
    pub schedule: Schedule,
    pub score: Score,
}

// ── Interval ──────────────────────────────────────────────────────────────────

/// Fires once every `every` ticks. `every == 0` never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    every: u64,
    count: u64,
}

impl Interval {
    pub fn new(every: u64) -> Self {
        Self { every, count: 0 }
    }

    pub fn every(&self) -> u64 {
        self.every
    }

    pub fn tick(&mut self) -> bool {
        if self.every == 0 {
            return false;
        }
        self.count += 1;
        if self.count >= self.every {
            self.count = 0;
            return true;
        }
        false
    }
}

// ── Tracker ───────────────────────────────────────────────────────────────────

/// What the consumer must do after recording one result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// `Some(previous_best)` when this result is the new best.
    pub improved_from: Option<Option<Score>>,
    pub checkpoint_due: bool,
    pub progress_due: bool,
}

impl Outcome {
    pub fn improved(&self) -> bool {
        self.improved_from.is_some()
    }
}

/// Consumer-owned search state. Single writer; nothing else mutates it.
#[derive(Debug, Clone)]
pub struct SearchTracker {
    best: Option<Score>,
    processed: u64,
    checkpoint: Interval,
    progress: Interval,
}

impl SearchTracker {
    pub fn new(checkpoint_every: u64, progress_every: u64) -> Self {
        Self {
            best: None,
            processed: 0,
            checkpoint: Interval::new(checkpoint_every),
            progress: Interval::new(progress_every),
        }
    }

    /// Starts from a previously persisted best score.
    pub fn with_best(mut self, best: Option<Score>) -> Self {
        self.best = best;
        self
    }

    pub fn best(&self) -> Option<Score> {
        self.best
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn checkpoint_every(&self) -> u64 {
        self.checkpoint.every()
    }

    pub fn progress_every(&self) -> u64 {
        self.progress.every()
    }

    /// Records one score. Only a strictly lower score replaces the best, so
    /// the first schedule found wins among ties.
    pub fn record(&mut self, score: Score) -> Outcome {
        self.processed += 1;

        let improved_from = match self.best {
            Some(best) if score >= best => None,
            previous => {
                self.best = Some(score);
                Some(previous)
            }
        };

        Outcome {
            improved_from,
            checkpoint_due: self.checkpoint.tick(),
            progress_due: self.progress.tick(),
        }
    }
}
