//! Week generator: factorial-number-system decoding of one week's pairings
//! onto its ordered timeslot/court sequence.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::pairing::{Court, Pairing, Schedule, ScheduledPairing, Timeslot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeekError {
    #[error("week {date} has no pairings")]
    Empty { date: String },
    #[error("week {date}: timeslots {start}..={end} seat {slots} games but {pairings} pairings are listed")]
    NotEnoughSlots {
        date: String,
        start: Timeslot,
        end: Timeslot,
        slots: usize,
        pairings: usize,
    },
    #[error("week {date}: {pairings}! combinations do not fit in 64 bits")]
    TooManyPairings { date: String, pairings: usize },
}

/// `n!`, or `None` once it no longer fits in a `u64` (n > 20).
pub fn factorial(n: usize) -> Option<u64> {
    (2..=n as u64).try_fold(1u64, |acc, k| acc.checked_mul(k))
}

// ── Season definition record ──────────────────────────────────────────────────

/// One `[[weeks]]` entry of a season definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct WeekDef {
    pub date: String,
    pub start: Timeslot,
    pub end: Timeslot,
    #[serde(default)]
    pub first_slot_single: bool,
    pub pairings: Vec<[String; 2]>,
}

impl WeekDef {
    pub fn build(&self) -> Result<Week, WeekError> {
        let pairings = self
            .pairings
            .iter()
            .map(|[a, b]| Pairing::new(a.as_str(), b.as_str()))
            .collect();
        Week::new(
            self.date.as_str(),
            self.start,
            self.end,
            self.first_slot_single,
            pairings,
        )
    }
}

// ── Week ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Week {
    date: Arc<str>,
    timeslots: Vec<Timeslot>,
    courts: Vec<Court>,
    pairings: Vec<Pairing>,
    combination_count: u64,
}

impl Week {
    /// Builds the week's timeslot sequence: every hour from `start` to `end`
    /// hosts two games (courts A and B), except `start` itself when
    /// `first_slot_single` is set. Stops as soon as every pairing is seated.
    pub fn new(
        date: impl Into<Arc<str>>,
        start: Timeslot,
        end: Timeslot,
        first_slot_single: bool,
        pairings: Vec<Pairing>,
    ) -> Result<Self, WeekError> {
        let date = date.into();
        let n = pairings.len();
        if n == 0 {
            return Err(WeekError::Empty { date: date.to_string() });
        }

        let mut timeslots = Vec::with_capacity(n);
        for t in start..=end {
            if timeslots.len() == n {
                break;
            }
            timeslots.push(t);
            if (t != start || !first_slot_single) && timeslots.len() < n {
                timeslots.push(t);
            }
        }
        if timeslots.len() < n {
            return Err(WeekError::NotEnoughSlots {
                date: date.to_string(),
                start,
                end,
                slots: timeslots.len(),
                pairings: n,
            });
        }

        let combination_count = factorial(n).ok_or_else(|| WeekError::TooManyPairings {
            date: date.to_string(),
            pairings: n,
        })?;

        let courts = (0..n).map(|slot| court_at(&timeslots, slot)).collect();

        Ok(Self {
            date,
            timeslots,
            courts,
            pairings,
            combination_count,
        })
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn timeslots(&self) -> &[Timeslot] {
        &self.timeslots
    }

    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }

    pub fn pairing_count(&self) -> usize {
        self.pairings.len()
    }

    /// `n!` for `n` pairings.
    pub fn combination_count(&self) -> u64 {
        self.combination_count
    }

    /// Court of each slot, parallel to [`timeslots`](Self::timeslots).
    pub fn courts(&self) -> &[Court] {
        &self.courts
    }

    /// Decodes `index` into one assignment of every pairing to a slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= combination_count()`.
    pub fn combination(&self, index: u64) -> Schedule {
        let mut out = Vec::with_capacity(self.pairings.len());
        self.extend_combination(index, &mut out);
        out
    }

    /// Same as [`combination`](Self::combination), appending to `out`.
    pub fn extend_combination(&self, index: u64, out: &mut Schedule) {
        assert!(
            index < self.combination_count,
            "combination index {index} out of range for week {} ({} combinations)",
            self.date,
            self.combination_count
        );

        let mut remaining: Vec<&Pairing> = self.pairings.iter().collect();
        let mut rest = index;
        for (slot, &timeslot) in self.timeslots.iter().enumerate() {
            let len = remaining.len() as u64;
            let offset = (rest % len) as usize;
            rest /= len;
            let pairing = remaining.remove(offset);
            out.push(ScheduledPairing::new(
                pairing.clone(),
                Arc::clone(&self.date),
                timeslot,
                self.courts[slot],
            ));
        }
    }
}

/// Court A opens every new timeslot; the second game in the same timeslot
/// goes to court B.
fn court_at(timeslots: &[Timeslot], slot: usize) -> Court {
    if slot == 0 || timeslots[slot] != timeslots[slot - 1] {
        Court::A
    } else {
        Court::B
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use proptest::prelude::*;

    fn pairings(n: usize) -> Vec<Pairing> {
        (0..n)
            .map(|i| Pairing::new(format!("{}", 2 * i + 1), format!("{}", 2 * i + 2)))
            .collect()
    }

    fn first_week() -> Week {
        Week::new(
            "30 Sep",
            6,
            8,
            false,
            vec![
                Pairing::new("25", "26"),
                Pairing::new("21", "24"),
                Pairing::new("23", "22"),
                Pairing::new("15", "16"),
                Pairing::new("51", "52"),
                Pairing::new("41", "42"),
            ],
        )
        .unwrap()
    }

    fn labels(schedule: &Schedule) -> Vec<String> {
        schedule
            .iter()
            .map(|s| format!("{}@{}{}", s.pairing, s.timeslot, s.court))
            .collect()
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0), Some(1));
        assert_eq!(factorial(1), Some(1));
        assert_eq!(factorial(2), Some(2));
        assert_eq!(factorial(6), Some(720));
        assert_eq!(factorial(7), Some(5040));
        assert_eq!(factorial(8), Some(40320));
        assert_eq!(factorial(9), Some(362_880));
        assert_eq!(factorial(10), Some(3_628_800));
        assert_eq!(factorial(20), Some(2_432_902_008_176_640_000));
        assert_eq!(factorial(21), None);
    }

    #[test]
    fn test_factorial_strictly_increasing() {
        for n in 2..20 {
            assert!(factorial(n + 1).unwrap() > factorial(n).unwrap());
        }
    }

    #[test]
    fn test_timeslots_doubled() {
        let week = first_week();
        assert_eq!(week.timeslots(), &[6, 6, 7, 7, 8, 8]);
        assert_eq!(week.combination_count(), 720);
    }

    #[test]
    fn test_timeslots_first_single() {
        let week = Week::new("2 Dec", 5, 9, true, pairings(9)).unwrap();
        assert_eq!(week.timeslots(), &[5, 6, 6, 7, 7, 8, 8, 9, 9]);
        assert_eq!(&week.courts()[..3], &[Court::A, Court::A, Court::B]);
        assert_eq!(week.courts().len(), week.timeslots().len());
    }

    #[test]
    fn test_timeslots_stop_when_full() {
        let week = Week::new("17 Mar", 6, 7, false, pairings(3)).unwrap();
        assert_eq!(week.timeslots(), &[6, 6, 7]);
    }

    #[test]
    fn test_odd_count_leaves_last_slot_single() {
        let week = Week::new("31 May", 1, 2, true, pairings(3)).unwrap();
        assert_eq!(week.timeslots(), &[1, 2, 2]);
        assert_eq!(week.courts(), &[Court::A, Court::A, Court::B]);
    }

    #[test]
    fn test_not_enough_slots() {
        let err = Week::new("1 Jan", 6, 7, false, pairings(5)).unwrap_err();
        assert_eq!(
            err,
            WeekError::NotEnoughSlots {
                date: "1 Jan".into(),
                start: 6,
                end: 7,
                slots: 4,
                pairings: 5,
            }
        );
    }

    #[test]
    fn test_empty_week_rejected() {
        assert!(matches!(
            Week::new("1 Jan", 6, 9, false, vec![]),
            Err(WeekError::Empty { .. })
        ));
    }

    #[test]
    fn test_too_many_pairings_rejected() {
        assert!(matches!(
            Week::new("1 Jan", 0, 20, false, pairings(21)),
            Err(WeekError::TooManyPairings { pairings: 21, .. })
        ));
    }

    #[test]
    fn test_week_def_build() {
        let def = WeekDef {
            date: "17 Mar".into(),
            start: 6,
            end: 7,
            first_slot_single: false,
            pairings: vec![
                ["12".into(), "14".into()],
                ["15".into(), "11".into()],
                ["39".into(), "38".into()],
            ],
        };
        let week = def.build().unwrap();
        assert_eq!(week.date(), "17 Mar");
        assert_eq!(week.pairing_count(), 3);
        assert_eq!(week.pairings()[1], Pairing::new("15", "11"));
    }

    #[test]
    fn test_combination_zero_is_listed_order() {
        let schedule = first_week().combination(0);
        assert_eq!(
            labels(&schedule),
            vec!["25 v 26@6A", "21 v 24@6B", "23 v 22@7A", "15 v 16@7B", "51 v 52@8A", "41 v 42@8B"]
        );
        assert!(schedule.iter().all(|s| &*s.date == "30 Sep"));
    }

    #[test]
    fn test_combination_500() {
        let schedule = first_week().combination(500);
        assert_eq!(
            labels(&schedule),
            vec!["23 v 22@6A", "51 v 52@6B", "25 v 26@7A", "15 v 16@7B", "41 v 42@8A", "21 v 24@8B"]
        );
    }

    #[test]
    fn test_last_combination_reverses() {
        let week = Week::new("w", 1, 3, false, pairings(4)).unwrap();
        let last = week.combination(week.combination_count() - 1);
        let order: Vec<_> = last.iter().map(|s| s.pairing.first().to_string()).collect();
        assert_eq!(order, vec!["7", "5", "3", "1"]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_combination_out_of_range_panics() {
        first_week().combination(720);
    }

    #[test]
    fn test_combination_bijection() {
        for n in 1..=6 {
            let week = Week::new("w", 1, 9, false, pairings(n)).unwrap();
            let seen: HashSet<Vec<String>> = (0..week.combination_count())
                .map(|i| labels(&week.combination(i)))
                .collect();
            assert_eq!(seen.len() as u64, week.combination_count(), "n = {n}");
        }
    }

    proptest! {
        #[test]
        fn prop_every_pairing_seated_once(n in 1usize..=8, seed in any::<u64>()) {
            let week = Week::new("w", 1, 9, false, pairings(n)).unwrap();
            let index = seed % week.combination_count();
            let schedule = week.combination(index);
            prop_assert_eq!(schedule.len(), n);
            let seated: HashSet<_> = schedule.iter().map(|s| s.pairing.clone()).collect();
            prop_assert_eq!(seated.len(), n);
            for (slot, s) in schedule.iter().enumerate() {
                prop_assert_eq!(s.timeslot, week.timeslots()[slot]);
                let expected = if slot == 0 || week.timeslots()[slot] != week.timeslots()[slot - 1] {
                    Court::A
                } else {
                    Court::B
                };
                prop_assert_eq!(s.court, expected);
            }
        }
    }
}
