//! Search coordinator: one producer, one consumer, one bounded queue.
//!
//!   1. Producer (blocking thread): walks the season odometer, scores each
//!      schedule and pushes the result; blocks while the queue is full.
//!   2. Consumer (async task): drains results in order, tracks the best score,
//!      writes the best file on improvement and the checkpoint at intervals.
//!   3. Signal listener: the first SIGINT/SIGTERM sets the cancellation flag.
//!      SIGKILL cannot be caught and ends the process without draining.
//!
//! Cancellation is checked by the producer once per schedule. Results already
//! queued are still processed before the run returns.

use std::sync::Arc;

use anyhow::{Context, Result};
use fixture_engine::{evaluate, EvaluationResult, Score, Season, SearchTracker};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::persistence::{PersistError, Store};

// ── Cancellation ──────────────────────────────────────────────────────────────

/// Shared "please stop" flag. Cloning shares the same flag.
#[derive(Debug, Clone)]
pub struct Cancellation {
    tx: Arc<watch::Sender<bool>>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the signal listener. Abort the handle once the search has joined;
/// a run that ends by exhaustion never waits for a signal.
pub fn spawn_signal_listener(cancel: Cancellation) -> JoinHandle<()> {
    tokio::spawn(async move {
        let signal = wait_for_shutdown_signal().await;
        info!("Signal {signal} received, stopping after queued results are processed");
        cancel.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!("Could not listen for SIGTERM: {e}");
            return wait_for_ctrl_c().await;
        }
    };
    tokio::select! {
        name = wait_for_ctrl_c() => name,
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> &'static str {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

// ── Settings & summary ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub checkpoint_every: u64,
    pub progress_every: u64,
    pub queue_capacity: usize,
    /// Resume point (clamped per week by the season iterator)
    pub resume: Vec<u64>,
    /// Best score from an earlier run
    pub best: Option<Score>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSummary {
    /// Schedules the producer enumerated and queued
    pub produced: u64,
    /// Schedules the consumer scored and recorded
    pub processed: u64,
    pub best: Option<Score>,
    pub exhausted: bool,
    pub cancelled: bool,
    /// Resume point after the last processed schedule
    pub last_position: Option<Vec<u64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProducerEnd {
    Exhausted,
    Cancelled,
    ConsumerGone,
}

// ── Run ───────────────────────────────────────────────────────────────────────

/// Runs the search to exhaustion or cancellation and joins both roles.
///
/// A persistence failure in the consumer cancels the producer and is returned
/// as the run's error.
pub async fn run_search(
    season: Arc<Season>,
    store: Store,
    settings: SearchSettings,
    cancel: Cancellation,
) -> Result<SearchSummary> {
    let (tx, rx) = mpsc::channel::<EvaluationResult>(settings.queue_capacity);

    let producer = {
        let cancel = cancel.clone();
        let resume = settings.resume.clone();
        tokio::task::spawn_blocking(move || produce(&season, &resume, tx, &cancel))
    };

    let tracker = SearchTracker::new(settings.checkpoint_every, settings.progress_every)
        .with_best(settings.best);
    let consumer = {
        let store = store.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let report = consume(rx, &store, tracker).await;
            if report.is_err() {
                cancel.cancel();
            }
            report
        })
    };

    let (producer, consumer) = tokio::join!(producer, consumer);
    let (end, produced) = producer.context("producer task panicked")?;
    let report = consumer
        .context("consumer task panicked")?
        .context("search state could not be persisted")?;

    if end == ProducerEnd::Cancelled {
        if let Some(position) = &report.last_position {
            store
                .save_checkpoint(position)
                .await
                .context("final checkpoint could not be written")?;
            store.commit().await;
            info!("Final checkpoint written: {position:?}");
        }
    }

    debug_assert_eq!(produced, report.tracker.processed());
    Ok(SearchSummary {
        produced,
        processed: report.tracker.processed(),
        best: report.tracker.best(),
        exhausted: end == ProducerEnd::Exhausted,
        cancelled: end == ProducerEnd::Cancelled,
        last_position: report.last_position,
    })
}

/// Producer role. Returns why it stopped and how many results it queued.
fn produce(
    season: &Season,
    resume: &[u64],
    tx: mpsc::Sender<EvaluationResult>,
    cancel: &Cancellation,
) -> (ProducerEnd, u64) {
    let mut it = season.iter_from(resume);
    info!("Starting enumeration at position {:?}", it.position());
    let mut produced = 0;
    loop {
        if cancel.is_cancelled() {
            return (ProducerEnd::Cancelled, produced);
        }
        let Some(schedule) = it.next() else {
            info!("All combinations processed");
            return (ProducerEnd::Exhausted, produced);
        };
        let score = evaluate(&schedule);
        let result = EvaluationResult {
            position: it.position().to_vec(),
            schedule,
            score,
        };
        if tx.blocking_send(result).is_err() {
            return (ProducerEnd::ConsumerGone, produced);
        }
        produced += 1;
    }
}

struct ConsumerReport {
    tracker: SearchTracker,
    last_position: Option<Vec<u64>>,
}

/// Consumer role. Returning drops `rx`, which unblocks and stops the producer.
async fn consume(
    mut rx: mpsc::Receiver<EvaluationResult>,
    store: &Store,
    mut tracker: SearchTracker,
) -> Result<ConsumerReport, PersistError> {
    let mut last_position = None;
    while let Some(result) = rx.recv().await {
        let outcome = tracker.record(result.score);

        if let Some(previous) = outcome.improved_from {
            store.save_best(result.score, &result.schedule).await?;
            match previous {
                Some(previous) => info!("New best score {} (was {previous})", result.score),
                None => info!("First best score {}", result.score),
            }
        }

        if outcome.checkpoint_due {
            info!("Checkpointing after {} schedules", tracker.checkpoint_every());
            store.save_checkpoint(&result.position).await?;
            store.commit().await;
        }

        if outcome.progress_due {
            info!(
                "Processed another batch of {} schedules: latest position {:?}",
                tracker.progress_every(),
                result.position
            );
        }

        last_position = Some(result.position);
    }
    Ok(ConsumerReport {
        tracker,
        last_position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FilesConfig};
    use std::path::Path;
    use std::time::Duration;

    use fixture_engine::{Pairing, Week};

    fn three_pairing_week(date: &str, start: u8, prefix: u32) -> Week {
        let pairings = (0..3)
            .map(|i| {
                let a = prefix * 10 + 2 * i + 1;
                Pairing::new(a.to_string(), (a + 1).to_string())
            })
            .collect();
        Week::new(date, start, start + 1, true, pairings).unwrap()
    }

    fn small_season() -> Arc<Season> {
        Arc::new(
            Season::new(vec![
                three_pairing_week("31 May", 1, 1),
                three_pairing_week("1 Jun", 3, 2),
                three_pairing_week("2 Jun", 5, 3),
            ])
            .unwrap(),
        )
    }

    fn store_in(dir: &Path) -> Store {
        Store::new(&FilesConfig {
            checkpoint: dir.join("breakpoint"),
            best: dir.join("best"),
            ..FilesConfig::default()
        })
    }

    fn settings(checkpoint_every: u64, resume: Vec<u64>, best: Option<Score>) -> SearchSettings {
        SearchSettings {
            checkpoint_every,
            progress_every: 100,
            queue_capacity: 10,
            resume,
            best,
        }
    }

    fn best_over(season: &Season, start: &[u64]) -> Score {
        season.iter_from(start).map(|s| evaluate(&s)).min().unwrap()
    }

    #[tokio::test]
    async fn test_runs_to_exhaustion() {
        let dir = tempfile::tempdir().unwrap();
        let season = small_season();
        let expected_best = best_over(&season, &[]);

        let summary = run_search(
            season.clone(),
            store_in(dir.path()),
            settings(50, vec![], None),
            Cancellation::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.produced, 216);
        assert_eq!(summary.processed, 216);
        assert!(summary.exhausted);
        assert!(!summary.cancelled);
        assert_eq!(summary.best, Some(expected_best));
        assert_eq!(summary.last_position, Some(vec![6, 0, 0]));

        // last interval fired on schedule 200: resume at index 200 = (5, 3, 2) in base 6
        let checkpoint = std::fs::read_to_string(dir.path().join("breakpoint")).unwrap();
        assert_eq!(checkpoint, "5 3 2\n");

        let best = std::fs::read_to_string(dir.path().join("best")).unwrap();
        assert!(best.starts_with(&format!("{expected_best}\n")));
        assert_eq!(best.lines().count(), 1 + season.pairing_count());
    }

    #[tokio::test]
    async fn test_resume_processes_only_the_remainder() {
        let dir = tempfile::tempdir().unwrap();
        let summary = run_search(
            small_season(),
            store_in(dir.path()),
            settings(0, vec![5, 5, 0], None),
            Cancellation::new(),
        )
        .await
        .unwrap();
        assert_eq!(summary.processed, 6);
        assert!(summary.exhausted);
        assert!(!dir.path().join("breakpoint").exists());
    }

    #[tokio::test]
    async fn test_warm_start_keeps_better_best() {
        let dir = tempfile::tempdir().unwrap();
        let summary = run_search(
            small_season(),
            store_in(dir.path()),
            settings(0, vec![], Some(0)),
            Cancellation::new(),
        )
        .await
        .unwrap();
        assert_eq!(summary.processed, 216);
        assert_eq!(summary.best, Some(0));
        assert!(!dir.path().join("best").exists());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = Cancellation::new();
        cancel.cancel();
        let summary = run_search(
            small_season(),
            store_in(dir.path()),
            settings(1, vec![], None),
            cancel,
        )
        .await
        .unwrap();
        assert_eq!(summary.processed, 0);
        assert!(summary.cancelled);
        assert!(!summary.exhausted);
        assert_eq!(summary.last_position, None);
        assert!(!dir.path().join("breakpoint").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_drains_queue_and_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let season = Arc::new(Config::load(None).unwrap().season().unwrap());
        let cancel = Cancellation::new();

        let run = tokio::spawn(run_search(
            season.clone(),
            store_in(dir.path()),
            settings(0, vec![], None),
            cancel.clone(),
        ));

        // the first result always becomes the best, so its file marks progress
        let best = dir.path().join("best");
        for _ in 0..500 {
            if best.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();

        let summary = run.await.unwrap().unwrap();
        assert!(summary.cancelled);
        assert!(summary.processed >= 1);
        assert_eq!(summary.processed, summary.produced);

        let position = summary.last_position.unwrap();
        let checkpoint = std::fs::read_to_string(dir.path().join("breakpoint")).unwrap();
        assert_eq!(
            crate::persistence::parse_position(&checkpoint),
            Some(position.clone())
        );

        // resuming from the checkpoint continues right after the last processed schedule
        let mut it = season.iter();
        for _ in 0..summary.processed {
            it.next();
        }
        assert_eq!(it.position(), position.as_slice());
    }

    #[tokio::test]
    async fn test_persistence_failure_stops_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir.path().join("missing-dir"));
        let err = run_search(
            small_season(),
            store,
            settings(0, vec![], None),
            Cancellation::new(),
        )
        .await
        .unwrap_err();
        assert!(format!("{err:#}").contains("could not be persisted"));
    }
}
