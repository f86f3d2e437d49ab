//! main.rs — fixture-search entry point
//!
//! Exhaustively enumerates every assignment of a season's pairings to
//! timeslots and courts, keeping the fairest schedule found:
//!   1. `run`: resume from the checkpoint, search until exhaustion or Ctrl-C,
//!      persisting the best schedule and checkpointing the position vector
//!   2. `show`: decode and score a single position vector, optionally for
//!      one participant
//!   3. `info`: per-week combination counts and total search-space size

mod config;
mod coordinator;
mod persistence;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fixture_engine::{evaluate, score_breakdown};
use tracing::info;

use config::Config;
use coordinator::{run_search, spawn_signal_listener, Cancellation, SearchSettings};
use persistence::{render_game, Store};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fixture-search", about = "Exhaustive fairness search over a league season")]
struct Args {
    /// Season definition (TOML); the built-in reference season when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search until every combination is scored or the process is interrupted
    Run {
        /// Ignore the stored checkpoint and best score
        #[arg(long)]
        fresh: bool,
    },
    /// Decode and score one position vector (one combination index per week)
    Show {
        #[arg(long, num_args = 1..)]
        position: Vec<u64>,
        /// Only list this participant's games and score
        #[arg(long)]
        participant: Option<String>,
        /// Print JSON instead of the best-file format
        #[arg(long)]
        json: bool,
    },
    /// Describe the season's weeks and search-space size
    Info,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fixture_search=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Run { fresh } => run(&config, fresh).await,
        Command::Show {
            position,
            participant,
            json,
        } => show(&config, &position, participant.as_deref(), json),
        Command::Info => describe(&config),
    }
}

async fn run(config: &Config, fresh: bool) -> Result<()> {
    let season = Arc::new(config.season()?);
    info!(
        "🗓  Searching {}: {} weeks, {} pairings, ~10^{:.1} schedules",
        config.name(),
        season.weeks().len(),
        season.pairing_count(),
        season.log10_size()
    );

    let store = Store::new(&config.files);
    let (resume, best) = if fresh {
        info!("Fresh run: ignoring stored checkpoint and best score");
        (Vec::new(), None)
    } else {
        let resume = store
            .load_checkpoint()
            .await
            .context("cannot resume")?
            .unwrap_or_default();
        let best = store.load_best_score().await.context("cannot resume")?;
        (resume, best)
    };

    let settings = SearchSettings {
        checkpoint_every: config.search.checkpoint_every,
        progress_every: config.search.progress_every,
        queue_capacity: config.search.queue_capacity,
        resume,
        best,
    };

    let cancel = Cancellation::new();
    let signals = spawn_signal_listener(cancel.clone());
    let summary = run_search(season, store, settings, cancel).await;
    signals.abort();
    let summary = summary?;

    info!(
        "Search stopped: {} of {} queued schedules processed, exhausted={}, cancelled={}",
        summary.processed, summary.produced, summary.exhausted, summary.cancelled
    );
    if summary.exhausted {
        info!("🏁 Every combination has been scored");
    } else if let Some(position) = &summary.last_position {
        info!("Next run resumes at {position:?}");
    }
    match summary.best {
        Some(best) => info!("Best score so far: {best} ({})", config.files.best.display()),
        None => info!("No schedule scored yet"),
    }
    Ok(())
}

fn show(config: &Config, position: &[u64], participant: Option<&str>, json: bool) -> Result<()> {
    let season = config.season()?;
    let position = season.clamp_position(position);
    let schedule = season.schedule_at(&position);
    let score = evaluate(&schedule);
    let mut breakdown = score_breakdown(&schedule);
    if let Some(id) = participant {
        breakdown.retain(|row| row.participant == id);
        if breakdown.is_empty() {
            bail!("participant {id} plays no games this season");
        }
    }
    let games: Vec<_> = schedule
        .iter()
        .filter(|game| participant.map_or(true, |id| game.pairing.involves(id)))
        .collect();

    if json {
        let doc = serde_json::json!({
            "position":     position,
            "score":        score,
            "participants": breakdown,
            "schedule":     games,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("position: {position:?}");
    println!("{score}");
    for game in &games {
        println!("{}", render_game(game, &config.files.minute_mark));
    }
    println!();
    for row in &breakdown {
        println!("{:>6}  {:>2} games  score {}", row.participant, row.games, row.score);
    }
    Ok(())
}

fn describe(config: &Config) -> Result<()> {
    let season = config.season()?;
    println!("{}", config.name());
    for (week, count) in season.weeks().iter().zip(season.combination_counts()) {
        let slots: Vec<_> = week
            .timeslots()
            .iter()
            .zip(week.courts())
            .map(|(timeslot, court)| format!("{timeslot}{court}"))
            .collect();
        println!(
            "{:>7}  {:>2} pairings  {:<26}  {count} combinations",
            week.date(),
            week.pairing_count(),
            slots.join(" ")
        );
    }
    println!(
        "{} weeks, {} pairings, ~10^{:.2} schedules",
        season.weeks().len(),
        season.pairing_count(),
        season.log10_size()
    );
    Ok(())
}
