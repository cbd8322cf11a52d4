//! Gossroom pipeline runner
//!
//! One binary, one subcommand per pipeline concern. `run` executes the
//! whole sequence: memorial cleanup, feed fetch, accept/extract/dedup,
//! temperature scoring, candidate promotion, post generation, Bluesky
//! republish. Every step is timed into the run summary; a recoverable
//! step failure is recorded and the run carries on, while roster and
//! state-write problems abort immediately.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gossroom_core::{Article, Entity, GossResult};
use gossroom_engine::{
    RunCounts, RunSummary, ScoringContext, StateDir, StepReport, TemperatureReport,
};
use gossroom_feeds::FeedClient;
use gossroom_publish::{scan_recent_posts, BlueskyClient, BlueskyCredentials, PostWriter};

#[derive(Parser)]
#[command(name = "gossroom")]
#[command(about = "Celebrity drama tracking pipeline")]
#[command(version)]
struct Cli {
    /// Directory holding the roster and run state
    #[arg(long, default_value = "state", global = true)]
    state_dir: PathBuf,

    /// Directory generated posts are written under
    #[arg(long, default_value = "posts", global = true)]
    posts_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline once
    Run {
        /// Skip post generation and the Bluesky step
        #[arg(long)]
        skip_publish: bool,
    },

    /// Rescore the roster from persisted mention history
    Score,

    /// Promote cleared discovery candidates and matured entities
    Discover,

    /// Retire memorial entities past their retention window
    Cleanup,

    /// Republish recent high-drama posts to Bluesky
    Publish,

    /// Show roster temperatures and the last run summary
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gossroom_engine=debug")),
        )
        .init();

    let cli = Cli::parse();
    let state = StateDir::new(&cli.state_dir)?;

    let result = match cli.command {
        Commands::Run { skip_publish } => cmd_run(&state, &cli.posts_dir, skip_publish).await,
        Commands::Score => cmd_score(&state),
        Commands::Discover => cmd_discover(&state),
        Commands::Cleanup => cmd_cleanup(&state),
        Commands::Publish => cmd_publish(&state, &cli.posts_dir).await,
        Commands::Status => cmd_status(&state),
    };
    if let Err(e) = &result {
        error!(error = %e, "command aborted");
    }
    result
}

async fn cmd_run(state: &StateDir, posts_dir: &Path, skip_publish: bool) -> Result<()> {
    let started_at = Utc::now();
    let now = started_at;
    let mut steps: Vec<StepReport> = Vec::new();
    let mut counts = RunCounts::default();

    // A roster problem aborts before anything is written
    let mut ctx = ScoringContext::load(state, now)?;
    info!(entities = ctx.roster.len(), "pipeline state loaded");

    let t = Instant::now();
    let memorial = ctx.cleanup_memorials(now);
    steps.push(StepReport::ok("memorial_cleanup", elapsed_ms(t)));
    if memorial.retired_now > 0 {
        info!(retired = memorial.retired_now, "memorial entities retired");
    }

    let t = Instant::now();
    let fetched = FeedClient::new().fetch_all().await;
    counts.sources_ok = fetched.feeds_ok;
    counts.sources_failed = fetched.feeds_failed.len();
    counts.articles_fetched = fetched.articles.len();
    counts.parse_failures = fetched.items_skipped;
    if fetched.feeds_ok == 0 && !fetched.feeds_failed.is_empty() {
        steps.push(StepReport::failed("fetch", elapsed_ms(t), "every source failed"));
    } else {
        steps.push(StepReport::ok("fetch", elapsed_ms(t)));
    }

    // Alias collisions surface here, before the first state write
    let t = Instant::now();
    let batch = ctx.process_batch(fetched.articles, now)?;
    counts.previously_seen = batch.previously_seen;
    counts.articles_accepted = batch.accepted;
    counts.articles_rejected = batch.rejected;
    counts.duplicates_removed = batch.duplicates_removed;
    steps.push(StepReport::ok("process", elapsed_ms(t)));

    let t = Instant::now();
    counts.entities_updated = ctx.rescore(now);
    steps.push(StepReport::ok("score", elapsed_ms(t)));

    let t = Instant::now();
    counts.candidates_promoted = ctx.promote_candidates(now);
    let matured = ctx.promote_matured(now);
    steps.push(StepReport::ok("discover", elapsed_ms(t)));
    if matured > 0 {
        info!(matured, "probation entities activated");
    }

    ctx.save(state)?;

    if skip_publish {
        steps.push(StepReport::skipped("posts", "skip_publish set"));
        steps.push(StepReport::skipped("bluesky", "skip_publish set"));
    } else {
        let t = Instant::now();
        match PostWriter::new(posts_dir).write_all(&batch.kept) {
            Ok(report) => {
                counts.posts_written = report.written;
                steps.push(StepReport::ok("posts", elapsed_ms(t)));
            }
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "post generation failed");
                steps.push(StepReport::failed("posts", elapsed_ms(t), e.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        match BlueskyCredentials::from_env() {
            None => {
                info!("bluesky credentials not set, skipping republish");
                steps.push(StepReport::skipped("bluesky", "credentials not configured"));
            }
            Some(credentials) => {
                let t = Instant::now();
                match republish_step(state, credentials, &batch.kept, now).await {
                    Ok(republished) => {
                        counts.republished = republished;
                        steps.push(StepReport::ok("bluesky", elapsed_ms(t)));
                    }
                    Err(e) if e.is_recoverable() => {
                        warn!(error = %e, "bluesky republish failed");
                        steps.push(StepReport::failed("bluesky", elapsed_ms(t), e.to_string()));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    let summary = RunSummary {
        started_at,
        finished_at: Utc::now(),
        steps,
        counts,
    };
    state.save_summary(&summary)?;

    info!(
        duration_ms = summary.duration_ms(),
        success_rate = summary.success_rate(),
        fetched = counts.articles_fetched,
        accepted = counts.articles_accepted,
        kept = batch.kept.len(),
        posts = counts.posts_written,
        republished = counts.republished,
        "run complete"
    );
    for failed in summary.failed_steps() {
        warn!(
            step = %failed.name,
            detail = failed.detail.as_deref().unwrap_or(""),
            "step failed this run"
        );
    }
    Ok(())
}

/// Republish against the posted ledger. The ledger is saved even when
/// posting fails partway so successful records are never replayed.
async fn republish_step(
    state: &StateDir,
    credentials: BlueskyCredentials,
    articles: &[Article],
    now: DateTime<Utc>,
) -> GossResult<usize> {
    let mut posted = state.load_posted()?;
    let client = BlueskyClient::new(credentials);
    let outcome = client.republish(articles, &mut posted, now).await;
    state.save_posted(&posted)?;
    outcome
}

fn cmd_score(state: &StateDir) -> Result<()> {
    let now = Utc::now();
    let mut ctx = ScoringContext::load(state, now)?;
    let updated = ctx.rescore(now);
    ctx.save(state)?;
    info!(updated, "roster rescored from persisted mentions");
    print_temperatures(&ctx.roster);
    Ok(())
}

fn cmd_discover(state: &StateDir) -> Result<()> {
    let now = Utc::now();
    let mut ctx = ScoringContext::load(state, now)?;
    let promoted = ctx.promote_candidates(now);
    let matured = ctx.promote_matured(now);
    ctx.save(state)?;
    println!(
        "Promoted {} candidate(s), activated {} matured entit{}",
        promoted,
        matured,
        if matured == 1 { "y" } else { "ies" }
    );
    println!(
        "{} candidate(s) still under observation",
        ctx.candidates.len()
    );
    Ok(())
}

fn cmd_cleanup(state: &StateDir) -> Result<()> {
    let now = Utc::now();
    let mut ctx = ScoringContext::load(state, now)?;
    let report = ctx.cleanup_memorials(now);
    ctx.save(state)?;
    println!(
        "Memorial entities kept: {}, retired: {}",
        report.memorial_kept, report.retired_now
    );
    Ok(())
}

async fn cmd_publish(state: &StateDir, posts_dir: &Path) -> Result<()> {
    let now = Utc::now();
    let Some(credentials) = BlueskyCredentials::from_env() else {
        println!("Bluesky credentials not configured; set BLUESKY_HANDLE and BLUESKY_PASSWORD");
        return Ok(());
    };

    let articles = scan_recent_posts(posts_dir, now);
    if articles.is_empty() {
        println!("No recent posts found under {}", posts_dir.display());
        return Ok(());
    }

    let mut posted = state.load_posted()?;
    let client = BlueskyClient::new(credentials);
    let outcome = client.republish(&articles, &mut posted, now).await;
    state.save_posted(&posted)?;
    println!("Republished {} post(s)", outcome?);
    Ok(())
}

fn cmd_status(state: &StateDir) -> Result<()> {
    let now = Utc::now();
    let ctx = ScoringContext::load(state, now)?;
    print_temperatures(&ctx.roster);
    println!(
        "{} discovery candidate(s) under observation",
        ctx.candidates.len()
    );

    match state.load_summary()? {
        Some(summary) => {
            println!();
            println!(
                "Last run {} | {} ms | success rate {:.0}%",
                summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
                summary.duration_ms(),
                summary.success_rate() * 100.0
            );
            let c = summary.counts;
            println!(
                "  fetched {} | seen {} | accepted {} | rejected {} | duplicates {} | posts {} | republished {}",
                c.articles_fetched,
                c.previously_seen,
                c.articles_accepted,
                c.articles_rejected,
                c.duplicates_removed,
                c.posts_written,
                c.republished
            );
            for step in &summary.steps {
                println!(
                    "  {:<18} {:<8} {} ms{}",
                    step.name,
                    format!("{:?}", step.outcome).to_lowercase(),
                    step.duration_ms,
                    step.detail
                        .as_deref()
                        .map(|d| format!("  ({})", d))
                        .unwrap_or_default()
                );
            }
        }
        None => println!("\nNo run summary recorded yet"),
    }
    Ok(())
}

fn print_temperatures(roster: &[Entity]) {
    let report = TemperatureReport::from_roster(roster);
    println!("Roster: {} entit{}", roster.len(), if roster.len() == 1 { "y" } else { "ies" });
    for (status, count) in &report.tier_counts {
        if *count > 0 {
            println!("  {:<10} {}", status.as_str(), count);
        }
    }
    if !report.hottest.is_empty() {
        println!("\nHottest:");
        for snap in &report.hottest {
            println!(
                "  {:>5.1}  {:<24} {:+.1}",
                snap.temperature, snap.name, snap.change
            );
        }
    }
    if !report.biggest_risers.is_empty() {
        println!("\nRising fastest:");
        for snap in &report.biggest_risers {
            println!("  {:+.1}  {}", snap.change, snap.name);
        }
    }
    if !report.biggest_fallers.is_empty() {
        println!("\nCooling fastest:");
        for snap in &report.biggest_fallers {
            println!("  {:+.1}  {}", snap.change, snap.name);
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
