//! rollout-stats: episode accounting and windowed reporting for vectorized
//! RL rollouts.
//!
//! Subcommands:
//!
//! - `simulate` -- Drive a seeded mock vectorized environment through the
//!   windowed reporter, optionally writing JSON-lines metrics.
//! - `inspect`  -- Summarise a JSON-lines metrics file written by `simulate`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ordered_float::OrderedFloat;
use tracing_subscriber::EnvFilter;

use rollout_stats::config::AppConfig;
use rollout_stats::env::MockVecEnv;
use rollout_stats::rollout::sink::read_jsonl_records;
use rollout_stats::rollout::{
    collect_steps, ConsoleSink, JsonlMetricsWriter, MetricsSink, NoopMetrics, RolloutStats,
    StdoutConsole, TracingConsole,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Episode accounting and risk-adjusted reporting for vectorized rollouts.
#[derive(Parser)]
#[command(name = "rollout-stats", version, about)]
struct Cli {
    /// Path to a JSON configuration file (uses defaults if not provided).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the mock vectorized environment and report episode windows.
    Simulate {
        /// Number of lockstep timesteps to run.
        #[arg(long, default_value_t = 10_000)]
        steps: u64,

        /// Override the number of environment slots.
        #[arg(long)]
        num_envs: Option<usize>,

        /// Override the report window (negative disables reporting).
        #[arg(long, allow_hyphen_values = true)]
        window: Option<i64>,

        /// Only record the mean score per window.
        #[arg(long)]
        simple: bool,

        /// Override the environment RNG seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Write metrics as JSON lines to this path.
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// Emit window reports as log events instead of printing them.
        #[arg(long)]
        log_reports: bool,
    },

    /// Summarise a metrics file written by `simulate --metrics`.
    Inspect {
        /// Path to the JSON-lines metrics file.
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Reads RUST_LOG, defaults to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str::<AppConfig>(&text)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        }
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Simulate {
            steps,
            num_envs,
            window,
            simple,
            seed,
            metrics,
            log_reports,
        } => {
            if let Some(n) = num_envs {
                config.rollout.num_envs = n;
            }
            if let Some(w) = window {
                config.rollout.window_size = w;
            }
            if let Some(s) = seed {
                config.env.seed = s;
            }
            config.rollout.simple |= simple;
            config.validate().context("Invalid configuration")?;

            match (metrics, log_reports) {
                (Some(path), false) => {
                    cmd_simulate(&config, steps, open_metrics(&path)?, StdoutConsole)
                }
                (Some(path), true) => {
                    cmd_simulate(&config, steps, open_metrics(&path)?, TracingConsole)
                }
                (None, false) => cmd_simulate(&config, steps, NoopMetrics, StdoutConsole),
                (None, true) => cmd_simulate(&config, steps, NoopMetrics, TracingConsole),
            }
        }
        Commands::Inspect { path } => cmd_inspect(&path),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn open_metrics(path: &Path) -> Result<JsonlMetricsWriter> {
    let writer = JsonlMetricsWriter::create(path)?;
    tracing::info!(
        path = %writer.path().display(),
        run_id = writer.run_id(),
        "Writing metrics"
    );
    Ok(writer)
}

fn cmd_simulate<M: MetricsSink, C: ConsoleSink>(
    config: &AppConfig,
    steps: u64,
    metrics: M,
    console: C,
) -> Result<()> {
    tracing::info!(
        steps,
        num_envs = config.rollout.num_envs,
        window = config.rollout.window_size,
        seed = config.env.seed,
        "Starting simulated rollout"
    );

    let mut env = MockVecEnv::new(config.rollout.num_envs, config.env.clone())?;
    let mut stats = RolloutStats::from_config(&config.rollout, metrics, console)?;

    collect_steps(&mut env, &mut stats, steps)?;
    report_summary(&stats);
    Ok(())
}

fn report_summary<M: MetricsSink, C: ConsoleSink>(stats: &RolloutStats<M, C>) {
    println!();
    println!("Finalized episodes: {}", stats.len());
    println!("Total steps:        {}", stats.history().total_steps());
    println!("Windows reported:   {}", stats.epochs().len());

    match stats.stats() {
        Ok(all) => println!("All episodes:       {all}"),
        Err(_) => println!("All episodes:       none finished"),
    }
    if let Some(best) = stats.best_epoch() {
        println!("Best window:        {best}");
        match serde_json::to_string_pretty(&best.summary()) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialise best window"),
        }
    }
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let records = read_jsonl_records(path)?;

    println!("Metrics file: {}", path.display());
    println!("  Records: {}", records.len());
    let Some(last) = records.last() else {
        return Ok(());
    };
    println!("  Run: {}", last.run_id);
    println!("  Last step: {}", last.step);
    println!(
        "  Written: {} .. {}",
        records[0].wall_time.format("%Y-%m-%d %H:%M:%S UTC"),
        last.wall_time.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let best = records
        .iter()
        .filter_map(|r| r.values.get("result").map(|v| (OrderedFloat(*v), r)))
        .max_by_key(|(score, _)| *score);
    match best {
        Some((score, record)) => {
            println!("  Best result: {:.2} at step {}", score.0, record.step);
            for (name, value) in &record.values {
                println!("    {name}: {value:.4}");
            }
        }
        None => println!("  No `result` scalars (simple mode run)"),
    }

    Ok(())
}
