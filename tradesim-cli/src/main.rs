//! Tradesim CLI — run and check candle simulation sessions.
//!
//! Commands:
//! - `run`: run one invocation of a session from a TOML config and a chart
//! - `check`: validate a config and print its session id and parameters

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tradesim_core::domain::ExitReason;
use tradesim_core::engine::StopToken;
use tradesim_runner::{run_session, SessionConfig, SessionReport};

#[derive(Parser)]
#[command(
    name = "tradesim",
    about = "Tradesim CLI — candle-driven backtest simulation sessions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one invocation of a session.
    Run {
        /// Path to the session TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Chart JSON file, or a directory of YYYY-MM-DD.json files for
        /// day-partitioned sessions.
        #[arg(long)]
        chart: PathBuf,

        /// Directory holding one sub-directory per session.
        #[arg(long, default_value = "sessions")]
        output_dir: PathBuf,

        /// Continue from the snapshot saved by the previous invocation.
        #[arg(long, default_value_t = false)]
        resume: bool,
    },
    /// Validate a session config.
    Check {
        /// Path to the session TOML config.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            chart,
            output_dir,
            resume,
        } => run_cmd(config, chart, output_dir, resume),
        Commands::Check { config } => check_cmd(config),
    }
}

fn run_cmd(config_path: PathBuf, chart: PathBuf, output_dir: PathBuf, resume: bool) -> Result<()> {
    let config = SessionConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let token = StopToken::new();
    tracing::debug!(
        config = %config_path.display(),
        chart = %chart.display(),
        resume,
        "starting session run"
    );

    let report = run_session(&config, &chart, &output_dir, resume, &token)?;
    print_report(&report);

    if report.summary.exit_reason == Some(ExitReason::StaleData) {
        eprintln!("WARNING: market data ends before the session starts; refresh it and run again");
    }
    Ok(())
}

fn check_cmd(config_path: PathBuf) -> Result<()> {
    let config = SessionConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    println!("Session:        {}", config.session_id()?);
    println!("Time frame:     {}", config.time_frame);
    println!(
        "Range:          {} to {}",
        config.initial_datetime.to_rfc3339_opts(SecondsFormat::Secs, true),
        config.final_datetime.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    println!("Dependencies:   {}", config.dependencies.len());
    println!();
    println!("{}", serde_json::to_string_pretty(&config.session_parameters())?);
    Ok(())
}

fn print_report(report: &SessionReport) {
    let summary = &report.summary;
    println!();
    println!("=== Session Run ===");
    println!("Session:        {}", report.session_id);
    println!("Chart:          {}", report.chart.display());
    println!("Mode:           {:?}", report.mode);
    match summary.start_index {
        Some(start) => println!("Start index:    {start}"),
        None => println!("Start index:    -"),
    }
    println!("Candles:        {}", summary.candles_processed);
    println!("Records:        {}", report.records_appended);
    println!(
        "Exit:           {}",
        summary
            .exit_reason
            .map(|r| r.as_str())
            .unwrap_or("loop exhausted")
    );
    println!("Head of market: {}", summary.head_of_the_market);
    println!("Next index:     {}", report.snapshot.candle.index);
    if let Some(reason) = &report.stop_reason {
        println!("Session stop:   {reason}");
    }
    for error in &report.error_messages {
        println!("ERROR: {error}");
    }
    println!("Output:         {}", report.run_dir.display());
}
