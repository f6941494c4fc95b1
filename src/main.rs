//! Sandwich Scan
//!
//! Batch detector: reads a JSONL file of AMM trade events, scans every pool
//! for sandwich-shaped windows, classifies each one and writes attack
//! records as JSONL (stdout when no output file is given).
//!
//! Usage:
//!   sandwich-scan --events data/trades.jsonl
//!   sandwich-scan --events data/trades.jsonl --config config/detector.toml \
//!       --output out/attacks.jsonl --summary out/summary.json --concurrent
//!
//! Flags can also come from the environment (or a `.env` file), e.g.
//! `SANDWICH_EVENTS`, `SANDWICH_CONFIG`.
//!
//! Created: 2026-10-18

use anyhow::{Context, Result};
use clap::Parser;
use sandwich_detector::detection::{BurstTimeline, NoOracle, OracleSignal, SandwichDetector};
use sandwich_detector::report::{read_events_jsonl, write_records, write_records_jsonl, RunSummary};
use sandwich_detector::DetectorConfig;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "sandwich-scan",
    about = "Detect and classify sandwich attacks in AMM trade events"
)]
struct Args {
    /// JSONL file of trade events
    #[arg(short, long, env = "SANDWICH_EVENTS")]
    events: PathBuf,

    /// TOML detector configuration (defaults apply when omitted)
    #[arg(short, long, env = "SANDWICH_CONFIG")]
    config: Option<PathBuf>,

    /// JSONL output for attack records (default: stdout)
    #[arg(short, long, env = "SANDWICH_OUTPUT")]
    output: Option<PathBuf>,

    /// Write a run summary as pretty JSON
    #[arg(long, env = "SANDWICH_SUMMARY")]
    summary: Option<PathBuf>,

    /// JSON file of oracle burst timestamps
    #[arg(long, env = "SANDWICH_ORACLE_BURSTS")]
    oracle_bursts: Option<PathBuf>,

    /// Scan pools in parallel
    #[arg(long)]
    concurrent: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "SANDWICH_LOG_JSON")]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so stdout stays a clean record stream
    if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        fmt().with_env_filter(filter).with_writer(io::stderr).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.log_json);

    info!("===========================================");
    info!("   Sandwich Attack Detector");
    info!("===========================================");

    let config = match &args.config {
        Some(path) => {
            info!("Config file: {}", path.display());
            DetectorConfig::load(path)?
        }
        None => {
            info!("No config file given, using defaults");
            DetectorConfig::default()
        }
    };
    let detector = SandwichDetector::new(config).context("Invalid detector configuration")?;

    let oracle: Arc<dyn OracleSignal> = match &args.oracle_bursts {
        Some(path) => {
            let timeline = BurstTimeline::load(path)?;
            info!("Loaded {} oracle bursts from {}", timeline.burst_count(), path.display());
            Arc::new(timeline)
        }
        None => Arc::new(NoOracle),
    };

    let loaded = read_events_jsonl(&args.events)?;
    info!(
        "Read {} events from {} ({} malformed lines skipped)",
        loaded.events.len(),
        args.events.display(),
        loaded.malformed_lines
    );
    let events_read = loaded.events.len();

    let report = if args.concurrent {
        Arc::new(detector)
            .detect_concurrent(loaded.events, oracle)
            .await
    } else {
        detector.detect(&loaded.events, &*oracle)
    };

    match &args.output {
        Some(path) => {
            write_records_jsonl(path, &report.records)?;
            info!("Wrote {} records to {}", report.records.len(), path.display());
        }
        None => write_records(io::stdout().lock(), &report.records)?,
    }

    let summary = RunSummary::from_report(&report, events_read, loaded.malformed_lines);
    summary.log();
    if let Some(path) = &args.summary {
        summary.write(path)?;
        info!("Summary written to {}", path.display());
    }

    Ok(())
}
