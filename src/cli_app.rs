//! Top-level CLI definition and dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use drive_telemetry::core::config::Config;
use drive_telemetry::core::errors::Result;
use drive_telemetry::pipeline::signals::SignalHandler;
use drive_telemetry::pipeline::{ingest, simulate};

/// dtp — synthetic vehicle telemetry pipeline.
#[derive(Debug, Parser)]
#[command(
    name = "dtp",
    author,
    version,
    about = "Drive Telemetry Pipeline - synthetic telemetry generator and ingester",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate synthetic telemetry into the shared log.
    Simulate(SimulateArgs),
    /// Tail the shared log, classify events, persist to the store.
    Ingest(IngestArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct SimulateArgs {
    /// Vehicle identifier stamped on every sample.
    #[arg(long, value_name = "ID")]
    vehicle_id: Option<String>,
    /// Samples per second.
    #[arg(long, value_name = "HZ")]
    rate_hz: Option<f64>,
    /// RNG seed for reproducible runs.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Telemetry log path.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args, Default)]
struct IngestArgs {
    /// SQLite database path.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Sleep between tail polls, in milliseconds.
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,
    /// Disable the auxiliary events log.
    #[arg(long)]
    no_events_log: bool,
}

/// Load config, log its identity, and dispatch the selected loop.
pub fn run(cli: &Cli) -> Result<()> {
    let mut cfg = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Simulate(args) => {
            if let Some(vehicle_id) = &args.vehicle_id {
                cfg.simulator.vehicle_id.clone_from(vehicle_id);
            }
            if let Some(rate_hz) = args.rate_hz {
                cfg.simulator.rate_hz = rate_hz;
            }
            if let Some(seed) = args.seed {
                cfg.simulator.seed = seed;
            }
            if let Some(out) = &args.out {
                cfg.paths.telemetry_log.clone_from(out);
            }
            cfg.validate()?;
            log_startup(&cfg, "simulate")?;
            simulate::run(&cfg, &SignalHandler::new())
        }
        Command::Ingest(args) => {
            if let Some(db) = &args.db {
                cfg.store.db_path.clone_from(db);
            }
            if let Some(poll_interval_ms) = args.poll_interval_ms {
                cfg.ingest.poll_interval_ms = poll_interval_ms;
            }
            if args.no_events_log {
                cfg.ingest.events_log_enabled = false;
            }
            cfg.validate()?;
            log_startup(&cfg, "ingest")?;
            ingest::run(&cfg, &SignalHandler::new())
        }
    }
}

fn log_startup(cfg: &Config, command: &str) -> Result<()> {
    eprintln!(
        "[DTP-CLI] {command} starting, config {} (hash {})",
        cfg.paths.config_file.display(),
        cfg.stable_hash()?
    );
    Ok(())
}
