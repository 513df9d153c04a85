//! Pool ledger command line
//!
//! Replays JSON operation scripts against an in-memory ledger, prints the
//! effective configuration, and inspects saved snapshots.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_config::{load_config, LedgerConfig};
use pool_ledger::{
    telemetry, LedgerOptions, ReplayScript, Replayer, SnapshotSummary, Stateful,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "pool-ledger")]
#[command(about = "Two-asset liquidity pool ledger")]
#[command(version)]
struct Args {
    /// Configuration file path (defaults to config/pool_ledger.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a JSON script of ledger operations and print the report
    Replay {
        script: PathBuf,

        /// Write a snapshot of the final ledger here (overrides storage.snapshot_path)
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
    },
    /// Print the pools, stats and sequence stored in a snapshot
    Inspect { snapshot: PathBuf },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    telemetry::init_tracing(&config.logging)?;

    match args.command {
        Command::Replay {
            script,
            snapshot_out,
        } => replay(&config, &script, snapshot_out),
        Command::Inspect { snapshot } => inspect(&snapshot),
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn replay(config: &LedgerConfig, script: &Path, snapshot_out: Option<PathBuf>) -> Result<()> {
    let options = LedgerOptions::from_settings(&config.engine)?;
    let script = ReplayScript::from_file(script)?;
    info!(
        "Replaying {} steps (policy {}, minimum withdrawal {})",
        script.steps.len(),
        options.deposit_policy,
        options.minimum_withdrawal
    );

    let mut replayer = Replayer::new(options);
    let report = replayer.run(&script);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to render report")?
    );

    if let Some(path) = snapshot_out.or_else(|| config.storage.snapshot_path.clone()) {
        let bytes = replayer.ledger().snapshot()?;
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write snapshot {:?}", path))?;
        info!("Wrote snapshot ({} bytes) to {:?}", bytes.len(), path);
    }
    Ok(())
}

fn inspect(snapshot: &Path) -> Result<()> {
    let bytes =
        std::fs::read(snapshot).with_context(|| format!("Failed to read snapshot {:?}", snapshot))?;

    let summary = SnapshotSummary::decode(&bytes)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to render snapshot")?
    );
    Ok(())
}
