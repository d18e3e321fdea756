//! Warden daemon binary entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use warden_core::WardenConfig;
use warden_daemon::Daemon;

/// Warden - runtime containment monitor for AI workloads.
#[derive(Parser, Debug)]
#[command(name = "warden", version, about)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = "/etc/warden/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<DaemonCommand>,
}

#[derive(Subcommand, Debug)]
enum DaemonCommand {
    /// Run the monitor (all loops, aggregator, signal handling).
    Run,
    /// Load and validate the configuration, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter =
        EnvFilter::try_from_env("WARDEN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(config = %args.config.display(), "warden starting");
    let config = WardenConfig::load(&args.config).context("loading configuration")?;

    match args.command {
        Some(DaemonCommand::Run) | None => Daemon::new(config)?.run().await,
        Some(DaemonCommand::CheckConfig) => {
            println!("configuration OK: {}", args.config.display());
            Ok(())
        }
    }
}
