//! Service launcher.
//!
//! Runs the monitoring endpoint (and storage initialization, when a database
//! is configured) under the lifecycle launcher until SIGINT/SIGTERM.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ Bootstrap ──▶ logging ──▶ Launcher
//!                                              │
//!                       ┌──────────────────────┼───────────────────────┐
//!                       ▼                      ▼                       ▼
//!               StorageInitializer     MonitoringService       business services
//!               (sequential, once)     (/health /ready         (concurrent)
//!                 └─▶ Registry          /metrics)
//!
//!   SIGINT/SIGTERM ──▶ Shutdown ──▶ cancel ──▶ stop in reverse order
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use service_launcher::config::{load_config, AppConfig};
use service_launcher::lifecycle::bootstrap;

#[derive(Parser)]
#[command(name = "service-launcher")]
#[command(about = "Run services under an ordered startup/shutdown lifecycle", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };

    if cli.check {
        println!("configuration ok: service `{}`", config.service.name);
        return ExitCode::SUCCESS;
    }

    match bootstrap(config, Vec::new()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting with failure");
            eprintln!("fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
