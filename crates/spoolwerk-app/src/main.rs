// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk: single-printer print dispatcher
//
// Entry point. Loads configuration, initialises logging, and drives a batch
// of documents through the dispatcher on the dry-run printer.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spoolwerk_core::config::DispatcherConfig;
use spoolwerk_core::error::Result;
use spoolwerk_print::{DryPrinter, PrintDispatcher};

use services::data_dir::default_config_path;
use services::jobs::{load_jobs, run_jobs};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a job file on the dry-run printer and report the outcome as JSON
    Run {
        /// JSON array of documents
        jobs: PathBuf,

        /// Configuration file (default: the config.json in the data directory)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Cancel the job with this type name once it starts printing
        #[arg(long = "cancel", value_name = "TYPE_NAME")]
        cancel: Vec<String>,

        /// Stop the dispatcher after this many milliseconds
        #[arg(long, value_name = "MS")]
        stop_after_ms: Option<u64>,
    },

    /// Write the default configuration
    InitConfig {
        /// Destination (default: the config.json in the data directory)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match execute(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "spoolwerk failed");
            eprintln!("spoolwerk: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command) -> Result<()> {
    match command {
        Command::Run {
            jobs,
            config,
            cancel,
            stop_after_ms,
        } => {
            let config = resolve_config(config.as_deref())?;
            init_logging(&config);
            tracing::info!("Spoolwerk starting");

            let documents = load_jobs(&jobs)?;
            let printer = Arc::new(DryPrinter::with_speed(config.dry_run_speed));
            let dispatcher = PrintDispatcher::with_config(printer, &config);

            let report = run_jobs(
                &dispatcher,
                documents,
                &cancel,
                stop_after_ms.map(Duration::from_millis),
            )
            .await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::InitConfig { path } => {
            let path = path.unwrap_or_else(default_config_path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            DispatcherConfig::default().save(&path)?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}

/// An explicit `--config` must exist; the default location is optional.
fn resolve_config(explicit: Option<&Path>) -> Result<DispatcherConfig> {
    match explicit {
        Some(path) => DispatcherConfig::load(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                DispatcherConfig::load(&path)
            } else {
                Ok(DispatcherConfig::default())
            }
        }
    }
}

fn init_logging(config: &DispatcherConfig) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();
}
