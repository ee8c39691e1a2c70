//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Logging
//!
//! Diagnostics are written to stderr through `tracing`. `RUST_LOG` takes
//! precedence; otherwise the level follows `--debug`/`--quiet` (default
//! `info`). Stdout carries only command results.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::ui::output::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    init_logging(verbosity);

    let ctx = commands::Context {
        settings: cli.settings.clone(),
        verbosity,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install the global `tracing` subscriber.
///
/// An already installed subscriber is left in place.
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
