//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the runtime settings
//! 2. Builds the tracker (and, for `report`, the transport)
//! 3. Runs the async flow on a tokio runtime
//! 4. Maps the outcome to an exit status
//!
//! The async flows (`report::collect`, `close::close_matching`) take trait
//! objects, so they run unchanged against the mock tracker and transport.

pub mod close;
pub mod report;

pub use close::{close, close_matching, CloseError, CloseOptions, CloseSummary};
pub use report::{collect, payload_for, report, run_report, ReportError};

use std::path::PathBuf;
use std::process::ExitCode;

use crate::cli::args::Command;
use crate::ui::output::Verbosity;
use anyhow::Result;

/// Settings shared by every command, taken from the global flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit settings file (`--settings`)
    pub settings: Option<PathBuf>,
    /// Output verbosity
    pub verbosity: Verbosity,
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Report { config, dry_run } => report::report(ctx, &config, dry_run),
        Command::Close {
            query,
            user,
            password,
            comment,
            transition_id,
            dry_run,
        } => close::close(
            ctx,
            &query,
            &user,
            &password,
            &comment,
            transition_id.as_deref(),
            dry_run,
        ),
    }
}
