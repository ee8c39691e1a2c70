//! cli::commands::close
//!
//! Bulk-transition the issues matching a query.
//!
//! # Design
//!
//! Issues are handled one at a time, in search order:
//! - fetch the transitions the issue currently offers
//! - execute the target transition only if it is among them
//! - otherwise leave the issue alone
//!
//! The first failure stops the run. A rejected query exits with status 1;
//! a failure on a single issue is reported but exits 0, which callers
//! scripting around `blm close` rely on.
//!
//! # Example
//!
//! ```bash
//! blm close --query 'project = OPS AND labels = stale' \
//!     --user bot --password "$JIRA_PASSWORD" --comment 'Closed as stale'
//! ```

use std::process::ExitCode;

use anyhow::Result;
use thiserror::Error;

use super::Context;
use crate::core::config::Settings;
use crate::core::types::IssueKey;
use crate::tracker::jira::JiraTracker;
use crate::tracker::{Tracker, TrackerError, TransitionRequest};
use crate::ui::output::{self, Verbosity};

/// Errors that stop a close run.
#[derive(Debug, Error)]
pub enum CloseError {
    /// The search was rejected.
    #[error("JQL Error, {0}")]
    Query(#[source] TrackerError),

    /// Listing the transitions of an issue failed.
    #[error("cannot list transitions of {key}: {source}")]
    Transitions {
        key: IssueKey,
        #[source]
        source: TrackerError,
    },

    /// Executing the transition failed.
    #[error("cannot transition {key}: {source}")]
    Transition {
        key: IssueKey,
        #[source]
        source: TrackerError,
    },
}

impl CloseError {
    /// Process exit status for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            CloseError::Query(_) => 1,
            CloseError::Transitions { .. } | CloseError::Transition { .. } => 0,
        }
    }
}

/// What to close and how.
#[derive(Debug, Clone)]
pub struct CloseOptions {
    /// Query selecting the issues
    pub query: String,
    /// Upper bound on issues fetched
    pub max_results: u32,
    /// Transition executed on each issue, with its fields
    pub request: TransitionRequest,
    /// List instead of transitioning
    pub dry_run: bool,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseSummary {
    /// Issues returned by the query
    pub matched: usize,
    /// Issues transitioned (or that would be, on a dry run)
    pub transitioned: Vec<IssueKey>,
    /// Issues that did not offer the transition
    pub skipped: Vec<IssueKey>,
}

impl CloseSummary {
    /// Counts line, followed by the skipped keys when there are any.
    pub fn report(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would transition" } else { "transitioned" };
        let mut text = format!(
            "{} matched, {} {}, {} skipped",
            self.matched,
            verb,
            self.transitioned.len(),
            self.skipped.len()
        );
        if !self.skipped.is_empty() {
            text.push_str("\nTransition not offered by:\n");
            text.push_str(&output::format_list(&self.skipped, "  "));
        }
        text
    }
}

/// Run the close command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
#[allow(clippy::too_many_arguments)]
pub fn close(
    ctx: &Context,
    query: &str,
    user: &str,
    password: &str,
    comment: &str,
    transition_id: Option<&str>,
    dry_run: bool,
) -> Result<ExitCode> {
    let settings = Settings::load(ctx.settings.as_deref())?;
    let tracker = JiraTracker::with_timeout(
        settings.tracker_url()?,
        user,
        password,
        settings.tracker_timeout(),
    )?;
    tracing::debug!(url = %tracker.base_url(), "using tracker");

    let options = CloseOptions {
        query: query.to_string(),
        max_results: settings.max_results(),
        request: TransitionRequest {
            transition_id: transition_id
                .unwrap_or(settings.close_transition_id())
                .to_string(),
            comment: comment.to_string(),
            resolution_id: settings.close_resolution_id().to_string(),
            assignee: user.to_string(),
            worklog: settings.close_worklog().map(str::to_string),
        },
        dry_run,
    };

    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(close_matching(&tracker, &options, ctx.verbosity)) {
        Ok(summary) => {
            output::print(summary.report(dry_run), ctx.verbosity);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("close stopped: {}", e);
            output::result(&e);
            Ok(ExitCode::from(e.exit_status()))
        }
    }
}

/// Transition every issue matching the query that offers the transition.
pub async fn close_matching(
    tracker: &dyn Tracker,
    options: &CloseOptions,
    verbosity: Verbosity,
) -> Result<CloseSummary, CloseError> {
    let issues = tracker
        .search_issues(&options.query, options.max_results)
        .await
        .map_err(CloseError::Query)?;
    tracing::info!(issues = issues.len(), "matched issues");

    let mut summary = CloseSummary {
        matched: issues.len(),
        ..Default::default()
    };
    let target = &options.request.transition_id;

    for issue in issues {
        let key = issue.key;
        let transitions = tracker
            .transitions(&key)
            .await
            .map_err(|source| CloseError::Transitions {
                key: key.clone(),
                source,
            })?;

        if !transitions.iter().any(|t| &t.id == target) {
            tracing::debug!(issue = %key, transition = %target, "transition not offered");
            summary.skipped.push(key);
            continue;
        }

        if options.dry_run {
            output::print(format!("{} would be transitioned", key), verbosity);
        } else {
            tracker
                .transition_issue(&key, &options.request)
                .await
                .map_err(|source| CloseError::Transition {
                    key: key.clone(),
                    source,
                })?;
            output::print(format!("{} transitioned", key), verbosity);
        }
        summary.transitioned.push(key);
    }

    Ok(summary)
}
