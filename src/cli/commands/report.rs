//! cli::commands::report
//!
//! Count the open backlog and push the result to Zabbix.
//!
//! # Design
//!
//! The run always produces a payload. Any failure while loading the labels
//! file, talking to Jira or building the counters is logged and replaced
//! by the failure payload (`exitcode = 0`), so the monitoring side sees a
//! failed run instead of stale values. Only a failure to deliver the
//! payload itself makes the process exit non-zero.
//!
//! # Example
//!
//! ```bash
//! blm report --config labels_list.yaml
//! blm report --dry-run
//! ```

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use thiserror::Error;

use super::Context;
use crate::core::config::{ConfigError, LabelsConfig, Settings};
use crate::metrics::payload;
use crate::metrics::{aggregate, BacklogReport, ProblemTagDetector};
use crate::tracker::jira::JiraTracker;
use crate::tracker::{Tracker, TrackerError};
use crate::transport::zabbix::ZabbixSender;
use crate::transport::{Payload, SendSummary, Transport, TransportError};
use crate::ui::output;

/// Errors that turn a report run into the failure payload.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Labels file or settings unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Jira call failed.
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// The configured priority pattern is not a valid regex.
    #[error("invalid priority pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The discovery document could not be serialized.
    #[error("cannot render payload: {0}")]
    Render(#[from] serde_json::Error),
}

/// Run the report command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn report(ctx: &Context, config: &Path, dry_run: bool) -> Result<ExitCode> {
    let settings = Settings::load(ctx.settings.as_deref())?;
    if let Some(path) = settings.loaded_from() {
        tracing::debug!(path = %path.display(), "loaded settings");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(report_async(ctx, &settings, config, dry_run))
}

async fn report_async(
    ctx: &Context,
    settings: &Settings,
    config: &Path,
    dry_run: bool,
) -> Result<ExitCode> {
    let host = settings.zabbix_host()?;
    // Resolved before any Jira call.
    let server = if dry_run {
        None
    } else {
        Some(settings.zabbix_server()?)
    };

    let outcome = match prepare(settings, config) {
        Ok((labels, tracker)) => collect(&tracker, &labels, settings).await,
        Err(e) => Err(e),
    };
    let payload = payload_for(host, outcome);

    let Some(server) = server else {
        output::result(serde_json::to_string_pretty(&payload.hosts)?);
        return Ok(ExitCode::SUCCESS);
    };

    let sender =
        ZabbixSender::with_timeout(server, settings.zabbix_port(), settings.zabbix_timeout());
    tracing::info!(
        transport = sender.name(),
        address = %sender.address(),
        items = payload.item_count(),
        "sending report"
    );
    let summary = deliver(&sender, &payload)
        .await
        .with_context(|| format!("sending report to {}", sender.address()))?;
    output::print(format!("Sent report: {}", summary), ctx.verbosity);
    Ok(ExitCode::SUCCESS)
}

/// Load the labels file and build the Jira client from settings.
fn prepare(
    settings: &Settings,
    config: &Path,
) -> Result<(LabelsConfig, JiraTracker), ReportError> {
    let labels = LabelsConfig::load(config)?;
    let tracker = JiraTracker::with_timeout(
        settings.tracker_url()?,
        settings.tracker_user()?,
        settings.tracker_password()?,
        settings.tracker_timeout(),
    )?;
    tracing::debug!(url = %tracker.base_url(), "using tracker");
    Ok((labels, tracker))
}

/// Query the backlog and compute everything the payload carries.
///
/// Problem-tagged issues are detected first and excluded from every count.
pub async fn collect(
    tracker: &dyn Tracker,
    labels: &LabelsConfig,
    settings: &Settings,
) -> Result<BacklogReport, ReportError> {
    let detector = ProblemTagDetector::new(settings.priority_pattern())?;
    let jql = settings.report_jql()?;

    let info = tracker.server_info().await?;
    tracing::debug!(
        tracker = tracker.name(),
        server = %info.base_url,
        version = %info.version,
        "tracker session ok"
    );

    let issues = tracker.search_issues(&jql, settings.max_results()).await?;
    tracing::info!(issues = issues.len(), "fetched backlog");

    let problems = detector.detect(&issues);
    if !problems.is_empty() {
        tracing::info!(count = problems.len(), "issues with problem tags excluded");
    }

    let table = aggregate(
        &issues,
        &labels.priorities,
        &labels.issue_types,
        &problems.keys(),
    );

    Ok(BacklogReport {
        metrics: table.into_entries(),
        problems,
        issue_types: labels.sorted_issue_types(),
    })
}

/// Build the payload for `host` from the outcome of a run.
///
/// Errors are logged and yield the failure payload.
pub fn payload_for(host: &str, outcome: Result<BacklogReport, ReportError>) -> Payload {
    let items = outcome
        .and_then(|report| payload::render(&report).map_err(ReportError::from))
        .unwrap_or_else(|e| {
            tracing::error!("report failed: {}", e);
            payload::failure()
        });
    Payload::for_host(host, items)
}

/// Send the payload, warning when the server refused some items.
pub async fn deliver(
    transport: &dyn Transport,
    payload: &Payload,
) -> Result<SendSummary, TransportError> {
    let summary = transport.send(payload).await?;
    if summary.failed > 0 {
        tracing::warn!(
            failed = summary.failed,
            total = summary.total,
            "server refused some items; check the item keys on the host"
        );
    }
    Ok(summary)
}

/// One full run against the given tracker and transport.
pub async fn run_report(
    tracker: &dyn Tracker,
    transport: &dyn Transport,
    labels: &LabelsConfig,
    settings: &Settings,
    host: &str,
) -> Result<SendSummary, TransportError> {
    let payload = payload_for(host, collect(tracker, labels, settings).await);
    deliver(transport, &payload).await
}
