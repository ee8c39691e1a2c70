//! tracker::traits
//!
//! Tracker trait definition for talking to the issue tracker.
//!
//! # Design
//!
//! The `Tracker` trait is async because every operation is network I/O.
//! All methods return `Result` so that commands decide what a failure
//! means: the report turns it into a status item, the close command into
//! an exit code.
//!
//! # Example
//!
//! ```ignore
//! use backlog_metrics::tracker::{Tracker, TrackerError};
//!
//! async fn open_keys(tracker: &dyn Tracker) -> Result<Vec<String>, TrackerError> {
//!     let issues = tracker.search_issues("resolution = Unresolved", 100).await?;
//!     Ok(issues.into_iter().map(|i| i.key.to_string()).collect())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{Issue, IssueKey};

/// Errors from tracker operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    /// Authentication failed (bad credentials, missing permission).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error (including rejected queries).
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Tracker server identity, returned by the session check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Base URL as reported by the server
    pub base_url: String,
    /// Server version string
    pub version: String,
    /// Server title
    pub title: String,
}

/// A state change available on an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Transition id (e.g. "91")
    pub id: String,
    /// Display name (e.g. "Close Issue")
    pub name: String,
}

/// Request to execute a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Transition to execute
    pub transition_id: String,
    /// Comment added with the transition
    pub comment: String,
    /// Resolution set on the issue
    pub resolution_id: String,
    /// Account the issue is assigned to
    pub assignee: String,
    /// Time spent logged with the transition (`None` logs nothing)
    pub worklog: Option<String>,
}

/// The Tracker trait for interacting with the issue tracker.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a tracker can be held behind
/// `Box<dyn Tracker>` inside async commands.
///
/// # Error Handling
///
/// All methods return `Result<T, TrackerError>`. Callers should handle:
/// - `AuthFailed`: check credentials
/// - `ApiError` with status 400 on search: the query is invalid
/// - `NotFound`: the issue disappeared between search and update
/// - `NetworkError`: check connectivity
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Get the tracker name (e.g., "jira").
    fn name(&self) -> &'static str;

    /// Check the session by fetching server information.
    ///
    /// # Errors
    ///
    /// - `AuthFailed` if the credentials are rejected
    /// - `NetworkError` if the server cannot be reached
    async fn server_info(&self) -> Result<ServerInfo, TrackerError>;

    /// Search issues matching a query.
    ///
    /// # Arguments
    ///
    /// * `query` - Query text (JQL for Jira)
    /// * `max_results` - Upper bound on issues returned
    ///
    /// # Errors
    ///
    /// - `ApiError` if the query is rejected
    async fn search_issues(&self, query: &str, max_results: u32)
        -> Result<Vec<Issue>, TrackerError>;

    /// List the transitions currently available on an issue.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the issue doesn't exist
    async fn transitions(&self, key: &IssueKey) -> Result<Vec<Transition>, TrackerError>;

    /// Execute a transition on an issue.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the issue doesn't exist
    /// - `ApiError` if the transition is rejected (e.g. invalid field values)
    async fn transition_issue(
        &self,
        key: &IssueKey,
        request: &TransitionRequest,
    ) -> Result<(), TrackerError>;
}
