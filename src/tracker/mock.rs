//! tracker::mock
//!
//! Mock tracker implementation for deterministic testing.
//!
//! # Design
//!
//! The mock tracker serves a fixed issue list and per-issue transitions
//! from memory, records every call, and can be configured to fail a given
//! operation. Executed transitions remove the issue from later searches,
//! the way a closed issue drops out of an "unresolved" query.
//!
//! # Example
//!
//! ```
//! use backlog_metrics::core::types::{Issue, IssueKey};
//! use backlog_metrics::tracker::mock::MockTracker;
//! use backlog_metrics::tracker::Tracker;
//!
//! # tokio_test::block_on(async {
//! let key = IssueKey::new("OPS-1").unwrap();
//! let tracker = MockTracker::with_issues(vec![Issue::new(
//!     key.clone(),
//!     ["PRIORITY1"],
//!     ["From_Support", "Type_Bug"],
//! )])
//! .with_transitions(&key, &[("91", "Close")]);
//!
//! let issues = tracker.search_issues("anything", 10).await.unwrap();
//! assert_eq!(issues.len(), 1);
//!
//! let transitions = tracker.transitions(&key).await.unwrap();
//! assert_eq!(transitions[0].id, "91");
//! # });
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{ServerInfo, Tracker, TrackerError, Transition, TransitionRequest};
use crate::core::types::{Issue, IssueKey};

/// Mock tracker for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockTracker {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockTrackerInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockTrackerInner {
    /// Issues returned by search, in order.
    issues: Vec<Issue>,
    /// Available transitions by issue.
    transitions: HashMap<IssueKey, Vec<Transition>>,
    /// Issues already transitioned.
    transitioned: HashSet<IssueKey>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail server_info with the given error.
    ServerInfo(TrackerError),
    /// Fail search_issues with the given error.
    Search(TrackerError),
    /// Fail transitions with the given error.
    Transitions(TrackerError),
    /// Fail transition_issue with the given error, for every issue.
    TransitionIssue(TrackerError),
    /// Fail transition_issue with the given error, for one issue only.
    TransitionIssueFor(IssueKey, TrackerError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ServerInfo,
    Search {
        query: String,
        max_results: u32,
    },
    Transitions {
        key: IssueKey,
    },
    TransitionIssue {
        key: IssueKey,
        request: TransitionRequest,
    },
}

impl MockTracker {
    /// Create a mock tracker without issues.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTrackerInner::default())),
        }
    }

    /// Create a mock tracker that returns `issues` from every search.
    pub fn with_issues(issues: Vec<Issue>) -> Self {
        let tracker = Self::new();
        tracker.inner.lock().unwrap().issues = issues;
        tracker
    }

    /// Set the transitions available on one issue.
    pub fn with_transitions(self, key: &IssueKey, transitions: &[(&str, &str)]) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.transitions.insert(
                key.clone(),
                transitions
                    .iter()
                    .map(|(id, name)| Transition {
                        id: id.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
            );
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use backlog_metrics::tracker::mock::{FailOn, MockTracker};
    /// use backlog_metrics::tracker::TrackerError;
    ///
    /// let tracker = MockTracker::new().fail_on(FailOn::Search(TrackerError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Keys of issues transitioned so far, in call order.
    pub fn transitioned_keys(&self) -> Vec<IssueKey> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::TransitionIssue { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail(&self, expected: &str, key: Option<&IssueKey>) -> Option<TrackerError> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_on {
            Some(FailOn::ServerInfo(e)) if expected == "server_info" => Some(e.clone()),
            Some(FailOn::Search(e)) if expected == "search_issues" => Some(e.clone()),
            Some(FailOn::Transitions(e)) if expected == "transitions" => Some(e.clone()),
            Some(FailOn::TransitionIssue(e)) if expected == "transition_issue" => Some(e.clone()),
            Some(FailOn::TransitionIssueFor(k, e))
                if expected == "transition_issue" && Some(k) == key =>
            {
                Some(e.clone())
            }
            _ => None,
        }
    }
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tracker for MockTracker {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn server_info(&self) -> Result<ServerInfo, TrackerError> {
        self.record(MockOperation::ServerInfo);

        if let Some(e) = self.check_fail("server_info", None) {
            return Err(e);
        }

        Ok(ServerInfo {
            base_url: "https://jira.mock".to_string(),
            version: "9.4.0".to_string(),
            title: "Mock Jira".to_string(),
        })
    }

    async fn search_issues(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<Issue>, TrackerError> {
        self.record(MockOperation::Search {
            query: query.to_string(),
            max_results,
        });

        if let Some(e) = self.check_fail("search_issues", None) {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        Ok(inner
            .issues
            .iter()
            .filter(|i| !inner.transitioned.contains(&i.key))
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn transitions(&self, key: &IssueKey) -> Result<Vec<Transition>, TrackerError> {
        self.record(MockOperation::Transitions { key: key.clone() });

        if let Some(e) = self.check_fail("transitions", Some(key)) {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        if !inner.issues.iter().any(|i| &i.key == key) {
            return Err(TrackerError::NotFound(format!("Issue {} does not exist", key)));
        }
        Ok(inner.transitions.get(key).cloned().unwrap_or_default())
    }

    async fn transition_issue(
        &self,
        key: &IssueKey,
        request: &TransitionRequest,
    ) -> Result<(), TrackerError> {
        self.record(MockOperation::TransitionIssue {
            key: key.clone(),
            request: request.clone(),
        });

        if let Some(e) = self.check_fail("transition_issue", Some(key)) {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        let available = inner
            .transitions
            .get(key)
            .map(|ts| ts.iter().any(|t| t.id == request.transition_id))
            .unwrap_or(false);
        if !available {
            return Err(TrackerError::ApiError {
                status: 400,
                message: format!(
                    "Transition id '{}' is not valid for this issue.",
                    request.transition_id
                ),
            });
        }

        inner.transitioned.insert(key.clone());
        Ok(())
    }
}
