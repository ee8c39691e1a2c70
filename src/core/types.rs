//! core::types
//!
//! Domain types shared by the report and close commands.
//!
//! # Types
//!
//! - [`IssueKey`] - Validated tracker issue key (e.g. `PROJ-42`)
//! - [`Issue`] - Issue as fetched from the tracker, reduced to the fields we use
//! - [`MetricEntry`] - One counter pushed to the monitoring system
//!
//! # Examples
//!
//! ```
//! use backlog_metrics::core::types::{Issue, IssueKey};
//!
//! let key = IssueKey::new("PROJ-42").unwrap();
//! let issue = Issue::new(key, ["PRIORITY1"], ["From_Support", "Type_Bug"]);
//! assert!(issue.has_component("PRIORITY1"));
//! assert!(issue.has_label("Type_Bug"));
//!
//! assert!(IssueKey::new("").is_err());
//! assert!(IssueKey::new("has space").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid issue key: {0}")]
    InvalidIssueKey(String),
}

/// A validated issue key.
///
/// Keys are opaque to us, but they end up in URLs and in the problem report,
/// so empty keys and keys with whitespace or `/` are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueKey(String);

impl IssueKey {
    /// Create a validated issue key.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TypeError::InvalidIssueKey("key cannot be empty".into()));
        }
        if key.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(TypeError::InvalidIssueKey(format!(
                "'{}' contains whitespace or '/'",
                key
            )));
        }
        Ok(Self(key))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IssueKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IssueKey> for String {
    fn from(key: IssueKey) -> Self {
        key.0
    }
}

impl AsRef<str> for IssueKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IssueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An issue as seen by the aggregation.
///
/// Component names and labels keep the tracker's order; membership checks
/// treat them as sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Issue key
    pub key: IssueKey,
    /// Component names
    pub components: Vec<String>,
    /// Labels
    pub labels: Vec<String>,
}

impl Issue {
    /// Build an issue from its key, component names and labels.
    pub fn new<C, L>(key: IssueKey, components: C, labels: L) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            key,
            components: components.into_iter().map(Into::into).collect(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether the issue belongs to the named component.
    pub fn has_component(&self, name: &str) -> bool {
        self.components.iter().any(|c| c == name)
    }

    /// Check whether the issue carries the label.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Labels joined the way the problem report prints them.
    pub fn labels_display(&self) -> String {
        self.labels.join(", ")
    }
}

/// A single counter reported to the monitoring system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricEntry {
    /// Normalized item key (unique within a run)
    pub key: String,
    /// Human-readable name used by discovery
    pub name: String,
    /// Counter value
    pub value: u64,
}
