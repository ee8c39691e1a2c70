//! metrics::problem_tags
//!
//! Detection of issues whose tagging convention is broken.
//!
//! # Convention
//!
//! Every prioritized issue carries exactly one source tag (`From_*`) and
//! exactly one type tag (`Type_*`). An issue is flagged when it misses
//! either tag or repeats one, and at least one of its components matches
//! the priority pattern. Issues without a prioritized component are never
//! flagged.
//!
//! Flagged issues are reported verbatim and left out of the aggregation.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use crate::core::types::{Issue, IssueKey};

/// Marker of the source tag.
pub const SOURCE_TAG: &str = "From_";

/// Marker of the type tag.
pub const TYPE_TAG: &str = "Type_";

/// One flagged issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemTag {
    /// Flagged issue
    pub key: IssueKey,
    /// The issue's labels joined with `", "`
    pub labels: String,
}

impl fmt::Display for ProblemTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.key, self.labels)
    }
}

/// Flagged issues in the order they were fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemList {
    tags: Vec<ProblemTag>,
}

impl ProblemList {
    /// Flagged issues.
    pub fn tags(&self) -> &[ProblemTag] {
        &self.tags
    }

    /// Number of flagged issues.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if nothing was flagged.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Keys to exclude from aggregation.
    pub fn keys(&self) -> HashSet<IssueKey> {
        self.tags.iter().map(|t| t.key.clone()).collect()
    }

    /// Newline-joined report, one `"{key} - {labels}"` line per issue.
    pub fn report(&self) -> String {
        self.tags
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, tag: ProblemTag) {
        self.tags.push(tag);
    }
}

/// Flags issues with malformed `From_`/`Type_` tagging.
#[derive(Debug, Clone)]
pub struct ProblemTagDetector {
    priority_pattern: Regex,
}

impl ProblemTagDetector {
    /// Create a detector for components matching `priority_pattern`.
    ///
    /// The pattern is searched, not anchored: `PRIORITY[0-9]` matches
    /// `Team PRIORITY1`.
    pub fn new(priority_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            priority_pattern: Regex::new(priority_pattern)?,
        })
    }

    /// Check whether an issue breaks the tagging convention.
    ///
    /// # Example
    ///
    /// ```
    /// use backlog_metrics::core::types::{Issue, IssueKey};
    /// use backlog_metrics::metrics::problem_tags::ProblemTagDetector;
    ///
    /// let detector = ProblemTagDetector::new("PRIORITY[0-9]").unwrap();
    /// let key = || IssueKey::new("PROJ-1").unwrap();
    ///
    /// let ok = Issue::new(key(), ["PRIORITY1"], ["From_Support", "Type_Bug"]);
    /// assert!(!detector.is_problem(&ok));
    ///
    /// let no_source = Issue::new(key(), ["PRIORITY1"], ["Type_Bug"]);
    /// assert!(detector.is_problem(&no_source));
    ///
    /// let unprioritized = Issue::new(key(), ["Backend"], ["Type_Bug"]);
    /// assert!(!detector.is_problem(&unprioritized));
    /// ```
    pub fn is_problem(&self, issue: &Issue) -> bool {
        let prioritized = issue
            .components
            .iter()
            .any(|c| self.priority_pattern.is_match(c));
        if !prioritized {
            return false;
        }

        let sources = count_tag(&issue.labels, SOURCE_TAG);
        let types = count_tag(&issue.labels, TYPE_TAG);
        sources == 0 || types == 0 || sources > 1 || types > 1
    }

    /// Collect every flagged issue.
    pub fn detect(&self, issues: &[Issue]) -> ProblemList {
        let mut problems = ProblemList::default();
        for issue in issues.iter().filter(|i| self.is_problem(i)) {
            problems.push(ProblemTag {
                key: issue.key.clone(),
                labels: issue.labels_display(),
            });
        }
        problems
    }
}

/// Occurrences of `tag` across all labels, counted as substrings.
fn count_tag(labels: &[String], tag: &str) -> usize {
    labels.iter().map(|l| l.matches(tag).count()).sum()
}
