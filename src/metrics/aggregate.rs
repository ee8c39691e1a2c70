//! metrics::aggregate
//!
//! Counting issues per (category, label) pair and per label.
//!
//! # Algorithm
//!
//! 1. Build the whole table up front: one entry per pair, then one sum
//!    entry per label, all zero. Every configured key is reported, even
//!    when nothing matched it.
//! 2. Skip excluded issues entirely.
//! 3. Walk the categories in configured order. The first category the
//!    issue belongs to is credited for every configured label the issue
//!    carries (pair entry and sum entry); later categories are not
//!    considered for that issue.
//!
//! First-match-wins keeps each sum entry equal to the sum of its label's
//! pair entries, so an issue is never counted twice. When two pair keys
//! collide they share one entry, and adding up pair lookups per category
//! reads that entry once for each colliding pair, which exceeds the sum.

use std::collections::{HashMap, HashSet};

use crate::core::naming::{pair_key, sum_key};
use crate::core::types::{Issue, IssueKey, MetricEntry};

/// Ordered table of counters keyed by normalized identifier.
#[derive(Debug, Clone, Default)]
pub struct MetricTable {
    entries: Vec<MetricEntry>,
    index: HashMap<String, usize>,
}

impl MetricTable {
    /// Build the zeroed table for the configured categories and labels.
    ///
    /// When two names normalize to the same key they share one entry,
    /// which keeps its first position and takes the later display name.
    pub fn new(categories: &[String], labels: &[String]) -> Self {
        let mut table = Self::default();
        for category in categories {
            for label in labels {
                table.insert(pair_key(category, label), format!("{} {}", category, label));
            }
        }
        for label in labels {
            table.insert(sum_key(label), format!("Sum of {}", label));
        }
        table
    }

    fn insert(&mut self, key: String, name: String) {
        match self.index.get(&key) {
            Some(&pos) => {
                let entry = &mut self.entries[pos];
                entry.name = name;
                entry.value = 0;
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(MetricEntry {
                    key,
                    name,
                    value: 0,
                });
            }
        }
    }

    fn increment(&mut self, key: &str) {
        if let Some(&pos) = self.index.get(key) {
            self.entries[pos].value += 1;
        }
    }

    /// Look up an entry by key.
    pub fn get(&self, key: &str) -> Option<&MetricEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    /// Value of an entry, if present.
    pub fn value(&self, key: &str) -> Option<u64> {
        self.get(key).map(|e| e.value)
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[MetricEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the table into its entries.
    pub fn into_entries(self) -> Vec<MetricEntry> {
        self.entries
    }
}

/// Count issues by category and label.
///
/// # Arguments
///
/// * `issues` - Fetched issues
/// * `categories` - Component names, in match order
/// * `labels` - Issue-type labels
/// * `excluded` - Keys of issues to skip (problem-tagged issues)
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use backlog_metrics::core::types::{Issue, IssueKey};
/// use backlog_metrics::metrics::aggregate::aggregate;
///
/// let issues = vec![Issue::new(
///     IssueKey::new("PROJ-1").unwrap(),
///     ["PRIORITY1", "PRIORITY2"],
///     ["Type_Bug"],
/// )];
/// let categories = vec!["PRIORITY1".to_string(), "PRIORITY2".to_string()];
/// let labels = vec!["Type_Bug".to_string()];
///
/// let table = aggregate(&issues, &categories, &labels, &HashSet::new());
/// assert_eq!(table.value("priority1_type_bug"), Some(1));
/// assert_eq!(table.value("priority2_type_bug"), Some(0));
/// assert_eq!(table.value("sum_type_bug"), Some(1));
/// ```
pub fn aggregate(
    issues: &[Issue],
    categories: &[String],
    labels: &[String],
    excluded: &HashSet<IssueKey>,
) -> MetricTable {
    let categories = dedup(categories);
    let labels = dedup(labels);
    let mut table = MetricTable::new(&categories, &labels);

    for issue in issues.iter().filter(|i| !excluded.contains(&i.key)) {
        let Some(category) = categories.iter().find(|c| issue.has_component(c)) else {
            continue;
        };
        for label in labels.iter().filter(|l| issue.has_label(l)) {
            table.increment(&pair_key(category, label));
            table.increment(&sum_key(label));
        }
    }

    table
}

/// Drop repeated names, keeping the first occurrence.
fn dedup(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|n| seen.insert(n.as_str()))
        .cloned()
        .collect()
}
