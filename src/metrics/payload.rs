//! metrics::payload
//!
//! Turning a finished report into monitoring items.
//!
//! # Items
//!
//! | Item key            | Value                                                   |
//! |---------------------|---------------------------------------------------------|
//! | `metric_[{key}]`    | counter value, one item per metric entry                |
//! | `project_metrics`   | low-level discovery document (JSON)                     |
//! | `tags_problem`      | problem-tagged issues, one per line                     |
//! | `config_diff`       | configured issue types, sorted, one per line            |
//! | `exitcode`          | `1` when the run succeeded, `0` otherwise               |
//!
//! A failed run sends only `exitcode = 0`; no partial data is reported.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::types::MetricEntry;
use crate::metrics::problem_tags::ProblemList;

/// Item holding the discovery document.
pub const DISCOVERY_ITEM: &str = "project_metrics";

/// Item holding the problem-tag report.
pub const PROBLEMS_ITEM: &str = "tags_problem";

/// Item holding the configured issue types.
pub const CONFIG_DUMP_ITEM: &str = "config_diff";

/// Item holding the run status.
pub const STATUS_ITEM: &str = "exitcode";

/// Item keys and values for one monitored host.
pub type Items = BTreeMap<String, String>;

/// Everything the formatter needs from a successful run.
#[derive(Debug, Clone, Default)]
pub struct BacklogReport {
    /// Aggregated counters
    pub metrics: Vec<MetricEntry>,
    /// Problem-tagged issues
    pub problems: ProblemList,
    /// Configured issue-type labels, in the order they are dumped
    pub issue_types: Vec<String>,
}

/// Key of the item carrying a metric's value.
pub fn metric_item_key(key: &str) -> String {
    format!("metric_[{}]", key)
}

#[derive(Serialize)]
struct Discovery<'a> {
    data: Vec<DiscoveryRecord<'a>>,
}

#[derive(Serialize)]
struct DiscoveryRecord<'a> {
    #[serde(rename = "{#METRIC}")]
    metric: &'a str,
    #[serde(rename = "{#NAME_PR}")]
    name: &'a str,
}

/// Build the discovery document: one `{#METRIC}`/`{#NAME_PR}` record per
/// entry, zero-valued entries included.
pub fn discovery_document(metrics: &[MetricEntry]) -> Result<String, serde_json::Error> {
    let discovery = Discovery {
        data: metrics
            .iter()
            .map(|m| DiscoveryRecord {
                metric: &m.key,
                name: &m.name,
            })
            .collect(),
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    discovery.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Items for a successful run.
pub fn render(report: &BacklogReport) -> Result<Items, serde_json::Error> {
    let mut items = Items::new();

    for metric in &report.metrics {
        items.insert(metric_item_key(&metric.key), metric.value.to_string());
    }
    items.insert(
        DISCOVERY_ITEM.to_string(),
        discovery_document(&report.metrics)?,
    );
    items.insert(PROBLEMS_ITEM.to_string(), report.problems.report());

    items.insert(
        CONFIG_DUMP_ITEM.to_string(),
        report.issue_types.join("\n"),
    );

    items.insert(STATUS_ITEM.to_string(), "1".to_string());
    Ok(items)
}

/// Items for a failed run.
pub fn failure() -> Items {
    let mut items = Items::new();
    items.insert(STATUS_ITEM.to_string(), "0".to_string());
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Issue, IssueKey};
    use crate::metrics::problem_tags::ProblemTagDetector;

    fn entry(key: &str, name: &str, value: u64) -> MetricEntry {
        MetricEntry {
            key: key.to_string(),
            name: name.to_string(),
            value,
        }
    }

    fn report() -> BacklogReport {
        let problems = ProblemTagDetector::new("PRIORITY[0-9]")
            .unwrap()
            .detect(&[Issue::new(
                IssueKey::new("PROJ-9").unwrap(),
                ["PRIORITY1"],
                ["Type_Bug"],
            )]);

        BacklogReport {
            metrics: vec![
                entry("priority1_type_bug", "PRIORITY1 Type_Bug", 3),
                entry("sum_type_bug", "Sum of Type_Bug", 0),
            ],
            problems,
            issue_types: vec!["Type_Bug".to_string(), "Type_Task".to_string()],
        }
    }

    #[test]
    fn metric_items() {
        let items = render(&report()).unwrap();
        assert_eq!(items["metric_[priority1_type_bug]"], "3");
        assert_eq!(items["metric_[sum_type_bug]"], "0");
    }

    #[test]
    fn status_and_dumps() {
        let items = render(&report()).unwrap();
        assert_eq!(items[STATUS_ITEM], "1");
        assert_eq!(items[PROBLEMS_ITEM], "PROJ-9 - Type_Bug");
        assert_eq!(items[CONFIG_DUMP_ITEM], "Type_Bug\nType_Task");
        assert_eq!(items.len(), 6);
    }

    #[test]
    fn config_dump_keeps_report_order() {
        let report = BacklogReport {
            issue_types: vec!["Type_Task".to_string(), "Type_Bug".to_string()],
            ..report()
        };
        let items = render(&report).unwrap();
        assert_eq!(items[CONFIG_DUMP_ITEM], "Type_Task\nType_Bug");
    }

    #[test]
    fn discovery_lists_every_entry() {
        let items = render(&report()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&items[DISCOVERY_ITEM]).unwrap();
        let data = doc["data"].as_array().unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["{#METRIC}"], "priority1_type_bug");
        assert_eq!(data[0]["{#NAME_PR}"], "PRIORITY1 Type_Bug");
        // Zero-valued entries are discovered too
        assert_eq!(data[1]["{#METRIC}"], "sum_type_bug");
    }

    #[test]
    fn discovery_uses_four_space_indent() {
        let doc = discovery_document(&[entry("k", "n", 1)]).unwrap();
        assert!(doc.starts_with("{\n    \"data\": [\n        {\n"));
    }

    #[test]
    fn empty_report() {
        let items = render(&BacklogReport::default()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&items[DISCOVERY_ITEM]).unwrap();
        assert_eq!(doc["data"].as_array().unwrap().len(), 0);
        assert_eq!(items[PROBLEMS_ITEM], "");
        assert_eq!(items[CONFIG_DUMP_ITEM], "");
        assert_eq!(items[STATUS_ITEM], "1");
    }

    #[test]
    fn failure_has_only_status() {
        let items = failure();
        assert_eq!(items.len(), 1);
        assert_eq!(items[STATUS_ITEM], "0");
    }
}
