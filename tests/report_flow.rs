//! End-to-end report runs against the mock tracker and mock transport.

use std::fs;

use backlog_metrics::cli::commands::{payload_for, run_report, ReportError};
use backlog_metrics::core::config::{
    ConfigError, LabelsConfig, Settings, SettingsFile, TrackerSettings, ZabbixSettings,
};
use backlog_metrics::core::types::{Issue, IssueKey};
use backlog_metrics::metrics::payload::{
    CONFIG_DUMP_ITEM, DISCOVERY_ITEM, PROBLEMS_ITEM, STATUS_ITEM,
};
use backlog_metrics::tracker::mock::{FailOn, MockTracker};
use backlog_metrics::tracker::TrackerError;
use backlog_metrics::transport::mock::MockTransport;
use backlog_metrics::transport::TransportError;
use tempfile::TempDir;

const HOST: &str = "backlog";

fn settings() -> Settings {
    Settings::from_file(SettingsFile {
        tracker: Some(TrackerSettings {
            project: Some("OPS".into()),
            ..Default::default()
        }),
        zabbix: Some(ZabbixSettings {
            host: Some(HOST.into()),
            ..Default::default()
        }),
        ..Default::default()
    })
    .unwrap()
}

fn labels() -> LabelsConfig {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("labels_list.yaml");
    fs::write(
        &path,
        "PRIORITIES:\n  - PRIORITY1\n  - PRIORITY2\nISSUE_TYPE:\n  - Type_Bug\n  - Type_Task\n",
    )
    .unwrap();
    LabelsConfig::load(&path).unwrap()
}

fn issue(key: &str, components: &[&str], labels: &[&str]) -> Issue {
    Issue::new(
        IssueKey::new(key).unwrap(),
        components.iter().copied(),
        labels.iter().copied(),
    )
}

fn backlog() -> Vec<Issue> {
    vec![
        issue("OPS-1", &["PRIORITY1"], &["From_Support", "Type_Bug"]),
        issue("OPS-2", &["PRIORITY1"], &["From_Support", "Type_Bug"]),
        issue("OPS-3", &["PRIORITY2"], &["From_Dev", "Type_Task"]),
        // Both categories: only the first configured one counts
        issue("OPS-4", &["PRIORITY2", "PRIORITY1"], &["From_Dev", "Type_Task"]),
        // No From_ tag: reported and excluded
        issue("OPS-5", &["PRIORITY1"], &["Type_Bug"]),
        // No priority component: counted nowhere, never a problem
        issue("OPS-6", &["Backend"], &["Type_Bug"]),
    ]
}

#[tokio::test]
async fn successful_run_sends_full_payload() {
    let tracker = MockTracker::with_issues(backlog());
    let transport = MockTransport::new();

    let summary = run_report(&tracker, &transport, &labels(), &settings(), HOST)
        .await
        .unwrap();

    let payload = transport.last().unwrap();
    let items = payload.items(HOST).unwrap();
    assert_eq!(summary.total as usize, items.len());

    assert_eq!(items["metric_[priority1_type_bug]"], "2");
    assert_eq!(items["metric_[priority1_type_task]"], "1");
    assert_eq!(items["metric_[priority2_type_task]"], "1");
    assert_eq!(items["metric_[priority2_type_bug]"], "0");
    assert_eq!(items["metric_[sum_type_bug]"], "2");
    assert_eq!(items["metric_[sum_type_task]"], "2");

    assert_eq!(items[PROBLEMS_ITEM], "OPS-5 - Type_Bug");
    assert_eq!(items[CONFIG_DUMP_ITEM], "Type_Bug\nType_Task");
    assert_eq!(items[STATUS_ITEM], "1");

    let doc: serde_json::Value = serde_json::from_str(&items[DISCOVERY_ITEM]).unwrap();
    assert_eq!(doc["data"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn tracker_failure_sends_failure_payload() {
    let tracker = MockTracker::with_issues(backlog())
        .fail_on(FailOn::Search(TrackerError::NetworkError("reset".into())));
    let transport = MockTransport::new();

    run_report(&tracker, &transport, &labels(), &settings(), HOST)
        .await
        .unwrap();

    let payload = transport.last().unwrap();
    let items = payload.items(HOST).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[STATUS_ITEM], "0");
}

#[tokio::test]
async fn transport_failure_is_returned() {
    let tracker = MockTracker::with_issues(backlog());
    let transport = MockTransport::rejecting("host not found");

    let err = run_report(&tracker, &transport, &labels(), &settings(), HOST)
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Rejected(_)));
}

#[tokio::test]
async fn empty_backlog_reports_zeros() {
    let tracker = MockTracker::new();
    let transport = MockTransport::new();

    run_report(&tracker, &transport, &labels(), &settings(), HOST)
        .await
        .unwrap();

    let payload = transport.last().unwrap();
    let items = payload.items(HOST).unwrap();
    assert_eq!(items["metric_[sum_type_bug]"], "0");
    assert_eq!(items[PROBLEMS_ITEM], "");
    assert_eq!(items[STATUS_ITEM], "1");
}

#[test]
fn missing_labels_file_gives_failure_payload() {
    let dir = TempDir::new().unwrap();
    let err = LabelsConfig::load(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadError { .. }));

    let payload = payload_for(HOST, Err(ReportError::Config(err)));
    let items = payload.items(HOST).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[STATUS_ITEM], "0");
}
