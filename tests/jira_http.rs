//! Integration tests for the Jira client against a mock HTTP server.

use backlog_metrics::core::types::IssueKey;
use backlog_metrics::tracker::jira::JiraTracker;
use backlog_metrics::tracker::{Tracker, TrackerError, TransitionRequest};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tracker(server: &MockServer) -> JiraTracker {
    JiraTracker::new(server.uri(), "bot", "pw").unwrap()
}

fn issue_json(key: &str, components: &[&str], labels: &[&str]) -> serde_json::Value {
    json!({
        "key": key,
        "fields": {
            "components": components.iter().map(|c| json!({"name": c})).collect::<Vec<_>>(),
            "labels": labels,
        }
    })
}

#[tokio::test]
async fn server_info_sends_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/serverInfo"))
        .and(header("authorization", "Basic Ym90OnB3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "baseUrl": "https://jira.example.com",
            "version": "9.4.0",
            "serverTitle": "Example Jira"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = tracker(&server).server_info().await.unwrap();
    assert_eq!(info.version, "9.4.0");
    assert_eq!(info.title, "Example Jira");
}

#[tokio::test]
async fn search_pages_until_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/search"))
        .and(query_param("startAt", "0"))
        .and(query_param("fields", "components,labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 0,
            "maxResults": 2,
            "total": 3,
            "issues": [
                issue_json("OPS-1", &["PRIORITY1"], &["From_Support", "Type_Bug"]),
                issue_json("OPS-2", &["PRIORITY2"], &["Type_Task"]),
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/search"))
        .and(query_param("startAt", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 2,
            "maxResults": 2,
            "total": 3,
            "issues": [issue_json("OPS-3", &[], &[])]
        })))
        .mount(&server)
        .await;

    let issues = tracker(&server)
        .search_issues("project = OPS", 1000)
        .await
        .unwrap();

    let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["OPS-1", "OPS-2", "OPS-3"]);
    assert_eq!(issues[0].components, vec!["PRIORITY1"]);
    assert_eq!(issues[0].labels, vec!["From_Support", "Type_Bug"]);
    assert!(issues[2].labels.is_empty());
}

#[tokio::test]
async fn search_stops_at_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/search"))
        .and(query_param("maxResults", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 50,
            "issues": [
                issue_json("OPS-1", &[], &[]),
                issue_json("OPS-2", &[], &[]),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issues = tracker(&server).search_issues("q", 2).await.unwrap();
    assert_eq!(issues.len(), 2);
}

#[tokio::test]
async fn search_tolerates_null_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "issues": [{"key": "OPS-7", "fields": {"components": null, "labels": null}}]
        })))
        .mount(&server)
        .await;

    let issues = tracker(&server).search_issues("q", 10).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].components.is_empty());
    assert!(issues[0].labels.is_empty());
}

#[tokio::test]
async fn rejected_query_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorMessages": ["Error in the JQL Query: Expecting either a value, list or function"],
            "errors": {}
        })))
        .mount(&server)
        .await;

    let err = tracker(&server).search_issues("project = ", 10).await.unwrap_err();
    assert_eq!(
        err,
        TrackerError::ApiError {
            status: 400,
            message: "Error in the JQL Query: Expecting either a value, list or function".into()
        }
    );
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let cases = [
        (401, "unauthorized"),
        (403, "forbidden"),
        (404, "not found"),
        (429, "slow down"),
        (503, "maintenance"),
    ];

    for (status, body) in cases {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/serverInfo"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;

        let err = tracker(&server).server_info().await.unwrap_err();
        match status {
            401 => assert_eq!(err, TrackerError::AuthFailed("Invalid credentials".into())),
            403 => assert_eq!(
                err,
                TrackerError::AuthFailed("Permission denied: forbidden".into())
            ),
            404 => assert_eq!(err, TrackerError::NotFound("not found".into())),
            429 => assert_eq!(err, TrackerError::RateLimited),
            _ => assert_eq!(
                err,
                TrackerError::ApiError {
                    status: 503,
                    message: "Jira server error: maintenance".into()
                }
            ),
        }
    }
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    // Nothing listens on port 9 on loopback in test environments.
    let tracker = JiraTracker::new("http://127.0.0.1:9", "bot", "pw").unwrap();
    let err = tracker.server_info().await.unwrap_err();
    assert!(matches!(err, TrackerError::NetworkError(_)));
}

#[tokio::test]
async fn transitions_listed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/OPS-1/transitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "expand": "transitions",
            "transitions": [
                {"id": "11", "name": "Start Progress"},
                {"id": "91", "name": "Close Issue"}
            ]
        })))
        .mount(&server)
        .await;

    let key = IssueKey::new("OPS-1").unwrap();
    let transitions = tracker(&server).transitions(&key).await.unwrap();
    let ids: Vec<&str> = transitions.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["11", "91"]);
    assert_eq!(transitions[1].name, "Close Issue");
}

#[tokio::test]
async fn transition_posts_fields_and_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/OPS-1/transitions"))
        .and(body_json(json!({
            "transition": {"id": "91"},
            "fields": {
                "resolution": {"id": "1"},
                "assignee": {"name": "bot"}
            },
            "update": {
                "comment": [{"add": {"body": "Closed as stale"}}],
                "worklog": [{"add": {"timeSpent": "1"}}]
            }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let request = TransitionRequest {
        transition_id: "91".into(),
        comment: "Closed as stale".into(),
        resolution_id: "1".into(),
        assignee: "bot".into(),
        worklog: Some("1".into()),
    };
    let key = IssueKey::new("OPS-1").unwrap();
    tracker(&server)
        .transition_issue(&key, &request)
        .await
        .unwrap();
}

#[tokio::test]
async fn transition_without_worklog_omits_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/OPS-2/transitions"))
        .and(body_json(json!({
            "transition": {"id": "91"},
            "fields": {
                "resolution": {"id": "1"},
                "assignee": {"name": "bot"}
            },
            "update": {
                "comment": [{"add": {"body": "bye"}}]
            }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let request = TransitionRequest {
        transition_id: "91".into(),
        comment: "bye".into(),
        resolution_id: "1".into(),
        assignee: "bot".into(),
        worklog: None,
    };
    let key = IssueKey::new("OPS-2").unwrap();
    tracker(&server)
        .transition_issue(&key, &request)
        .await
        .unwrap();
}

#[tokio::test]
async fn transition_field_error_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/OPS-3/transitions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorMessages": [],
            "errors": {"resolution": "Field 'resolution' cannot be set."}
        })))
        .mount(&server)
        .await;

    let request = TransitionRequest {
        transition_id: "91".into(),
        comment: "x".into(),
        resolution_id: "1".into(),
        assignee: "bot".into(),
        worklog: None,
    };
    let key = IssueKey::new("OPS-3").unwrap();
    let err = tracker(&server)
        .transition_issue(&key, &request)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TrackerError::ApiError {
            status: 400,
            message: "resolution: Field 'resolution' cannot be set.".into()
        }
    );
}
