//! tracker::jira
//!
//! Jira tracker implementation using the REST API v2.
//!
//! # Design
//!
//! This module implements the `Tracker` trait for Jira Server/Data Center:
//! - `GET  /rest/api/2/serverInfo` for the session check
//! - `GET  /rest/api/2/search` for queries, paged until the bound is reached
//! - `GET  /rest/api/2/issue/{key}/transitions` for available transitions
//! - `POST /rest/api/2/issue/{key}/transitions` to execute one
//!
//! # Authentication
//!
//! HTTP basic authentication on every request. There is no token refresh
//! and no retry: a rejected request surfaces as `TrackerError::AuthFailed`.
//!
//! # Example
//!
//! ```ignore
//! use backlog_metrics::tracker::jira::JiraTracker;
//! use backlog_metrics::tracker::Tracker;
//!
//! let tracker = JiraTracker::new("https://jira.example.com", "bot", "secret")?;
//! tracker.server_info().await?;
//! let issues = tracker.search_issues("project = OPS", 1000).await?;
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{ServerInfo, Tracker, TrackerError, Transition, TransitionRequest};
use crate::core::types::{Issue, IssueKey};

/// REST API prefix below the base URL.
const API_PREFIX: &str = "rest/api/2";

/// Fields requested from search; everything else is dropped server-side.
const SEARCH_FIELDS: &str = "components,labels";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "backlog-metrics";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Jira tracker implementation.
pub struct JiraTracker {
    /// HTTP client for making requests
    client: Client,
    /// Base URL without trailing slash
    base_url: String,
    /// Basic-auth user
    user: String,
    /// Basic-auth password
    password: String,
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for JiraTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraTracker")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .finish()
    }
}

impl JiraTracker {
    /// Create a Jira tracker with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, TrackerError> {
        Self::with_timeout(base_url, user, password, DEFAULT_TIMEOUT)
    }

    /// Create a Jira tracker with a custom request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: user.into(),
            password: password.into(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build URL for an API endpoint.
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    /// Attach auth and common headers.
    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
    }

    /// Send a request, mapping transport failures.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, TrackerError> {
        self.authorized(builder)
            .send()
            .await
            .map_err(|e| TrackerError::NetworkError(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, TrackerError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| TrackerError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle a response whose success body is ignored (e.g. 204).
    async fn handle_empty_response(&self, response: Response) -> Result<(), TrackerError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, TrackerError> {
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);

        Err(match status {
            StatusCode::UNAUTHORIZED => TrackerError::AuthFailed("Invalid credentials".into()),
            StatusCode::FORBIDDEN => {
                TrackerError::AuthFailed(format!("Permission denied: {}", message))
            }
            StatusCode::NOT_FOUND => TrackerError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => TrackerError::RateLimited,
            _ if status.is_server_error() => TrackerError::ApiError {
                status: status.as_u16(),
                message: format!("Jira server error: {}", message),
            },
            _ => TrackerError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Fetch one page of search results.
    async fn search_page(
        &self,
        query: &str,
        start_at: u32,
        max_results: u32,
    ) -> Result<SearchResponse, TrackerError> {
        let start_at = start_at.to_string();
        let max_results = max_results.to_string();
        let request = self.client.get(self.api_url("search")).query(&[
            ("jql", query),
            ("startAt", start_at.as_str()),
            ("maxResults", max_results.as_str()),
            ("fields", SEARCH_FIELDS),
        ]);

        let response = self.send(request).await?;
        self.handle_response(response).await
    }
}

/// Flatten a Jira error body into one message.
///
/// Jira reports problems as `{"errorMessages": [..], "errors": {field: msg}}`;
/// bodies that are not in that shape are returned as-is.
fn error_message(body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<JiraErrorResponse>(body) {
        let mut parts = err.error_messages;
        parts.extend(
            err.errors
                .into_iter()
                .map(|(field, msg)| format!("{}: {}", field, msg)),
        );
        if !parts.is_empty() {
            return parts.join("; ");
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl Tracker for JiraTracker {
    fn name(&self) -> &'static str {
        "jira"
    }

    async fn server_info(&self) -> Result<ServerInfo, TrackerError> {
        let response = self
            .send(self.client.get(self.api_url("serverInfo")))
            .await?;
        let info: JiraServerInfo = self.handle_response(response).await?;
        tracing::debug!(version = %info.version, title = %info.server_title, "connected to jira");
        Ok(info.into())
    }

    async fn search_issues(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<Issue>, TrackerError> {
        let mut issues: Vec<Issue> = Vec::new();

        // The server may cap page size below what we ask for, so keep asking
        // for the remainder until the bound, the total, or an empty page.
        loop {
            let collected = issues.len() as u32;
            let remaining = max_results.saturating_sub(collected);
            if remaining == 0 {
                break;
            }

            let page = self.search_page(query, collected, remaining).await?;
            let fetched = page.issues.len();
            tracing::debug!(
                start_at = collected,
                fetched,
                total = page.total,
                "search page"
            );

            for issue in page.issues {
                issues.push(issue.try_into()?);
            }

            if fetched == 0 || issues.len() as u32 >= page.total {
                break;
            }
        }

        issues.truncate(max_results as usize);
        Ok(issues)
    }

    async fn transitions(&self, key: &IssueKey) -> Result<Vec<Transition>, TrackerError> {
        let url = self.api_url(&format!("issue/{}/transitions", key));
        let response = self.send(self.client.get(url)).await?;
        let body: TransitionsResponse = self.handle_response(response).await?;
        Ok(body.transitions.into_iter().map(Into::into).collect())
    }

    async fn transition_issue(
        &self,
        key: &IssueKey,
        request: &TransitionRequest,
    ) -> Result<(), TrackerError> {
        let url = self.api_url(&format!("issue/{}/transitions", key));
        let body = TransitionBody::from_request(request);

        let response = self.send(self.client.post(url).json(&body)).await?;
        self.handle_empty_response(response).await
    }
}

// =============================================================================
// Jira API types (internal)
// =============================================================================

#[derive(Debug, Deserialize)]
struct JiraServerInfo {
    #[serde(rename = "baseUrl", default)]
    base_url: String,
    #[serde(default)]
    version: String,
    #[serde(rename = "serverTitle", default)]
    server_title: String,
}

impl From<JiraServerInfo> for ServerInfo {
    fn from(info: JiraServerInfo) -> Self {
        ServerInfo {
            base_url: info.base_url,
            version: info.version,
            title: info.server_title,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u32,
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    #[serde(default)]
    fields: JiraIssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct JiraIssueFields {
    // Jira sends `null` for fields hidden from the screen
    #[serde(default)]
    components: Option<Vec<JiraComponent>>,
    #[serde(default)]
    labels: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct JiraComponent {
    #[serde(default)]
    name: String,
}

impl TryFrom<JiraIssue> for Issue {
    type Error = TrackerError;

    fn try_from(issue: JiraIssue) -> Result<Self, Self::Error> {
        let key = IssueKey::new(issue.key)
            .map_err(|e| TrackerError::InvalidResponse(e.to_string()))?;
        let components = issue
            .fields
            .components
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.name);
        let labels = issue.fields.labels.unwrap_or_default();
        Ok(Issue::new(key, components, labels))
    }
}

#[derive(Debug, Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<JiraTransition>,
}

#[derive(Debug, Deserialize)]
struct JiraTransition {
    id: String,
    #[serde(default)]
    name: String,
}

impl From<JiraTransition> for Transition {
    fn from(t: JiraTransition) -> Self {
        Transition {
            id: t.id,
            name: t.name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct JiraErrorResponse {
    #[serde(rename = "errorMessages", default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct TransitionBody<'a> {
    transition: IdRef<'a>,
    fields: TransitionFields<'a>,
    update: TransitionUpdate<'a>,
}

impl<'a> TransitionBody<'a> {
    fn from_request(request: &'a TransitionRequest) -> Self {
        Self {
            transition: IdRef {
                id: &request.transition_id,
            },
            fields: TransitionFields {
                resolution: IdRef {
                    id: &request.resolution_id,
                },
                assignee: NameRef {
                    name: &request.assignee,
                },
            },
            update: TransitionUpdate {
                comment: vec![AddOp {
                    add: CommentBody {
                        body: &request.comment,
                    },
                }],
                worklog: request
                    .worklog
                    .as_deref()
                    .map(|time_spent| AddOp {
                        add: WorklogBody { time_spent },
                    })
                    .into_iter()
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct IdRef<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct NameRef<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct TransitionFields<'a> {
    resolution: IdRef<'a>,
    assignee: NameRef<'a>,
}

#[derive(Debug, Serialize)]
struct TransitionUpdate<'a> {
    comment: Vec<AddOp<CommentBody<'a>>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    worklog: Vec<AddOp<WorklogBody<'a>>>,
}

#[derive(Debug, Serialize)]
struct AddOp<T> {
    add: T,
}

#[derive(Debug, Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct WorklogBody<'a> {
    #[serde(rename = "timeSpent")]
    time_spent: &'a str,
}
