//! core::config::schema
//!
//! Runtime settings schema.
//!
//! # Location
//!
//! Searched in order:
//! 1. `--settings <path>`
//! 2. `$BLM_SETTINGS` if set
//! 3. `$XDG_CONFIG_HOME/blm/settings.toml`
//! 4. `~/.blm/settings.toml`
//!
//! # Validation
//!
//! Values are validated after parsing and after environment overrides, so
//! a bad override is reported the same way as a bad file value.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Settings file (all sections optional).
///
/// # Example
///
/// ```toml
/// [tracker]
/// url = "https://jira.example.com"
/// user = "metrics-bot"
/// password = "secret"
/// project = "OPS"
/// max_results = 1000
///
/// [report]
/// priority_pattern = "PRIORITY[0-9]"
///
/// [zabbix]
/// host = "jira-backlog"
/// server = "zabbix.example.com"
/// port = 10051
///
/// [close]
/// transition_id = "91"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    /// Issue tracker connection
    pub tracker: Option<TrackerSettings>,

    /// Report job settings
    pub report: Option<ReportSettings>,

    /// Monitoring server settings
    pub zabbix: Option<ZabbixSettings>,

    /// Bulk close settings
    pub close: Option<CloseSettings>,
}

impl SettingsFile {
    /// Validate every present section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tracker) = &self.tracker {
            tracker.validate()?;
        }
        if let Some(report) = &self.report {
            report.validate()?;
        }
        if let Some(zabbix) = &self.zabbix {
            zabbix.validate()?;
        }
        if let Some(close) = &self.close {
            close.validate()?;
        }
        Ok(())
    }
}

/// Issue tracker connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerSettings {
    /// Base URL, e.g. `https://jira.example.com`
    pub url: Option<String>,

    /// Account used by the report job
    pub user: Option<String>,

    /// Password of the report account
    pub password: Option<String>,

    /// Project key substituted into the default report query
    pub project: Option<String>,

    /// Upper bound on issues fetched per search
    pub max_results: Option<u32>,

    /// HTTP timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl TrackerSettings {
    /// Validate the tracker section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            validate_http_url("tracker.url", url)?;
        }
        if self.max_results == Some(0) {
            return Err(ConfigError::InvalidValue(
                "tracker.max_results must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "tracker.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(project) = &self.project {
            if project.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "tracker.project cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Report job settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    /// Query selecting the backlog (overrides the project-based default)
    pub jql: Option<String>,

    /// Component pattern that subjects an issue to tag checks
    pub priority_pattern: Option<String>,
}

impl ReportSettings {
    /// Validate the report section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(jql) = &self.jql {
            if jql.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "report.jql cannot be empty".to_string(),
                ));
            }
        }
        if let Some(pattern) = &self.priority_pattern {
            regex::Regex::new(pattern).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid report.priority_pattern: {}", e))
            })?;
        }
        Ok(())
    }
}

/// Monitoring server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ZabbixSettings {
    /// Host name the items belong to
    pub host: Option<String>,

    /// Server or proxy address
    pub server: Option<String>,

    /// Trapper port
    pub port: Option<u16>,

    /// Connect/read/write timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl ZabbixSettings {
    /// Validate the zabbix section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "zabbix.host cannot be empty".to_string(),
                ));
            }
        }
        if let Some(server) = &self.server {
            if server.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "zabbix.server cannot be empty".to_string(),
                ));
            }
        }
        if self.port == Some(0) {
            return Err(ConfigError::InvalidValue(
                "zabbix.port cannot be 0".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "zabbix.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bulk close settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CloseSettings {
    /// Transition executed on each matching issue
    pub transition_id: Option<String>,

    /// Resolution set by the transition
    pub resolution_id: Option<String>,

    /// Time logged with the transition; empty disables the worklog
    pub worklog: Option<String>,
}

impl CloseSettings {
    /// Validate the close section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(id) = &self.transition_id {
            if id.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "close.transition_id cannot be empty".to_string(),
                ));
            }
        }
        if let Some(id) = &self.resolution_id {
            if id.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "close.resolution_id cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn validate_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must start with http:// or https://, got '{}'",
            field, url
        )))
    }
}
