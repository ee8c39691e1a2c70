//! core::config
//!
//! Configuration loading.
//!
//! # Overview
//!
//! Two independent inputs:
//! - **Labels file** ([`LabelsConfig`]): YAML, selects what the report counts
//! - **Settings** ([`Settings`]): TOML plus environment, says where the
//!   tracker and the monitoring server live and how to authenticate
//!
//! # Precedence
//!
//! Settings values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Settings file (first one found, see [`schema`])
//! 3. `BLM_*` environment variables
//! 4. CLI flags (not handled here)
//!
//! # Example
//!
//! ```no_run
//! use backlog_metrics::core::config::Settings;
//!
//! let settings = Settings::load(None).unwrap();
//! println!("Zabbix port: {}", settings.zabbix_port());
//! println!("Max results: {}", settings.max_results());
//! ```

pub mod labels;
pub mod schema;

pub use labels::{LabelsConfig, DEFAULT_LABELS_FILE};
pub use schema::{CloseSettings, ReportSettings, SettingsFile, TrackerSettings, ZabbixSettings};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Environment variable naming an explicit settings file.
pub const SETTINGS_ENV: &str = "BLM_SETTINGS";

/// Default query selecting the open backlog. `{project}` is substituted.
pub const DEFAULT_REPORT_JQL: &str = "project = {project} AND resolution = Unresolved \
     AND status != Done AND (labels not in (onduty) OR labels is EMPTY) AND type != Epic";

/// Default component pattern for problem-tag checks.
pub const DEFAULT_PRIORITY_PATTERN: &str = "PRIORITY[0-9]";

const DEFAULT_MAX_RESULTS: u32 = 1000;
const DEFAULT_TRACKER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ZABBIX_PORT: u16 = 10051;
const DEFAULT_ZABBIX_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TRANSITION_ID: &str = "91";
const DEFAULT_RESOLUTION_ID: &str = "1";
const DEFAULT_WORKLOG: &str = "1";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("missing required setting '{0}'")]
    Missing(&'static str),
}

/// Resolved runtime settings.
///
/// Accessors apply defaults; required values are returned as `Result` so
/// each command only fails on the settings it actually needs.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Parsed file contents with environment overrides applied
    pub file: SettingsFile,
    /// Path the file was loaded from (if any)
    path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the standard locations and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be parsed, if an
    /// explicit path cannot be read, or if validation fails.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(explicit, |name| std::env::var(name).ok())
    }

    /// Load settings using `env` to look up environment variables.
    pub fn load_with_env<F>(explicit: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mut file, path) = match explicit {
            Some(path) => (Self::read_settings(path)?, Some(path.to_path_buf())),
            None => {
                match candidate_paths(&env, dirs::home_dir())
                    .into_iter()
                    .find(|p| p.exists())
                {
                    Some(path) => (Self::read_settings(&path)?, Some(path)),
                    None => (SettingsFile::default(), None),
                }
            }
        };

        apply_env_overrides(&mut file, &env)?;
        file.validate()?;

        Ok(Self { file, path })
    }

    /// Build settings from an already parsed file (no environment lookup).
    pub fn from_file(file: SettingsFile) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self { file, path: None })
    }

    /// Read and parse a settings file.
    fn read_settings(path: &Path) -> Result<SettingsFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    fn tracker(&self) -> Option<&TrackerSettings> {
        self.file.tracker.as_ref()
    }

    fn zabbix(&self) -> Option<&ZabbixSettings> {
        self.file.zabbix.as_ref()
    }

    fn close(&self) -> Option<&CloseSettings> {
        self.file.close.as_ref()
    }

    /// Tracker base URL, without a trailing slash.
    pub fn tracker_url(&self) -> Result<&str, ConfigError> {
        self.tracker()
            .and_then(|t| t.url.as_deref())
            .map(|url| url.trim_end_matches('/'))
            .ok_or(ConfigError::Missing("tracker.url"))
    }

    /// Account used by the report job.
    pub fn tracker_user(&self) -> Result<&str, ConfigError> {
        self.tracker()
            .and_then(|t| t.user.as_deref())
            .ok_or(ConfigError::Missing("tracker.user"))
    }

    /// Password of the report account.
    pub fn tracker_password(&self) -> Result<&str, ConfigError> {
        self.tracker()
            .and_then(|t| t.password.as_deref())
            .ok_or(ConfigError::Missing("tracker.password"))
    }

    /// Upper bound on issues fetched per search.
    ///
    /// Defaults to 1000 if not configured.
    pub fn max_results(&self) -> u32 {
        self.tracker()
            .and_then(|t| t.max_results)
            .unwrap_or(DEFAULT_MAX_RESULTS)
    }

    /// HTTP timeout for tracker requests.
    ///
    /// Defaults to 30 seconds if not configured.
    pub fn tracker_timeout(&self) -> Duration {
        Duration::from_secs(
            self.tracker()
                .and_then(|t| t.timeout_secs)
                .unwrap_or(DEFAULT_TRACKER_TIMEOUT_SECS),
        )
    }

    /// Query selecting the backlog for the report.
    ///
    /// Uses `report.jql` when set, otherwise the default query for
    /// `tracker.project`.
    pub fn report_jql(&self) -> Result<String, ConfigError> {
        if let Some(jql) = self.file.report.as_ref().and_then(|r| r.jql.as_deref()) {
            return Ok(jql.to_string());
        }
        let project = self
            .tracker()
            .and_then(|t| t.project.as_deref())
            .ok_or(ConfigError::Missing("tracker.project"))?;
        Ok(DEFAULT_REPORT_JQL.replace("{project}", project))
    }

    /// Component pattern for problem-tag checks.
    ///
    /// Defaults to `PRIORITY[0-9]` if not configured.
    pub fn priority_pattern(&self) -> &str {
        self.file
            .report
            .as_ref()
            .and_then(|r| r.priority_pattern.as_deref())
            .unwrap_or(DEFAULT_PRIORITY_PATTERN)
    }

    /// Host name the report items belong to.
    pub fn zabbix_host(&self) -> Result<&str, ConfigError> {
        self.zabbix()
            .and_then(|z| z.host.as_deref())
            .ok_or(ConfigError::Missing("zabbix.host"))
    }

    /// Zabbix server or proxy address.
    pub fn zabbix_server(&self) -> Result<&str, ConfigError> {
        self.zabbix()
            .and_then(|z| z.server.as_deref())
            .ok_or(ConfigError::Missing("zabbix.server"))
    }

    /// Trapper port.
    ///
    /// Defaults to 10051 if not configured.
    pub fn zabbix_port(&self) -> u16 {
        self.zabbix()
            .and_then(|z| z.port)
            .unwrap_or(DEFAULT_ZABBIX_PORT)
    }

    /// Timeout for each Zabbix socket operation.
    ///
    /// Defaults to 10 seconds if not configured.
    pub fn zabbix_timeout(&self) -> Duration {
        Duration::from_secs(
            self.zabbix()
                .and_then(|z| z.timeout_secs)
                .unwrap_or(DEFAULT_ZABBIX_TIMEOUT_SECS),
        )
    }

    /// Transition executed by `close`.
    ///
    /// Defaults to `91` if not configured.
    pub fn close_transition_id(&self) -> &str {
        self.close()
            .and_then(|c| c.transition_id.as_deref())
            .unwrap_or(DEFAULT_TRANSITION_ID)
    }

    /// Resolution set by `close`.
    ///
    /// Defaults to `1` if not configured.
    pub fn close_resolution_id(&self) -> &str {
        self.close()
            .and_then(|c| c.resolution_id.as_deref())
            .unwrap_or(DEFAULT_RESOLUTION_ID)
    }

    /// Time logged by `close`, or `None` when the worklog is disabled.
    ///
    /// Defaults to `1` if not configured.
    pub fn close_worklog(&self) -> Option<&str> {
        let worklog = self
            .close()
            .and_then(|c| c.worklog.as_deref())
            .unwrap_or(DEFAULT_WORKLOG);
        if worklog.is_empty() {
            None
        } else {
            Some(worklog)
        }
    }

    /// Get the path the settings were loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Settings files to try, in order, when no explicit path is given.
pub fn candidate_paths<F>(env: &F, home: Option<PathBuf>) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let mut paths = Vec::new();
    if let Some(path) = env(SETTINGS_ENV) {
        paths.push(PathBuf::from(path));
    }
    if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg_home).join("blm/settings.toml"));
    }
    if let Some(home) = home {
        paths.push(home.join(".blm/settings.toml"));
    }
    paths
}

/// Apply `BLM_*` environment overrides on top of the file values.
fn apply_env_overrides<F>(file: &mut SettingsFile, env: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let tracker_overrides = [
        env("BLM_TRACKER_URL"),
        env("BLM_TRACKER_USER"),
        env("BLM_TRACKER_PASSWORD"),
        env("BLM_TRACKER_PROJECT"),
    ];
    if tracker_overrides.iter().any(Option::is_some) {
        let [url, user, password, project] = tracker_overrides;
        let tracker = file.tracker.get_or_insert_with(Default::default);
        if url.is_some() {
            tracker.url = url;
        }
        if user.is_some() {
            tracker.user = user;
        }
        if password.is_some() {
            tracker.password = password;
        }
        if project.is_some() {
            tracker.project = project;
        }
    }

    let port = env("BLM_ZABBIX_PORT")
        .map(|raw| {
            raw.parse::<u16>().map_err(|_| {
                ConfigError::InvalidValue(format!("BLM_ZABBIX_PORT is not a port: '{}'", raw))
            })
        })
        .transpose()?;
    let host = env("BLM_ZABBIX_HOST");
    let server = env("BLM_ZABBIX_SERVER");
    if host.is_some() || server.is_some() || port.is_some() {
        let zabbix = file.zabbix.get_or_insert_with(Default::default);
        if host.is_some() {
            zabbix.host = host;
        }
        if server.is_some() {
            zabbix.server = server;
        }
        if port.is_some() {
            zabbix.port = port;
        }
    }

    Ok(())
}
