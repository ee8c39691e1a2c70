//! core::config::labels
//!
//! The labels file: which components and labels the report counts.
//!
//! # Format
//!
//! ```yaml
//! PRIORITIES:
//!   - PRIORITY1
//!   - PRIORITY2
//! ISSUE_TYPE:
//!   - Type_Bug
//!   - Type_Task
//! ```
//!
//! Both keys are required. Order matters: categories are matched in the
//! order listed (first match wins).

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Labels file used when `--config` is not given.
pub const DEFAULT_LABELS_FILE: &str = "labels_list.yaml";

/// Categories and issue-type labels to aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelsConfig {
    /// Component names, in match order
    #[serde(rename = "PRIORITIES")]
    pub priorities: Vec<String>,

    /// Issue-type labels
    #[serde(rename = "ISSUE_TYPE")]
    pub issue_types: Vec<String>,
}

impl LabelsConfig {
    /// Read and parse a labels file.
    ///
    /// # Errors
    ///
    /// - `ReadError` if the file cannot be read
    /// - `ParseError` if it is not valid YAML or lacks `PRIORITIES`/`ISSUE_TYPE`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents, path)
    }

    /// Parse labels from YAML text. `origin` is only used in error messages.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Issue types sorted lexicographically, for the config dump item.
    pub fn sorted_issue_types(&self) -> Vec<String> {
        let mut types = self.issue_types.clone();
        types.sort();
        types
    }
}
