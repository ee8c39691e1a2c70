//! tracker
//!
//! Abstraction over the issue tracker (Jira).
//!
//! # Architecture
//!
//! The `Tracker` trait defines the operations the commands need: a session
//! check, a bounded query, and listing/executing issue transitions. Commands
//! receive a `&dyn Tracker`, so the report and close flows run unchanged
//! against [`mock::MockTracker`] in tests.
//!
//! # Modules
//!
//! - `traits`: Core `Tracker` trait and request/response types
//! - [`jira`]: Jira REST API v2 implementation
//! - [`mock`]: Mock implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use backlog_metrics::tracker::{jira::JiraTracker, Tracker};
//!
//! let tracker = JiraTracker::new("https://jira.example.com", "bot", password)?;
//! let info = tracker.server_info().await?;
//! println!("connected to {} {}", info.title, info.version);
//! ```

pub mod jira;
pub mod mock;
mod traits;

pub use traits::*;
