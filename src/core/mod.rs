//! core
//!
//! Domain types, configuration and naming rules.
//!
//! # Modules
//!
//! - [`types`] - Strong types: IssueKey, Issue, MetricEntry
//! - [`naming`] - Monitoring-safe identifiers
//! - [`config`] - Labels file and runtime settings
//!
//! # Design Principles
//!
//! - Nothing in `core` performs network I/O
//! - Configuration is loaded once per run and passed down explicitly

pub mod config;
pub mod naming;
pub mod types;
