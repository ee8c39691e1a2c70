//! backlog-metrics - Jira backlog metrics for Zabbix
//!
//! A single binary (`blm`) with two batch jobs, both meant to be started by
//! a scheduler:
//!
//! - `blm report` counts the open backlog by priority component and
//!   issue-type label and pushes the counters, a discovery document and a
//!   status flag to Zabbix trapper items
//! - `blm close` transitions every issue matching a JQL query
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, runs commands)
//! - [`core`] - Domain types, label normalization, configuration
//! - [`metrics`] - Problem-tag detection, aggregation, payload rendering
//! - [`tracker`] - Issue tracker abstraction (Jira)
//! - [`transport`] - Monitoring transport abstraction (Zabbix sender)
//! - [`ui`] - Output helpers
//!
//! # Invariants
//!
//! 1. Every metric key is derived from its names by [`core::naming::normalize`]
//! 2. An issue with problem tags contributes to no counter
//! 3. A report run always ends with an `exitcode` item
//! 4. An issue is transitioned only when it offers the target transition

pub mod cli;
pub mod core;
pub mod metrics;
pub mod tracker;
pub mod transport;
pub mod ui;
