//! transport
//!
//! Delivery of monitoring items.
//!
//! # Modules
//!
//! - `traits`: `Transport` trait, [`Payload`] and [`SendSummary`]
//! - [`zabbix`]: Zabbix sender protocol over TCP
//! - [`mock`]: In-memory transport for tests
//!
//! Sending is all-or-nothing per request. There is no retry: a report that
//! cannot be delivered is simply missing on the server, which the monitoring
//! side alerts on by item staleness.

pub mod mock;
mod traits;
pub mod zabbix;

pub use traits::*;
