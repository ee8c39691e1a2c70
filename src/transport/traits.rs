//! transport::traits
//!
//! Transport trait definition for delivering items to the monitoring server.
//!
//! # Design
//!
//! A [`Payload`] maps each monitored host to its item keys and values. The
//! transport sends the whole payload in one request and reports what the
//! server accepted as a [`SendSummary`]. The server answering "some items
//! failed" is not an error: unknown item keys are counted in `failed` and
//! the caller decides what to do with that.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::metrics::Items;

/// Errors from transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not open a connection to the server.
    #[error("cannot connect to {address}: {source}")]
    Connect {
        /// `host:port` that was dialed
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the connection failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server did not answer in time.
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// The reply was not a valid protocol frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered but refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Items to send, grouped by monitored host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Host name to item values
    pub hosts: BTreeMap<String, Items>,
}

impl Payload {
    /// Payload carrying `items` for a single host.
    pub fn for_host(host: impl Into<String>, items: Items) -> Self {
        let mut hosts = BTreeMap::new();
        hosts.insert(host.into(), items);
        Self { hosts }
    }

    /// Total number of items over all hosts.
    pub fn item_count(&self) -> usize {
        self.hosts.values().map(|items| items.len()).sum()
    }

    /// Items of one host.
    pub fn items(&self, host: &str) -> Option<&Items> {
        self.hosts.get(host)
    }

    /// True when no host carries any item.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

/// What the server reported after a send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendSummary {
    /// Items accepted
    pub processed: u64,
    /// Items refused (usually unknown host or item key)
    pub failed: u64,
    /// Items received
    pub total: u64,
    /// Raw info line from the server
    pub info: String,
}

impl SendSummary {
    /// Parse the server's info line.
    ///
    /// The line looks like
    /// `processed: 5; failed: 0; total: 5; seconds spent: 0.000055`.
    /// Missing fields stay zero; unknown fields are ignored.
    pub fn parse(info: &str) -> Self {
        let mut summary = SendSummary {
            info: info.to_string(),
            ..Default::default()
        };

        for part in info.split(';') {
            let Some((name, value)) = part.split_once(':') else {
                continue;
            };
            let value = value.trim().parse::<u64>().ok();
            match (name.trim(), value) {
                ("processed", Some(v)) => summary.processed = v,
                ("failed", Some(v)) => summary.failed = v,
                ("total", Some(v)) => summary.total = v,
                _ => {}
            }
        }

        summary
    }
}

impl fmt::Display for SendSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {}, failed {}, total {}",
            self.processed, self.failed, self.total
        )
    }
}

/// The Transport trait for delivering items.
///
/// Implementations must be `Send + Sync`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the transport name (e.g., "zabbix").
    fn name(&self) -> &'static str;

    /// Send every item of the payload in a single request.
    ///
    /// # Errors
    ///
    /// - `Connect`/`Timeout` if the server cannot be reached
    /// - `Protocol` if the reply is malformed
    /// - `Rejected` if the server refuses the request as a whole
    async fn send(&self, payload: &Payload) -> Result<SendSummary, TransportError>;
}
