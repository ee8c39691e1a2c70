//! transport::mock
//!
//! In-memory transport that records what would have been sent.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{Payload, SendSummary, Transport, TransportError};

/// Mock transport for testing.
///
/// Clones share the recorded payloads.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    sent: Vec<Payload>,
    /// Reply returned as `Rejected` instead of succeeding.
    reject_with: Option<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail with `Rejected(reason)`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        let transport = Self::new();
        transport.inner.lock().unwrap().reject_with = Some(reason.into());
        transport
    }

    /// Payloads sent so far, in order. Rejected sends are recorded too.
    pub fn sent(&self) -> Vec<Payload> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// The most recent payload.
    pub fn last(&self) -> Option<Payload> {
        self.inner.lock().unwrap().sent.last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, payload: &Payload) -> Result<SendSummary, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.sent.push(payload.clone());

        if let Some(reason) = &inner.reject_with {
            return Err(TransportError::Rejected(reason.clone()));
        }

        let total = payload.item_count() as u64;
        Ok(SendSummary {
            processed: total,
            failed: 0,
            total,
            info: format!(
                "processed: {}; failed: 0; total: {}; seconds spent: 0.000001",
                total, total
            ),
        })
    }
}
