//! transport::zabbix
//!
//! Zabbix sender protocol over TCP.
//!
//! # Wire format
//!
//! Every message, in both directions, is one frame:
//!
//! ```text
//! +--------+------+-----------------+------------------+
//! | "ZBXD" | 0x01 | length (u64 LE) | JSON body        |
//! +--------+------+-----------------+------------------+
//!    4 B     1 B        8 B            `length` bytes
//! ```
//!
//! The request body is `{"request":"sender data","data":[{host,key,value}..]}`
//! and the reply body is `{"response":"success","info":"processed: ..."}`.
//! One connection carries exactly one request and one reply.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::traits::{Payload, SendSummary, Transport, TransportError};

/// Frame signature.
pub const SIGNATURE: &[u8; 4] = b"ZBXD";

/// Protocol flag for a plain (uncompressed) frame.
pub const FLAG_PLAIN: u8 = 0x01;

/// Header size: signature, flag and length.
pub const HEADER_LEN: usize = 13;

/// Default trapper port.
pub const DEFAULT_PORT: u16 = 10051;

/// Largest reply accepted.
const MAX_REPLY_LEN: u64 = 16 * 1024 * 1024;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sender for Zabbix trapper items.
#[derive(Clone)]
pub struct ZabbixSender {
    server: String,
    port: u16,
    timeout: Duration,
}

impl fmt::Debug for ZabbixSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZabbixSender")
            .field("address", &self.address())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct SenderRequest<'a> {
    request: &'static str,
    data: Vec<SenderItem<'a>>,
}

#[derive(Serialize)]
struct SenderItem<'a> {
    host: &'a str,
    key: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct SenderResponse {
    response: String,
    #[serde(default)]
    info: String,
}

impl ZabbixSender {
    /// Create a sender with the default timeout.
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self::with_timeout(server, port, DEFAULT_TIMEOUT)
    }

    /// Create a sender with a custom timeout, applied to connecting and to
    /// the request/reply exchange separately.
    pub fn with_timeout(server: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            port,
            timeout,
        }
    }

    /// `host:port` of the server.
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }

    async fn connect(&self) -> Result<TcpStream, TransportError> {
        let address = self.address();
        match tokio::time::timeout(self.timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(TransportError::Connect { address, source }),
            Err(_) => Err(TransportError::Timeout(self.timeout.as_secs())),
        }
    }

    async fn exchange(stream: &mut TcpStream, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        stream.write_all(frame).await?;
        stream.flush().await?;

        let mut header = [0u8; HEADER_LEN];
        stream.read_exact(&mut header).await?;
        let len = decode_header(&header)?;

        let mut body = vec![0u8; len as usize];
        stream.read_exact(&mut body).await?;
        Ok(body)
    }
}

/// Serialize the `sender data` request body for a payload.
///
/// Items are listed host by host, keys in sorted order.
pub fn request_body(payload: &Payload) -> Result<Vec<u8>, TransportError> {
    let data = payload
        .hosts
        .iter()
        .flat_map(|(host, items)| {
            items.iter().map(move |(key, value)| SenderItem {
                host,
                key,
                value,
            })
        })
        .collect();

    serde_json::to_vec(&SenderRequest {
        request: "sender data",
        data,
    })
    .map_err(|e| TransportError::Protocol(format!("cannot encode request: {}", e)))
}

/// Wrap a body in a frame.
pub fn encode_frame(body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(SIGNATURE);
    frame.push(FLAG_PLAIN);
    frame.extend_from_slice(&(body.len() as u64).to_le_bytes());
    frame.extend_from_slice(body);
    frame
}

/// Validate a frame header and return the body length.
pub fn decode_header(header: &[u8; HEADER_LEN]) -> Result<u64, TransportError> {
    if &header[..4] != SIGNATURE {
        return Err(TransportError::Protocol(
            "reply does not start with ZBXD".to_string(),
        ));
    }
    if header[4] != FLAG_PLAIN {
        return Err(TransportError::Protocol(format!(
            "unsupported protocol flag 0x{:02x}",
            header[4]
        )));
    }

    let mut len = [0u8; 8];
    len.copy_from_slice(&header[5..]);
    let len = u64::from_le_bytes(len);
    if len > MAX_REPLY_LEN {
        return Err(TransportError::Protocol(format!(
            "reply of {} bytes exceeds limit",
            len
        )));
    }
    Ok(len)
}

/// Interpret a reply body.
pub fn parse_reply(body: &[u8]) -> Result<SendSummary, TransportError> {
    let reply: SenderResponse = serde_json::from_slice(body)
        .map_err(|e| TransportError::Protocol(format!("invalid reply: {}", e)))?;

    if reply.response != "success" {
        let reason = if reply.info.is_empty() {
            reply.response
        } else {
            reply.info
        };
        return Err(TransportError::Rejected(reason));
    }

    Ok(SendSummary::parse(&reply.info))
}

#[async_trait]
impl Transport for ZabbixSender {
    fn name(&self) -> &'static str {
        "zabbix"
    }

    async fn send(&self, payload: &Payload) -> Result<SendSummary, TransportError> {
        let frame = encode_frame(&request_body(payload)?);
        tracing::debug!(
            address = %self.address(),
            items = payload.item_count(),
            bytes = frame.len(),
            "sending items"
        );

        let mut stream = self.connect().await?;
        let body = tokio::time::timeout(self.timeout, Self::exchange(&mut stream, &frame))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout.as_secs()))??;

        let summary = parse_reply(&body)?;
        tracing::debug!(info = %summary.info, "server replied");
        Ok(summary)
    }
}
