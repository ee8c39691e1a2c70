//! Integration tests for the Zabbix sender against a local TCP server.

use std::time::Duration;

use backlog_metrics::metrics::Items;
use backlog_metrics::transport::zabbix::{encode_frame, ZabbixSender, HEADER_LEN};
use backlog_metrics::transport::{Payload, Transport, TransportError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn payload() -> Payload {
    let mut items = Items::new();
    items.insert("metric_[sum_type_bug]".into(), "4".into());
    items.insert("exitcode".into(), "1".into());
    Payload::for_host("backlog", items)
}

/// Accept one connection, capture the request body and answer with `reply`.
async fn serve_once(reply: Vec<u8>) -> (u16, JoinHandle<serde_json::Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut header = [0u8; HEADER_LEN];
        socket.read_exact(&mut header).await.unwrap();
        assert_eq!(&header[..5], b"ZBXD\x01");
        let mut len = [0u8; 8];
        len.copy_from_slice(&header[5..]);
        let mut body = vec![0u8; u64::from_le_bytes(len) as usize];
        socket.read_exact(&mut body).await.unwrap();

        socket.write_all(&reply).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    });

    (port, handle)
}

#[tokio::test]
async fn sends_items_and_parses_reply() {
    let reply = encode_frame(
        br#"{"response":"success","info":"processed: 2; failed: 0; total: 2; seconds spent: 0.000031"}"#,
    );
    let (port, server) = serve_once(reply).await;

    let sender = ZabbixSender::new("127.0.0.1", port);
    let summary = sender.send(&payload()).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);

    let request = server.await.unwrap();
    assert_eq!(request["request"], "sender data");
    let data = request["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|d| d["host"] == "backlog"));
    assert!(data
        .iter()
        .any(|d| d["key"] == "metric_[sum_type_bug]" && d["value"] == "4"));
}

#[tokio::test]
async fn partially_failed_items_are_not_an_error() {
    let reply = encode_frame(
        br#"{"response":"success","info":"processed: 1; failed: 1; total: 2; seconds spent: 0.0001"}"#,
    );
    let (port, server) = serve_once(reply).await;

    let summary = ZabbixSender::new("127.0.0.1", port)
        .send(&payload())
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);
    server.await.unwrap();
}

#[tokio::test]
async fn failed_response_is_rejected() {
    let reply = encode_frame(br#"{"response":"failed","info":"invalid data"}"#);
    let (port, server) = serve_once(reply).await;

    let err = ZabbixSender::new("127.0.0.1", port)
        .send(&payload())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Rejected(ref r) if r == "invalid data"));
    server.await.unwrap();
}

#[tokio::test]
async fn garbage_reply_is_protocol_error() {
    let (port, server) = serve_once(b"HTTP/1.1 400 Bad Request\r\n\r\n".to_vec()).await;

    let err = ZabbixSender::new("127.0.0.1", port)
        .send(&payload())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Protocol(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn refused_connection_is_connect_error() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = ZabbixSender::new("127.0.0.1", port)
        .send(&payload())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Connect { .. }));
}

#[tokio::test]
async fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        drop(socket);
    });

    let sender = ZabbixSender::with_timeout("127.0.0.1", port, Duration::from_millis(200));
    let err = sender.send(&payload()).await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)));
    server.abort();
}
