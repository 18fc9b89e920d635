//! Common test utilities: a scripted lookup backend and a canned HTTP server

#![allow(dead_code)]

use opsearch::search::{ResultRecord, SearchBackend, SearchError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Quiescence interval used throughout the tests
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// A reply the scripted backend can produce
#[derive(Debug, Clone)]
pub enum Reply {
    Records(Vec<ResultRecord>),
    Status(u16, Option<String>),
    Malformed,
}

impl Reply {
    fn into_result(self) -> Result<Vec<ResultRecord>, SearchError> {
        match self {
            Reply::Records(records) => Ok(records),
            Reply::Status(status, message) => Err(SearchError::HttpStatus { status, message }),
            Reply::Malformed => Err(SearchError::Malformed("expected value".to_string())),
        }
    }
}

/// Backend that records every lookup.
///
/// Queries with a canned reply answer immediately; all others block until
/// the test calls `release`.
#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<String>>,
    canned: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, oneshot::Sender<Reply>>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `query` immediately with `reply`
    pub fn answer(&self, query: &str, reply: Reply) {
        self.canned.lock().unwrap().insert(query.to_string(), reply);
    }

    /// Resolve a blocked lookup. Returns false if nobody is waiting any more.
    pub fn release(&self, query: &str, reply: Reply) -> bool {
        match self.gates.lock().unwrap().remove(query) {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SearchBackend for ScriptedBackend {
    async fn lookup(&self, query: &str) -> Result<Vec<ResultRecord>, SearchError> {
        self.calls.lock().unwrap().push(query.to_string());

        if let Some(reply) = self.canned.lock().unwrap().get(query).cloned() {
            return reply.into_result();
        }

        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(query.to_string(), tx);
        match rx.await {
            Ok(reply) => reply.into_result(),
            Err(_) => Err(SearchError::Malformed("gate dropped".to_string())),
        }
    }
}

pub fn acme() -> ResultRecord {
    ResultRecord::new(1u64, "00.000.000/0001-00", "Acme LTDA")
}

/// Let the debounce interval (plus a margin) elapse under paused time
pub async fn settle() {
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;
}

/// Let spawned tasks run without moving the clock
pub async fn run_pending() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Serve exactly one HTTP response and report the raw request it answered.
///
/// Returns the base URL to use as endpoint and a receiver for the request.
pub async fn serve_once(
    status_line: &str,
    body: &str,
) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("Failed to accept");
        let mut buf = vec![0u8; 8192];
        let mut request = Vec::new();
        loop {
            let n = socket.read(&mut buf).await.expect("Failed to read request");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        socket
            .write_all(response.as_bytes())
            .await
            .expect("Failed to write response");
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
    });

    (format!("http://{}/api/search", addr), rx)
}
