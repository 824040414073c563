//! Fixtures shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::feed::SnapshotSource;
use crate::monitor::callsign::ActiveSet;
use crate::monitor::message::OutboundMessage;
use crate::notify::Notifier;
use crate::utils::error::{DeliveryError, FetchError};

/// Answer one HTTP request with the given status line and JSON body.
///
/// The handle resolves to the raw request (head and body) that was received.
pub async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
        request
    });

    (format!("http://{addr}"), handle)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let n = stream.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&raw);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if raw.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&raw).into_owned()
}

/// Snapshot source that replays a script of results. A successful final
/// entry is repeated forever; otherwise an exhausted script yields empty sets.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<ActiveSet, FetchError>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<ActiveSet, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

/// A `FetchError` that needs no network.
pub fn status_error(status: u16) -> FetchError {
    FetchError::Status { status }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self) -> Result<ActiveSet, FetchError> {
        let mut script = self.script.lock().unwrap();
        match script.pop_front() {
            Some(Ok(active)) => {
                if script.is_empty() {
                    script.push_back(Ok(active.clone()));
                }
                Ok(active)
            }
            Some(Err(e)) => Err(e),
            None => Ok(ActiveSet::new()),
        }
    }
}

/// Notifier that records every message, optionally failing some of them.
#[derive(Default)]
pub struct RecordingNotifier {
    pub delivered: Mutex<Vec<OutboundMessage>>,
    fail_mentions: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_mentions() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            fail_mentions: true,
        }
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        if self.fail_mentions && message.user().is_some() {
            return Err(DeliveryError::Closed);
        }
        self.delivered.lock().unwrap().push(message.clone());
        Ok(())
    }
}
