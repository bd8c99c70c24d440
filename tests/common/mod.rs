//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use filerelay::RelayError;
use filerelay::watcher::{FilePart, TransportResponse, UploadTransport};
use parking_lot::Mutex;

/// Transport that answers every request with a fixed status and records
/// each complete multipart part it receives.
///
/// With a delay, a part is recorded only once the delay has elapsed, so a
/// request abandoned midway never shows up in `sent`.
pub struct RecordingTransport {
    status: u16,
    body: String,
    delay: Duration,
    started: AtomicUsize,
    sent: Mutex<Vec<FilePart>>,
}

impl RecordingTransport {
    pub fn ok() -> Arc<Self> {
        Self::with_status(200, "{\"status\":\"received\"}")
    }

    pub fn with_status(status: u16, body: &str) -> Arc<Self> {
        Self::build(status, body, Duration::ZERO)
    }

    /// Accepts every request, but each one takes `delay` to complete.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(200, "{\"status\":\"received\"}", delay)
    }

    fn build(status: u16, body: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            delay,
            started: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Requests that have begun, finished or not.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn posts(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn sent(&self) -> Vec<FilePart> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl UploadTransport for RecordingTransport {
    fn endpoint(&self) -> &str {
        "http://recording.invalid/upload"
    }

    async fn send(&self, part: FilePart) -> Result<TransportResponse, RelayError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.sent.lock().push(part);
        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}
