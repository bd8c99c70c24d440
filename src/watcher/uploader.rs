//! One-shot upload of a file to the remote endpoint.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::RelayError;
use super::uploaded::UploadedSet;

/// Status code that counts as a successful upload.
const STATUS_OK: u16 = 200;

/// Result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Server answered 200.
    Success { response: String },
    /// Server answered with any other status.
    HttpError { status: u16, body: String },
    /// The request never produced a response (connect, timeout, file I/O).
    TransportException { message: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }
}

/// File content ready to be sent as a multipart field.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Multipart field name.
    pub field: String,
    /// Original basename.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Raw server reply.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a single multipart POST.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Endpoint description for logging.
    fn endpoint(&self) -> &str;

    async fn send(&self, part: FilePart) -> Result<TransportResponse, RelayError>;
}

/// `reqwest` backed transport with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn send(&self, part: FilePart) -> Result<TransportResponse, RelayError> {
        let file = Part::bytes(part.bytes).file_name(part.file_name);
        let form = Form::new().part(part.field, file);

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}

/// Uploads files and folds successes into the [`UploadedSet`].
#[derive(Clone)]
pub struct Uploader {
    transport: Arc<dyn UploadTransport>,
    uploaded: UploadedSet,
    field_name: String,
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploader")
            .field("endpoint", &self.transport.endpoint())
            .field("uploaded", &self.uploaded.len())
            .field("field_name", &self.field_name)
            .finish()
    }
}

impl Uploader {
    pub fn new(transport: Arc<dyn UploadTransport>, uploaded: UploadedSet) -> Self {
        Self {
            transport,
            uploaded,
            field_name: "file".to_string(),
        }
    }

    /// Override the multipart field name (default `file`).
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn uploaded(&self) -> &UploadedSet {
        &self.uploaded
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Upload `path` once, as `name`.
    ///
    /// Returns `None` without touching the network when the path is already
    /// a member of the set, is being uploaded by another caller, or no
    /// longer exists. Otherwise returns the classified outcome; only
    /// `Success` adds the path to the set.
    pub async fn upload(&self, path: &Path, name: &str) -> Option<UploadOutcome> {
        let Some(claim) = self.uploaded.claim(path) else {
            crate::debug_event!("upload", "already handled", "{name}");
            return None;
        };

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::warn!("[upload] file not found: {}", path.display());
            return None;
        }

        crate::log_event!("upload", "sending", "{name} to {}", self.transport.endpoint());

        let outcome = match tokio::fs::read(path).await {
            Ok(bytes) => {
                let part = FilePart {
                    field: self.field_name.clone(),
                    file_name: name.to_string(),
                    bytes,
                };
                classify(self.transport.send(part).await)
            }
            Err(source) => UploadOutcome::TransportException {
                message: RelayError::Io {
                    path: path.to_path_buf(),
                    source,
                }
                .to_string(),
            },
        };

        match &outcome {
            UploadOutcome::Success { response } => {
                claim.commit();
                crate::log_event!("upload", "sent", "{name}");
                crate::log_event!("upload", "server response", "{response}");
            }
            UploadOutcome::HttpError { status, body } => {
                tracing::error!("[upload] failed to send {name}: status {status}");
                tracing::error!("[upload] response: {body}");
            }
            UploadOutcome::TransportException { message } => {
                tracing::error!("[upload] exception while sending {name}: {message}");
            }
        }

        Some(outcome)
    }
}

fn classify(result: Result<TransportResponse, RelayError>) -> UploadOutcome {
    match result {
        Ok(TransportResponse { status, body }) if status == STATUS_OK => {
            UploadOutcome::Success { response: body }
        }
        Ok(TransportResponse { status, body }) => UploadOutcome::HttpError { status, body },
        Err(e) => UploadOutcome::TransportException {
            message: e.to_string(),
        },
    }
}
