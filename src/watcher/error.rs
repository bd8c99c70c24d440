//! Error types for the relay pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher and upload operations.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Failed to build HTTP client: {reason}")]
    ClientBuild { reason: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot enumerate {path}: {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<notify::Error> for RelayError {
    fn from(e: notify::Error) -> Self {
        RelayError::InitFailed {
            reason: e.to_string(),
        }
    }
}
