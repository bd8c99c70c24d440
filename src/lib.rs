//! Watch a folder and upload each newly finished file exactly once.
//!
//! See [`watcher`] for the pipeline and [`config`] for settings.

pub mod cli;
pub mod config;
pub mod logging;
pub mod types;
pub mod watcher;

pub use config::Settings;
pub use types::{UploadState, WatchedFile};
pub use watcher::{
    Bootstrapper, NameMatcher, RelayError, RelayHandler, RelayWatcher, StabilityProbe,
    UploadOutcome, UploadedSet, Uploader,
};
