//! Creation and modification handling paths.
//!
//! A creation event waits a fixed settle delay and uploads without probing.
//! A modification event is ignored for paths already in the set, otherwise
//! it must pass the two-read stability probe first. Modifications fire many
//! times during one download, so the probe runs once per event.

use tokio::time::{Duration, sleep};

use crate::types::{UploadState, WatchedFile};

use super::probe::StabilityProbe;
use super::uploader::Uploader;

/// Drives probe and uploader for one matched file event.
#[derive(Debug, Clone)]
pub struct RelayHandler {
    uploader: Uploader,
    probe: StabilityProbe,
    settle_delay: Duration,
}

impl RelayHandler {
    pub fn new(uploader: Uploader, probe: StabilityProbe, settle_delay: Duration) -> Self {
        Self {
            uploader,
            probe,
            settle_delay,
        }
    }

    /// Handle a creation event.
    ///
    /// Does not consult the set before the delay; the uploader's own
    /// membership check still prevents a second upload.
    pub async fn on_created(&self, file: &WatchedFile) -> UploadState {
        crate::log_event!("watcher", "new file", "{}", file.name);

        sleep(self.settle_delay).await;
        self.upload(file).await
    }

    /// Handle a modification event.
    pub async fn on_modified(&self, file: &WatchedFile) -> UploadState {
        if let Some(state) = self.uploader.uploaded().state(&file.path) {
            crate::debug_event!("watcher", "already handled", "{} ({state})", file.name);
            return state;
        }

        if !self.probe.is_complete(&file.path).await {
            crate::debug_event!("watcher", "not stable yet", "{}", file.name);
            return UploadState::PendingStability;
        }

        crate::log_event!("watcher", "file complete", "{}", file.name);
        self.upload(file).await
    }

    async fn upload(&self, file: &WatchedFile) -> UploadState {
        match self.uploader.upload(&file.path, &file.name).await {
            Some(outcome) if outcome.is_success() => UploadState::Uploaded,
            Some(_) => UploadState::Failed,
            None => self
                .uploader
                .uploaded()
                .state(&file.path)
                .unwrap_or(UploadState::Failed),
        }
    }
}
