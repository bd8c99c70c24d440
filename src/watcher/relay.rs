//! Directory watcher that relays finished files to the uploader.

use std::path::PathBuf;
use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::types::WatchedFile;

use super::bootstrap::Bootstrapper;
use super::error::RelayError;
use super::handler::RelayHandler;
use super::matcher::NameMatcher;
use super::probe::StabilityProbe;
use super::uploaded::UploadedSet;
use super::uploader::{UploadTransport, Uploader};

/// A raw notify event reduced to what the pipeline acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Created(PathBuf),
    Modified(PathBuf),
}

/// Map a notify event to creation/modification events.
///
/// Folder creations, accesses and removals are dropped. For renames only the
/// destination counts, as a modification: browsers download into a
/// temporary name and rename on completion.
pub fn classify(event: &Event) -> Vec<FileEvent> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => event.paths.iter().cloned().map(FileEvent::Created).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
            .paths
            .last()
            .cloned()
            .map(FileEvent::Modified)
            .into_iter()
            .collect(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .cloned()
            .map(FileEvent::Modified)
            .collect(),
        _ => Vec::new(),
    }
}

/// Watches one directory, non-recursively, and uploads each new matching
/// file at most once.
///
/// Events are handled one at a time on the loop task: a settle delay, a
/// probe or an upload holds back the next event until it finishes.
pub struct RelayWatcher {
    dir: PathBuf,
    matcher: NameMatcher,
    handler: RelayHandler,
    uploaded: UploadedSet,
    /// Channel for receiving file events.
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// The underlying file watcher.
    watcher: notify::RecommendedWatcher,
}

impl std::fmt::Debug for RelayWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayWatcher")
            .field("dir", &self.dir)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

impl RelayWatcher {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> RelayWatcherBuilder {
        RelayWatcherBuilder::new()
    }

    pub fn uploaded(&self) -> &UploadedSet {
        &self.uploaded
    }

    /// Scan existing files, subscribe, and process events until `shutdown`
    /// is cancelled.
    ///
    /// Cancellation is observed between events only; an event being handled
    /// runs to completion, including its upload. Returns an error only if the
    /// directory subscription cannot be set up.
    pub async fn watch(mut self, shutdown: CancellationToken) -> Result<(), RelayError> {
        Bootstrapper::new(self.matcher, self.uploaded.clone()).run(&self.dir);

        self.watcher
            .watch(&self.dir, RecursiveMode::NonRecursive)
            .map_err(|e| RelayError::PathWatchFailed {
                path: self.dir.clone(),
                reason: e.to_string(),
            })?;

        crate::log_event!("watcher", "active", "waiting for new files in {}", self.dir.display());

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    crate::log_event!("watcher", "stopping");
                    break;
                }

                res = self.event_rx.recv() => {
                    match res {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                        None => {
                            tracing::warn!("[watcher] event channel closed");
                            break;
                        }
                    }
                }
            }
        }

        // Unblock the notify thread if it is parked on a full channel; the
        // watch itself is released when `self.watcher` drops.
        self.event_rx.close();
        crate::log_event!("watcher", "stopped");
        Ok(())
    }

    /// Handle an incoming notify event.
    async fn handle_event(&self, event: Event) {
        for file_event in classify(&event) {
            let (path, created) = match file_event {
                FileEvent::Created(path) => (path, true),
                FileEvent::Modified(path) => (path, false),
            };

            if path.is_dir() {
                continue;
            }

            let file = WatchedFile::new(&path, &self.matcher);
            if !file.matched {
                crate::debug_event!("watcher", "unmatched", "{:?} {}", event.kind, path.display());
                continue;
            }

            let state = if created {
                self.handler.on_created(&file).await
            } else {
                self.handler.on_modified(&file).await
            };
            crate::debug_event!("watcher", "handled", "{} -> {state}", file.name);
        }
    }
}

/// Builder for constructing a RelayWatcher.
pub struct RelayWatcherBuilder {
    dir: Option<PathBuf>,
    transport: Option<Arc<dyn UploadTransport>>,
    uploaded: UploadedSet,
    field_name: String,
    settle_delay: Duration,
    probe_interval: Duration,
}

impl RelayWatcherBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            dir: None,
            transport: None,
            uploaded: UploadedSet::new(),
            field_name: "file".to_string(),
            settle_delay: Duration::from_secs(2),
            probe_interval: Duration::from_secs(1),
        }
    }

    /// Set the directory to watch.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Set the upload transport.
    pub fn transport(mut self, transport: Arc<dyn UploadTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Share an existing set instead of starting from an empty one.
    pub fn uploaded(mut self, uploaded: UploadedSet) -> Self {
        self.uploaded = uploaded;
        self
    }

    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Delay after a creation event before uploading.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Pause between the two size reads of the stability probe.
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Build the RelayWatcher.
    pub fn build(self) -> Result<RelayWatcher, RelayError> {
        let dir = self.dir.ok_or_else(|| RelayError::InitFailed {
            reason: "Watch directory is required".to_string(),
        })?;

        let transport = self.transport.ok_or_else(|| RelayError::InitFailed {
            reason: "Upload transport is required".to_string(),
        })?;

        let uploader =
            Uploader::new(transport, self.uploaded.clone()).with_field_name(self.field_name);
        let handler = RelayHandler::new(
            uploader,
            StabilityProbe::new(self.probe_interval),
            self.settle_delay,
        );

        // Create channel for events
        let (tx, rx) = mpsc::channel(100);

        // Create the notify watcher
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(RelayWatcher {
            dir,
            matcher: NameMatcher::new(),
            handler,
            uploaded: self.uploaded,
            event_rx: rx,
            watcher,
        })
    }
}

impl Default for RelayWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
