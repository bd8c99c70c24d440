//! Startup scan of the watched folder.
//!
//! Files already present when monitoring starts are recorded as handled and
//! never uploaded. Only files that arrive afterwards are candidates.

use std::path::Path;

use crate::types::{UploadState, WatchedFile};

use super::RelayError;
use super::matcher::NameMatcher;
use super::uploaded::UploadedSet;

/// Marks pre-existing matching files so they are never uploaded.
#[derive(Debug, Clone)]
pub struct Bootstrapper {
    matcher: NameMatcher,
    uploaded: UploadedSet,
}

impl Bootstrapper {
    pub fn new(matcher: NameMatcher, uploaded: UploadedSet) -> Self {
        Self { matcher, uploaded }
    }

    /// Scan direct children of `dir`.
    ///
    /// Errors are logged and stop the scan; entries marked before the error
    /// stay marked. Returns the files that were marked.
    pub fn run(&self, dir: &Path) -> Vec<WatchedFile> {
        crate::log_event!("bootstrap", "scanning", "{}", dir.display());

        let mut skipped = Vec::new();
        if let Err(e) = self.scan(dir, &mut skipped) {
            tracing::error!("[bootstrap] scan failed: {e}");
        }

        crate::log_event!("bootstrap", "done", "{} existing files skipped", skipped.len());
        skipped
    }

    fn scan(&self, dir: &Path, skipped: &mut Vec<WatchedFile>) -> Result<(), RelayError> {
        let enumeration = |source| RelayError::Enumeration {
            path: dir.to_path_buf(),
            source,
        };

        for entry in std::fs::read_dir(dir).map_err(enumeration)? {
            let entry = entry.map_err(enumeration)?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let file = WatchedFile::new(&path, &self.matcher);
            if !file.matched {
                continue;
            }

            crate::log_event!("bootstrap", "existing file", "{}", file.name);
            self.uploaded.mark_preexisting(&file.path);
            skipped.push(file.with_state(UploadState::SkippedPreexisting));
        }

        Ok(())
    }
}
