//! Process-wide record of files that must never be uploaded again.
//!
//! Membership is permanent for the life of the process. Nothing is
//! persisted: after a restart the startup scan re-marks whatever is still in
//! the folder.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::UploadState;

/// Why a path is a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Uploaded,
    Preexisting,
}

#[derive(Debug, Default)]
struct Inner {
    members: HashMap<PathBuf, Membership>,
    /// Paths with an upload attempt in progress.
    in_flight: HashSet<PathBuf>,
}

/// Shared set of uploaded or intentionally skipped paths.
///
/// Cloning yields another handle to the same set.
#[derive(Debug, Clone, Default)]
pub struct UploadedSet {
    inner: Arc<Mutex<Inner>>,
}

impl UploadedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.lock().members.contains_key(path)
    }

    /// Record a successful upload.
    pub fn add(&self, path: impl Into<PathBuf>) {
        self.inner
            .lock()
            .members
            .insert(path.into(), Membership::Uploaded);
    }

    /// Record a file found by the startup scan. An existing entry wins.
    pub fn mark_preexisting(&self, path: impl Into<PathBuf>) {
        self.inner
            .lock()
            .members
            .entry(path.into())
            .or_insert(Membership::Preexisting);
    }

    /// Membership state, or `None` if the path is not a member.
    pub fn state(&self, path: &Path) -> Option<UploadState> {
        self.inner.lock().members.get(path).map(|m| match m {
            Membership::Uploaded => UploadState::Uploaded,
            Membership::Preexisting => UploadState::SkippedPreexisting,
        })
    }

    pub fn len(&self) -> usize {
        self.inner.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically reserve `path` for one upload attempt.
    ///
    /// Returns `None` if the path is already a member or another attempt
    /// holds it. The membership check and the reservation happen under one
    /// lock, so two callers can never both pass.
    pub fn claim(&self, path: &Path) -> Option<UploadClaim> {
        let mut inner = self.inner.lock();
        if inner.members.contains_key(path) || inner.in_flight.contains(path) {
            return None;
        }
        inner.in_flight.insert(path.to_path_buf());

        Some(UploadClaim {
            set: self.clone(),
            path: path.to_path_buf(),
            committed: false,
        })
    }

    pub fn is_in_flight(&self, path: &Path) -> bool {
        self.inner.lock().in_flight.contains(path)
    }
}

/// Reservation returned by [`UploadedSet::claim`].
///
/// `commit` records the path as uploaded. Dropping without committing only
/// releases the reservation, so a later event can try again.
#[derive(Debug)]
pub struct UploadClaim {
    set: UploadedSet,
    path: PathBuf,
    committed: bool,
}

impl UploadClaim {
    pub fn commit(mut self) {
        let mut inner = self.set.inner.lock();
        inner.in_flight.remove(&self.path);
        inner
            .members
            .insert(self.path.clone(), Membership::Uploaded);
        self.committed = true;
    }
}

impl Drop for UploadClaim {
    fn drop(&mut self) {
        if !self.committed {
            self.set.inner.lock().in_flight.remove(&self.path);
        }
    }
}
