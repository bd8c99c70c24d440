use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::watcher::NameMatcher;

/// Where a file stands in the relay pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UploadState {
    /// Not a candidate yet (unmatched name, directory, or never looked at).
    Unseen,
    /// Seen, but its size has not settled.
    PendingStability,
    Uploaded,
    /// Present before the watcher started; never uploaded.
    SkippedPreexisting,
    /// The last attempt did not succeed. A later event may try again.
    Failed,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadState::Unseen => "unseen",
            UploadState::PendingStability => "pending-stability",
            UploadState::Uploaded => "uploaded",
            UploadState::SkippedPreexisting => "skipped-preexisting",
            UploadState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A file named by a filesystem event or the startup scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFile {
    /// Basename, used as the multipart file name.
    pub name: String,
    pub path: PathBuf,
    pub matched: bool,
    pub state: UploadState,
}

impl WatchedFile {
    /// Build from a path, deriving `name` and `matched`.
    ///
    /// Paths without a UTF-8 basename never match.
    pub fn new(path: &Path, matcher: &NameMatcher) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let matched = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| matcher.matches(n));

        Self {
            name,
            path: path.to_path_buf(),
            matched,
            state: UploadState::Unseen,
        }
    }

    pub fn with_state(mut self, state: UploadState) -> Self {
        self.state = state;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watched_file_derives_name_and_match() {
        let m = NameMatcher::new();
        let f = WatchedFile::new(Path::new("/tmp/dl/BOI__report.xlsx"), &m);
        assert_eq!(f.name, "BOI__report.xlsx");
        assert!(f.matched);
        assert_eq!(f.state, UploadState::Unseen);

        let f = WatchedFile::new(Path::new("/tmp/dl/abc.txt"), &m);
        assert_eq!(f.name, "abc.txt");
        assert!(!f.matched);
    }

    #[test]
    fn test_path_without_basename_does_not_match() {
        let f = WatchedFile::new(Path::new("/"), &NameMatcher::new());
        assert!(f.name.is_empty());
        assert!(!f.matched);
    }
}
