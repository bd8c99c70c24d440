//! Size-based completion check.
//!
//! A file that is still being written grows between two reads, or briefly
//! disappears while the writer renames it into place. Reading the size twice
//! with a pause in between catches both. A zero-byte file is treated as not
//! yet materialized.
//!
//! This is a heuristic: a writer that stalls for longer than the interval is
//! reported complete, and one that pauses for exactly the interval can be
//! missed until its next modification event.

use std::path::Path;

use tokio::time::{Duration, sleep};

/// Decides whether a file's size has stopped changing.
#[derive(Debug, Clone, Copy)]
pub struct StabilityProbe {
    interval: Duration,
}

impl StabilityProbe {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Read the size, wait one interval, read again.
    ///
    /// Returns true only when both reads succeed, agree, and are non-zero.
    /// Read failures (missing file, permission denied) yield false.
    pub async fn is_complete(&self, path: &Path) -> bool {
        let Some(first) = file_size(path).await else {
            crate::debug_event!("probe", "unreadable", "{}", path.display());
            return false;
        };

        sleep(self.interval).await;

        let Some(second) = file_size(path).await else {
            crate::debug_event!("probe", "vanished", "{}", path.display());
            return false;
        };

        let complete = first == second && first > 0;
        crate::debug_event!(
            "probe",
            if complete { "stable" } else { "changing" },
            "{} ({first} -> {second} bytes)",
            path.display()
        );
        complete
    }
}

async fn file_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|m| m.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn probe() -> StabilityProbe {
        StabilityProbe::new(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_stable_non_empty_file_is_complete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC__done.csv");
        std::fs::write(&path, b"a,b,c\n1,2,3\n").unwrap();

        assert!(probe().is_complete(&path).await);
    }

    #[tokio::test]
    async fn test_zero_length_file_is_not_complete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC__empty.csv");
        std::fs::write(&path, b"").unwrap();

        assert!(!probe().is_complete(&path).await);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_complete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC__missing.csv");

        assert!(!probe().is_complete(&path).await);
    }

    #[tokio::test]
    async fn test_growing_file_is_not_complete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC__growing.csv");
        std::fs::write(&path, b"first chunk").unwrap();

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            let mut f = std::fs::OpenOptions::new()
                .append(true)
                .open(&writer_path)
                .unwrap();
            f.write_all(b" second chunk").unwrap();
        });

        assert!(!probe().is_complete(&path).await);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_file_removed_during_interval_is_not_complete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC__gone.csv");
        std::fs::write(&path, b"payload").unwrap();

        let remove_path = path.clone();
        let remover = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            std::fs::remove_file(&remove_path).unwrap();
        });

        assert!(!probe().is_complete(&path).await);
        remover.await.unwrap();
    }

    #[tokio::test]
    async fn test_repeated_probes_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC__again.csv");
        std::fs::write(&path, b"same bytes").unwrap();

        let p = StabilityProbe::new(Duration::from_millis(20));
        for _ in 0..3 {
            assert!(p.is_complete(&path).await);
        }
    }
}
