//! End-to-end runs of the watch loop over a real directory watcher.

mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use common::RecordingTransport;
use filerelay::{RelayWatcher, UploadedSet};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Running {
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), filerelay::RelayError>>,
}

impl Running {
    async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("watch loop stops after cancellation")
            .expect("watch task does not panic")
            .expect("watch loop exits cleanly");
    }
}

fn start(
    dir: &TempDir,
    transport: Arc<RecordingTransport>,
    uploaded: UploadedSet,
    settle_delay: Duration,
) -> Running {
    filerelay::logging::init();

    let watcher = RelayWatcher::builder()
        .dir(dir.path())
        .transport(transport)
        .uploaded(uploaded)
        .settle_delay(settle_delay)
        .probe_interval(Duration::from_millis(100))
        .build()
        .unwrap();

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(watcher.watch(shutdown.clone()));
    Running { shutdown, task }
}

/// Poll until `check` holds or the deadline passes.
async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}

/// Give the loop time to finish its startup scan and subscribe.
async fn settle_startup() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_file_is_posted_exactly_once() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::ok();
    let uploaded = UploadedSet::new();
    let running = start(
        &dir,
        transport.clone(),
        uploaded.clone(),
        Duration::from_millis(200),
    );
    settle_startup().await;

    let path = dir.path().join("BOI__report.xlsx");
    fs::write(&path, [9u8; 120]).unwrap();

    assert!(eventually(|| uploaded.contains(&path)).await);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].field, "file");
    assert_eq!(sent[0].file_name, "BOI__report.xlsx");
    assert_eq!(sent[0].bytes.len(), 120);

    // Rewrite the file: another modification event, no new POST
    fs::write(&path, [9u8; 120]).unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(transport.posts(), 1);

    running.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unmatched_names_and_directories_are_ignored() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::ok();
    let running = start(
        &dir,
        transport.clone(),
        UploadedSet::new(),
        Duration::from_millis(50),
    );
    settle_startup().await;

    let plain = dir.path().join("abc.txt");
    fs::write(&plain, b"first").unwrap();
    fs::write(&plain, b"second version").unwrap();
    fs::create_dir(dir.path().join("ABC__folder")).unwrap();

    // A matching file afterwards proves the earlier events were processed
    let marker = dir.path().join("ZZZ__marker.csv");
    fs::write(&marker, b"marker").unwrap();
    assert!(eventually(|| transport.posts() >= 1).await);
    tokio::time::sleep(Duration::from_millis(300)).await;

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].file_name, "ZZZ__marker.csv");

    running.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_files_present_at_startup_are_not_posted() {
    let dir = TempDir::new().unwrap();
    let old = dir.path().join("OLD__statement.csv");
    fs::write(&old, b"already here").unwrap();

    let transport = RecordingTransport::ok();
    let uploaded = UploadedSet::new();
    let running = start(
        &dir,
        transport.clone(),
        uploaded.clone(),
        Duration::from_millis(50),
    );
    settle_startup().await;
    assert!(uploaded.contains(&old));

    fs::write(&old, b"already here, rewritten").unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(transport.posts(), 0);

    running.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_during_settle_delay_sends_whole_file_or_nothing() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::ok();
    let running = start(
        &dir,
        transport.clone(),
        UploadedSet::new(),
        Duration::from_millis(500),
    );
    settle_startup().await;

    let path = dir.path().join("ABC__x.csv");
    fs::write(&path, [5u8; 64]).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    running.stop().await;

    let sent = transport.sent();
    assert!(sent.len() <= 1);
    for part in sent {
        assert_eq!(part.file_name, "ABC__x.csv");
        assert_eq!(part.bytes.len(), 64);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_mid_upload_finishes_it_despite_event_backlog() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::slow(Duration::from_millis(1500));
    let uploaded = UploadedSet::new();
    let running = start(
        &dir,
        transport.clone(),
        uploaded.clone(),
        Duration::from_millis(50),
    );
    settle_startup().await;

    let path = dir.path().join("ABC__big.bin");
    fs::write(&path, [3u8; 256]).unwrap();
    assert!(eventually(|| transport.started() == 1).await);

    // Far more events than the channel holds, queued behind the upload
    for i in 0..400 {
        fs::write(dir.path().join(format!("noise-{i}.txt")), b"x").unwrap();
    }

    let started = tokio::time::Instant::now();
    running.stop().await;
    assert!(started.elapsed() < Duration::from_secs(10));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].file_name, "ABC__big.bin");
    assert_eq!(sent[0].bytes.len(), 256);
    assert!(uploaded.contains(&path));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_directory_fails_to_start() {
    let dir = TempDir::new().unwrap();
    let watcher = RelayWatcher::builder()
        .dir(dir.path().join("does-not-exist"))
        .transport(RecordingTransport::ok())
        .build()
        .unwrap();

    let result = watcher.watch(CancellationToken::new()).await;
    assert!(result.is_err());
}
