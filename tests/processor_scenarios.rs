#![cfg(unix)]

mod common;
use crate::common::builders::ConfigBuilder;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{tempdir, TempDir};

use watchcmd::config::ConfigFile;
use watchcmd::engine::EventProcessor;
use watchcmd::exec::CommandStatus;
use watchcmd::fs::{FileSystem, RealFileSystem};
use watchcmd::types::EventOp;
use watchcmd::watch::mock::MockBackend;
use watchcmd::watch::WatchEvent;

type TestResult = Result<(), Box<dyn Error>>;

struct Harness {
    _dir: TempDir,
    /// The root as handed to the processor (what `%f` is built from).
    given_root: PathBuf,
    /// Canonical root; event paths live under it.
    root: PathBuf,
    backend: MockBackend,
    processor: EventProcessor<MockBackend>,
}

fn harness(cfg: &ConfigFile) -> Harness {
    init_tracing();
    let dir = tempdir().unwrap();
    let given_root = dir.path().to_path_buf();
    let backend = MockBackend::new();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let mut processor = EventProcessor::new(cfg, &given_root, backend.clone(), fs).unwrap();
    processor.register_root().unwrap();
    let root = processor.root().to_path_buf();

    Harness {
        _dir: dir,
        given_root,
        root,
        backend,
        processor,
    }
}

fn event(root: &Path, rel: &str, op: EventOp) -> WatchEvent {
    WatchEvent::new(root.join(rel), op)
}

#[tokio::test]
async fn identical_writes_after_create_run_once() -> TestResult {
    let cfg = ConfigBuilder::new()
        .command("echo %t %f")
        .interval("0")
        .include(".*")
        .build();
    let mut h = harness(&cfg);

    fs::write(h.root.join("a.txt"), "hello")?;

    let mut batches = Vec::new();
    for op in [EventOp::CREATE, EventOp::WRITE, EventOp::WRITE] {
        if let Some(report) = h.processor.handle(event(&h.root, "a.txt", op)).await {
            batches.push(report);
        }
    }

    assert_eq!(batches.len(), 1);
    let report = &batches[0];
    assert_eq!(report.event.op, EventOp::CREATE);
    let expected_path = h.given_root.join("a.txt").to_string_lossy().into_owned();
    assert_eq!(report.display_path, expected_path);
    assert_eq!(report.outcome.reports[0].output, format!("CREATE {expected_path}\n"));

    // A real change goes through again.
    fs::write(h.root.join("a.txt"), "hello, world")?;
    let again = h.processor.handle(event(&h.root, "a.txt", EventOp::WRITE)).await;
    assert!(again.is_some());
    Ok(())
}

#[tokio::test]
async fn write_in_new_subdirectory_passes() -> TestResult {
    let cfg = ConfigBuilder::new()
        .command("true")
        .recursive(true)
        .build();
    let mut h = harness(&cfg);

    fs::create_dir(h.root.join("sub"))?;
    h.processor.handle(event(&h.root, "sub", EventOp::CREATE)).await;
    assert!(h.backend.is_watched(h.root.join("sub")));
    assert!(h.processor.watch_set().contains(&h.root.join("sub")));

    fs::write(h.root.join("sub/file.txt"), "payload")?;
    let report = h
        .processor
        .handle(event(&h.root, "sub/file.txt", EventOp::WRITE))
        .await;

    assert!(report.is_some(), "write under the new directory should run the batch");
    Ok(())
}

#[tokio::test]
async fn failing_command_stops_batch() -> TestResult {
    let cfg = ConfigBuilder::new()
        .command("false")
        .command("echo should-not-run")
        .continue_on_error(false)
        .build();
    let mut h = harness(&cfg);

    fs::write(h.root.join("a.txt"), "x")?;
    let report = h
        .processor
        .handle(event(&h.root, "a.txt", EventOp::CREATE))
        .await
        .expect("batch ran");

    assert!(!report.outcome.succeeded());
    assert!(report.outcome.halted);
    assert_eq!(report.outcome.reports.len(), 1);
    assert_eq!(report.outcome.reports[0].status, CommandStatus::Failed(1));
    Ok(())
}

#[tokio::test]
async fn pattern_mismatch_never_runs() -> TestResult {
    let cfg = ConfigBuilder::new().command("true").include(r"\.rs$").build();
    let mut h = harness(&cfg);

    fs::write(h.root.join("notes.txt"), "x")?;
    fs::write(h.root.join(".hidden.rs"), "x")?;
    fs::write(h.root.join("main.rs"), "fn main() {}")?;

    assert!(h.processor.handle(event(&h.root, "notes.txt", EventOp::CREATE)).await.is_none());
    assert!(h.processor.handle(event(&h.root, ".hidden.rs", EventOp::CREATE)).await.is_none());
    assert!(h.processor.handle(event(&h.root, "main.rs", EventOp::CREATE)).await.is_some());
    // Rejected files are never snapshotted.
    assert!(h.processor.cache().get(&h.root.join("notes.txt")).is_none());
    Ok(())
}

#[tokio::test]
async fn interval_gate_limits_batches() -> TestResult {
    let cfg = ConfigBuilder::new().command("true").interval("1h").build();
    let mut h = harness(&cfg);

    fs::write(h.root.join("a.txt"), "a")?;
    fs::write(h.root.join("b.txt"), "b")?;

    assert!(h.processor.handle(event(&h.root, "a.txt", EventOp::CREATE)).await.is_some());
    assert!(h.processor.handle(event(&h.root, "b.txt", EventOp::CREATE)).await.is_none());
    Ok(())
}

#[tokio::test]
async fn unsubscribed_events_are_ignored() -> TestResult {
    let cfg = ConfigBuilder::new().command("true").events(&["create"]).build();
    let mut h = harness(&cfg);

    fs::write(h.root.join("a.txt"), "a")?;
    assert!(h.processor.handle(event(&h.root, "a.txt", EventOp::WRITE)).await.is_none());
    assert!(h.processor.handle(event(&h.root, "a.txt", EventOp::CREATE)).await.is_some());
    Ok(())
}

#[tokio::test]
async fn chmod_without_content_change_is_skipped() -> TestResult {
    let cfg = ConfigBuilder::new().command("true").build();
    let mut h = harness(&cfg);

    fs::write(h.root.join("run.sh"), "#!/bin/sh\n")?;
    assert!(h.processor.handle(event(&h.root, "run.sh", EventOp::CREATE)).await.is_some());
    assert!(h.processor.handle(event(&h.root, "run.sh", EventOp::CHMOD)).await.is_none());
    Ok(())
}

#[tokio::test]
async fn removal_runs_and_forgets_file() -> TestResult {
    let cfg = ConfigBuilder::new().command("echo %t %f").build();
    let mut h = harness(&cfg);

    let path = h.root.join("a.txt");
    fs::write(&path, "a")?;
    h.processor.handle(event(&h.root, "a.txt", EventOp::CREATE)).await;
    assert!(h.processor.cache().get(&path).is_some());

    fs::remove_file(&path)?;
    let report = h
        .processor
        .handle(event(&h.root, "a.txt", EventOp::REMOVE))
        .await
        .expect("removal runs the batch");
    assert!(report.outcome.reports[0].output.starts_with("REMOVE "));
    assert!(h.processor.cache().get(&path).is_none());
    Ok(())
}

#[tokio::test]
async fn directory_metadata_noise_is_skipped() -> TestResult {
    let cfg = ConfigBuilder::new().command("true").recursive(true).build();
    let mut h = harness(&cfg);

    fs::create_dir(h.root.join("docs"))?;
    assert!(h.processor.handle(event(&h.root, "docs", EventOp::CREATE)).await.is_some());
    assert!(h.processor.handle(event(&h.root, "docs", EventOp::WRITE)).await.is_none());
    assert!(h.processor.handle(event(&h.root, "docs", EventOp::CHMOD)).await.is_none());
    Ok(())
}

#[tokio::test]
async fn unreadable_file_is_rejected_and_pipeline_continues() -> TestResult {
    let cfg = ConfigBuilder::new().command("true").build();
    let mut h = harness(&cfg);

    // Event for a file that is already gone.
    assert!(h.processor.handle(event(&h.root, "ghost.txt", EventOp::WRITE)).await.is_none());

    fs::write(h.root.join("real.txt"), "x")?;
    assert!(h.processor.handle(event(&h.root, "real.txt", EventOp::WRITE)).await.is_some());
    Ok(())
}

#[test]
fn missing_root_is_rejected() {
    let cfg = ConfigBuilder::new().command("true").build();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let result = EventProcessor::new(
        &cfg,
        Path::new("/definitely/not/here/4711"),
        MockBackend::new(),
        fs,
    );
    assert!(result.is_err());
}
