#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::time::{Duration, Instant};

use watchcmd::exec::{CommandRunner, CommandSpec, CommandStatus};
use watchcmd::types::EventOp;

#[test]
fn placeholders_substituted_before_splitting() {
    let spec = CommandSpec::new(["echo %t %f", "   ", "cp %f %f.bak"]);
    let rendered = spec.render("dir/a b.txt", EventOp::WRITE | EventOp::CHMOD);

    assert_eq!(rendered.len(), 3);
    assert_eq!(rendered[0].line, "echo WRITE|CHMOD dir/a b.txt");
    assert_eq!(rendered[0].program.as_deref(), Some("echo"));
    // No quoting: a space in the path splits it.
    assert_eq!(rendered[0].args, vec!["WRITE|CHMOD", "dir/a", "b.txt"]);

    assert_eq!(rendered[1].program, None);

    assert_eq!(rendered[2].args, vec!["dir/a", "b.txt", "dir/a", "b.txt.bak"]);
}

#[tokio::test]
async fn output_is_captured_per_command() {
    init_tracing();
    let runner = CommandRunner::new(false, None);
    let spec = CommandSpec::new(["echo %t %f"]);

    let outcome = with_timeout(runner.run(&spec, "notes.txt", EventOp::CREATE)).await;

    assert!(outcome.succeeded());
    assert!(!outcome.halted);
    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports[0].command, "echo CREATE notes.txt");
    assert_eq!(outcome.reports[0].output, "CREATE notes.txt\n");
}

#[tokio::test]
async fn failure_halts_remaining_commands() {
    init_tracing();
    let runner = CommandRunner::new(false, None);
    let spec = CommandSpec::new(["false", "echo should-not-run"]);

    let outcome = with_timeout(runner.run(&spec, "a.txt", EventOp::WRITE)).await;

    assert!(!outcome.succeeded());
    assert!(outcome.halted);
    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports[0].command, "false");
    assert_eq!(outcome.reports[0].status, CommandStatus::Failed(1));
}

#[tokio::test]
async fn continue_on_error_runs_everything() {
    let runner = CommandRunner::new(true, None);
    let spec = CommandSpec::new(["false", "echo still-here"]);

    let outcome = with_timeout(runner.run(&spec, "a.txt", EventOp::WRITE)).await;

    assert!(!outcome.succeeded());
    assert!(!outcome.halted);
    assert_eq!(outcome.reports.len(), 2);
    assert_eq!(outcome.reports[1].status, CommandStatus::Success);
    assert_eq!(outcome.reports[1].output, "still-here\n");
}

#[tokio::test]
async fn spawn_failure_counts_as_failure() {
    let runner = CommandRunner::new(false, None);
    let spec = CommandSpec::new(["definitely-not-a-real-program-4711 %f", "echo unreachable"]);

    let outcome = with_timeout(runner.run(&spec, "a.txt", EventOp::CREATE)).await;

    assert!(outcome.halted);
    assert_eq!(outcome.reports.len(), 1);
    assert!(matches!(outcome.reports[0].status, CommandStatus::SpawnFailed(_)));
}

#[tokio::test]
async fn blank_command_is_spawn_failure() {
    let runner = CommandRunner::new(true, None);
    let spec = CommandSpec::new(["", "true"]);

    let outcome = with_timeout(runner.run(&spec, "a.txt", EventOp::CREATE)).await;

    assert_eq!(outcome.reports.len(), 2);
    match &outcome.reports[0].status {
        CommandStatus::SpawnFailed(msg) => assert!(msg.contains("empty command")),
        other => panic!("Expected SpawnFailed, got: {:?}", other),
    }
    assert!(outcome.reports[1].status.is_success());
}

#[tokio::test]
async fn stderr_is_captured_with_exit_code() {
    let runner = CommandRunner::new(false, None);
    let spec = CommandSpec::new(["ls /definitely/not/here/4711"]);

    let outcome = with_timeout(runner.run(&spec, "", EventOp::WRITE)).await;

    let report = &outcome.reports[0];
    assert!(matches!(report.status, CommandStatus::Failed(code) if code != 0));
    assert!(!report.output.is_empty());
}

#[tokio::test]
async fn timeout_kills_hanging_command() {
    init_tracing();
    let runner = CommandRunner::new(false, Some(Duration::from_millis(100)));
    let spec = CommandSpec::new(["sleep 10", "echo after"]);

    let started = Instant::now();
    let outcome = with_timeout(runner.run(&spec, "a.txt", EventOp::WRITE)).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports[0].status, CommandStatus::TimedOut);
    assert!(outcome.halted);
}

#[tokio::test]
async fn stdout_and_stderr_share_one_buffer_in_order() -> Result<(), Box<dyn std::error::Error>> {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("interleave.sh");
    std::fs::write(
        &script,
        "#!/bin/sh\necho one\nsleep 0.1\necho two >&2\nsleep 0.1\necho three\n",
    )?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

    let runner = CommandRunner::new(false, None);
    let spec = CommandSpec::new([script.to_string_lossy().into_owned()]);

    let outcome = with_timeout(runner.run(&spec, "a.txt", EventOp::WRITE)).await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.reports[0].output, "one\ntwo\nthree\n");
    Ok(())
}
