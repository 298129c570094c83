// src/exec/runner.rs

//! Sequential command batch runner.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tracing::{debug, error, info, warn};

use crate::types::EventOp;

use super::command::{CommandSpec, RenderedCommand};

/// How a single command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Non-zero exit. `-1` when the process was killed by a signal.
    Failed(i32),
    SpawnFailed(String),
    TimedOut,
}

impl CommandStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandStatus::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub command: String,
    pub status: CommandStatus,
    /// Captured stdout followed by stderr.
    pub output: String,
}

/// Result of running the templates for one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// One report per command that was started, in order.
    pub reports: Vec<CommandReport>,
    /// True if a failure stopped the remaining commands.
    pub halted: bool,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.reports.iter().all(|r| r.status.is_success())
    }
}

/// Runs command batches one command at a time, never concurrently.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    continue_on_error: bool,
    timeout: Option<Duration>,
}

impl CommandRunner {
    pub fn new(continue_on_error: bool, timeout: Option<Duration>) -> Self {
        Self {
            continue_on_error,
            timeout,
        }
    }

    /// Run every template for an event.
    ///
    /// Captured output is printed after each command. A failing command is
    /// logged and, unless `continue_on_error` is set, the rest of the batch
    /// is skipped.
    pub async fn run(&self, spec: &CommandSpec, path: &str, op: EventOp) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let commands = spec.render(path, op);
        let total = commands.len();

        for (idx, command) in commands.into_iter().enumerate() {
            let report = self.run_one(command).await;
            let ok = report.status.is_success();
            outcome.reports.push(report);

            if !ok && !self.continue_on_error {
                if idx + 1 < total {
                    warn!(skipped = total - idx - 1, "halting command batch after failure");
                    outcome.halted = true;
                }
                break;
            }
        }

        outcome
    }

    async fn run_one(&self, command: RenderedCommand) -> CommandReport {
        info!(cmd = %command.line, "running command");

        let (status, output) = match self.execute(&command).await {
            Ok(result) => result,
            Err(err) => {
                error!(cmd = %command.line, error = %format!("{err:#}"), "command could not be started");
                (CommandStatus::SpawnFailed(format!("{err:#}")), String::new())
            }
        };

        if !output.is_empty() {
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
        }

        match &status {
            CommandStatus::Success => debug!(cmd = %command.line, "command succeeded"),
            CommandStatus::Failed(code) => {
                error!(cmd = %command.line, exit_code = code, "command failed")
            }
            CommandStatus::TimedOut => error!(cmd = %command.line, "command timed out; killed"),
            CommandStatus::SpawnFailed(_) => {}
        }

        CommandReport {
            command: command.line,
            status,
            output,
        }
    }

    async fn execute(&self, command: &RenderedCommand) -> Result<(CommandStatus, String)> {
        let program = command
            .program
            .as_deref()
            .context("empty command line")?;

        let mut cmd = Command::new(program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning '{}'", program))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = async {
            let output = read_combined(stdout, stderr).await?;
            let status = child.wait().await?;
            io::Result::Ok((status, output))
        };

        let waited = match self.timeout {
            // The child is killed when dropped on expiry.
            Some(limit) => match tokio::time::timeout(limit, finished).await {
                Ok(res) => res,
                Err(_) => return Ok((CommandStatus::TimedOut, String::new())),
            },
            None => finished.await,
        };
        let (exit, output) = waited.with_context(|| format!("waiting for '{}'", program))?;
        let output = String::from_utf8_lossy(&output).into_owned();

        let status = if exit.success() {
            CommandStatus::Success
        } else {
            CommandStatus::Failed(exit.code().unwrap_or(-1))
        };
        Ok((status, output))
    }
}

/// Drain stdout and stderr into one buffer, line by line in arrival order.
async fn read_combined(
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
) -> io::Result<Vec<u8>> {
    let mut out = stdout.map(BufReader::new);
    let mut err = stderr.map(BufReader::new);
    let mut out_line = Vec::new();
    let mut err_line = Vec::new();
    let mut combined = Vec::new();

    while out.is_some() || err.is_some() {
        tokio::select! {
            read = read_line(&mut out, &mut out_line) => {
                take_line(read?, &mut out, &mut out_line, &mut combined);
            }
            read = read_line(&mut err, &mut err_line) => {
                take_line(read?, &mut err, &mut err_line, &mut combined);
            }
        }
    }
    Ok(combined)
}

/// Partial reads stay in `line`, so this is safe to cancel.
async fn read_line<R: AsyncRead + Unpin>(
    reader: &mut Option<BufReader<R>>,
    line: &mut Vec<u8>,
) -> io::Result<usize> {
    match reader {
        Some(reader) => reader.read_until(b'\n', line).await,
        None => std::future::pending().await,
    }
}

fn take_line<R>(
    read: usize,
    reader: &mut Option<BufReader<R>>,
    line: &mut Vec<u8>,
    combined: &mut Vec<u8>,
) {
    combined.append(line);
    if read == 0 {
        *reader = None;
    }
}
