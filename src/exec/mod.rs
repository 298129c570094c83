// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] holds the command templates and placeholder substitution.
//! - [`runner`] runs a rendered batch with `tokio::process::Command`, one
//!   command after another, and reports how each one ended.

pub mod command;
pub mod runner;

pub use command::{CommandSpec, EVENT_PLACEHOLDER, PATH_PLACEHOLDER, RenderedCommand};
pub use runner::{BatchOutcome, CommandReport, CommandRunner, CommandStatus};
