// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every watch/run option can also come from the config file; flags given on
//! the command line take precedence over the file.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchcmd`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchcmd",
    version,
    about = "Run commands when files in a directory change.",
    after_help = "Variables:\n  %f  path of the changed file\n  %t  event type (e.g. CREATE, WRITE|CHMOD)\n\nEvents:\n  create, write, remove, rename, chmod, all"
)]
pub struct CliArgs {
    /// Directory to watch.
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `.watchcmd.toml` in the current working directory, used only
    /// if it exists. An explicitly given file must exist.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub config: Option<String>,

    /// Watch directories recursively.
    #[arg(short, long)]
    pub recursive: bool,

    /// Events to listen for (comma separated).
    #[arg(short, long, value_name = "EVENTS", value_delimiter = ',')]
    pub events: Vec<String>,

    /// Only process events whose file name matches this pattern.
    #[arg(long, value_name = "PATTERN")]
    pub include: Option<String>,

    /// Skip events whose file name matches this pattern ("" disables).
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Option<String>,

    /// Interpret --include / --exclude as globs instead of regular expressions.
    #[arg(long)]
    pub glob: bool,

    /// Minimum time between two command batches (e.g. 100ms, 2s; 0 disables).
    #[arg(short, long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Command to run on change (repeatable, run in order).
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub commands: Vec<String>,

    /// Keep running the remaining commands after one fails.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Kill a command that runs longer than this (e.g. 30s).
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Write the effective settings to the config file and exit.
    #[arg(short = 'w', long)]
    pub write_config: bool,

    /// Resolve and print the effective settings, but don't watch anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHCMD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
