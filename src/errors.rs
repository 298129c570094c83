// src/errors.rs

//! Crate-wide error type.
//!
//! `WatchcmdError` covers the failures that end a watch session (bad config,
//! notification source failures, root registration). Recoverable per-path
//! problems are reported with `anyhow` and only ever logged.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchcmdError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Failed to open notification source: {0}")]
    SourceInit(#[from] notify::Error),

    #[error("Cannot watch {path:?}: {reason}")]
    WatchRoot { path: PathBuf, reason: String },

    #[error("Notification source failed: {0}")]
    SourceFailed(String),

    #[error("Pipeline task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchcmdError>;
