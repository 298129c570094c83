// src/config/mod.rs

//! Configuration loading and validation for watchcmd.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load / save a config file (`loader.rs`).
//! - Validate it into a typed [`ConfigFile`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, save_to_path};
pub use model::{ConfigFile, PipelineSection, RawConfigFile, RunSection, WatchSection};
