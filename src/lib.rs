// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, default_config_path, load_from_path, save_to_path};
use crate::engine::Pipeline;
use crate::types::{EventOp, PatternSyntax, format_duration};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading, with command-line overrides on top
/// - `--write-config` / `--dry-run`
/// - the watch pipeline
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    let mut raw = resolve_raw_config(&config_path, args.config.is_some())?;
    apply_overrides(&mut raw, &args);
    let cfg = ConfigFile::try_from(raw)?;

    if args.write_config {
        save_to_path(cfg.raw(), &config_path)?;
        println!("wrote config to {}", config_path.display());
        return Ok(());
    }

    let root = PathBuf::from(&args.path);

    if args.dry_run {
        print_dry_run(&cfg, &root);
        return Ok(());
    }

    let mut pipeline = Pipeline::start(&cfg, &root, None)?;
    info!(root = %root.display(), commands = cfg.commands.len(), "watching; press Ctrl-C to stop");

    let fatal = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                eprintln!("failed to listen for Ctrl+C: {e}");
            }
            info!("shutdown requested");
            None
        }
        res = pipeline.wait() => Some(res),
    };

    let stopped = pipeline.stop().await;
    if let Some(res) = fatal {
        res?;
    }
    stopped?;
    Ok(())
}

/// Load the config file if there is one.
///
/// A missing default file means "all defaults"; a missing explicit file is
/// an error.
fn resolve_raw_config(path: &Path, explicit: bool) -> Result<RawConfigFile> {
    if path.exists() {
        return Ok(load_from_path(path)?);
    }
    if explicit {
        bail!("config file {} does not exist", path.display());
    }
    debug!(?path, "no config file; using defaults");
    Ok(RawConfigFile::default())
}

/// Command-line flags win over the file.
fn apply_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if args.recursive {
        raw.watch.recursive = true;
    }
    if !args.events.is_empty() {
        raw.watch.events = args.events.clone();
    }
    if args.glob {
        raw.watch.pattern_syntax = PatternSyntax::Glob;
    }
    if let Some(include) = &args.include {
        raw.watch.include = Some(include.clone());
    }
    if let Some(exclude) = &args.exclude {
        raw.watch.exclude = Some(exclude.clone());
    }
    if let Some(interval) = &args.interval {
        raw.watch.interval = interval.clone();
    }
    if !args.commands.is_empty() {
        raw.run.commands = args.commands.clone();
    }
    if args.continue_on_error {
        raw.run.continue_on_error = true;
    }
    if let Some(timeout) = &args.timeout {
        raw.run.timeout = Some(timeout.clone());
    }
}

/// Print the effective settings without watching anything.
fn print_dry_run(cfg: &ConfigFile, root: &Path) {
    println!("watchcmd dry-run");
    println!("  path = {}", root.display());
    println!("  recursive = {}", cfg.recursive);
    println!("  events = {}", describe_events(cfg.events));
    println!("  pattern_syntax = {:?}", cfg.pattern_syntax);
    println!("  include = {}", cfg.include);
    match &cfg.exclude {
        Some(exclude) => println!("  exclude = {exclude}"),
        None => println!("  exclude = (none)"),
    }
    println!("  interval = {}", format_duration(cfg.interval));
    println!("  continue_on_error = {}", cfg.continue_on_error);
    if let Some(timeout) = cfg.command_timeout {
        println!("  timeout = {}", format_duration(timeout));
    }
    println!();

    println!("commands ({}):", cfg.commands.len());
    for cmd in &cfg.commands {
        println!("  - {cmd}");
    }

    debug!("dry-run complete (no execution)");
}

fn describe_events(events: EventOp) -> String {
    if events == EventOp::ALL {
        "all".to_string()
    } else {
        events.to_string()
    }
}
