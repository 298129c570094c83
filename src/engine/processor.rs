// src/engine/processor.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ConfigFile;
use crate::errors::{Result, WatchcmdError};
use crate::exec::{BatchOutcome, CommandRunner, CommandSpec};
use crate::fs::FileSystem;
use crate::watch::path_utils::display_path;
use crate::watch::{ContentCache, PatternFilter, WatchBackend, WatchEvent, WatchSet};

use super::filter::{Decision, FilterChain};
use super::gate::ExecutionGate;

/// What happened for one accepted event.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub event: WatchEvent,
    /// The path as substituted for `%f`.
    pub display_path: String,
    pub outcome: BatchOutcome,
}

/// Consumer-side state: watch set, filter chain and runner.
///
/// `handle` is the whole per-event pipeline: sync, filter, run.
pub struct EventProcessor<B: WatchBackend> {
    root: PathBuf,
    display_root: PathBuf,
    watch_set: WatchSet<B>,
    filter: FilterChain,
    runner: CommandRunner,
    commands: CommandSpec,
}

impl<B: WatchBackend> fmt::Debug for EventProcessor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventProcessor")
            .field("root", &self.root)
            .field("watched_dirs", &self.watch_set.len())
            .field("cached_files", &self.filter.cache().len())
            .finish_non_exhaustive()
    }
}

impl<B: WatchBackend> EventProcessor<B> {
    /// `root` is the directory as the user gave it; it is canonicalized for
    /// matching event paths and kept as-is for `%f`.
    pub fn new(
        cfg: &ConfigFile,
        root: &Path,
        backend: B,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let canonical = root
            .canonicalize()
            .map_err(|e| WatchcmdError::WatchRoot {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;
        if !canonical.is_dir() {
            return Err(WatchcmdError::WatchRoot {
                path: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let patterns =
            PatternFilter::new(&cfg.include, cfg.exclude.as_deref(), cfg.pattern_syntax)?;
        let watch_set = WatchSet::new(backend, cfg.recursive, patterns.clone());
        let filter = FilterChain::new(
            cfg.events,
            patterns,
            ExecutionGate::new(cfg.interval),
            ContentCache::new(fs, cfg.settle),
        );

        Ok(Self {
            root: canonical,
            display_root: root.to_path_buf(),
            watch_set,
            filter,
            runner: CommandRunner::new(cfg.continue_on_error, cfg.command_timeout),
            commands: CommandSpec::new(cfg.commands.iter().cloned()),
        })
    }

    /// Initial watch registration. Fatal on failure.
    pub fn register_root(&mut self) -> Result<()> {
        let root = self.root.clone();
        self.watch_set.register_root(&root)
    }

    /// Process one event. Returns a report when the batch ran.
    pub async fn handle(&mut self, event: WatchEvent) -> Option<DispatchReport> {
        let sync = self.watch_set.sync(&event, self.filter.cache_mut());

        if let Decision::Reject(reason) = self.filter.accept(&event, sync.is_dir).await {
            debug!(path = ?event.path, op = %event.op, ?reason, "skipping event");
            return None;
        }

        let shown = display_path(&self.root, &self.display_root, &event.path);
        let outcome = self.runner.run(&self.commands, &shown, event.op).await;
        if !outcome.succeeded() {
            warn!(path = %shown, op = %event.op, "command batch failed");
        }

        Some(DispatchReport {
            event,
            display_path: shown,
            outcome,
        })
    }

    /// Canonical watch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn watch_set(&self) -> &WatchSet<B> {
        &self.watch_set
    }

    pub fn cache(&self) -> &ContentCache {
        self.filter.cache()
    }

    /// Release every registration and the backend.
    pub fn close(&mut self) {
        if let Err(e) = self.watch_set.close() {
            warn!(error = %format!("{e:#}"), "closing notification source failed");
        }
    }
}
