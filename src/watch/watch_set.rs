// src/watch/watch_set.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::{Result, WatchcmdError};
use crate::types::EventOp;
use crate::watch::backend::WatchBackend;
use crate::watch::cache::ContentCache;
use crate::watch::event::WatchEvent;
use crate::watch::patterns::{PatternFilter, file_name_str};

/// What `sync` learned about the event's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The path is (or, for removals, was) a watched directory or an
    /// existing directory.
    pub is_dir: bool,
}

/// The set of directories currently registered with the backend.
///
/// Only the consumer task touches it. Every directory in the set has a live
/// registration; failed registrations never enter the set.
#[derive(Debug)]
pub struct WatchSet<B: WatchBackend> {
    backend: B,
    recursive: bool,
    patterns: PatternFilter,
    dirs: HashSet<PathBuf>,
}

impl<B: WatchBackend> WatchSet<B> {
    pub fn new(backend: B, recursive: bool, patterns: PatternFilter) -> Self {
        Self {
            backend,
            recursive,
            patterns,
            dirs: HashSet::new(),
        }
    }

    /// Register the root and, in recursive mode, every non-excluded directory
    /// below it. Failing to watch the root itself is fatal.
    pub fn register_root(&mut self, root: &Path) -> Result<()> {
        self.backend
            .add(root)
            .map_err(|e| WatchcmdError::WatchRoot {
                path: root.to_path_buf(),
                reason: format!("{e:#}"),
            })?;
        self.dirs.insert(root.to_path_buf());

        if self.recursive {
            let added = self.add_descendants(root);
            info!(?root, dirs = added + 1, "registered watch tree");
        } else {
            info!(?root, "registered watch root");
        }
        Ok(())
    }

    /// Keep registrations in step with an event, before it is filtered.
    pub fn sync(&mut self, event: &WatchEvent, cache: &mut ContentCache) -> SyncOutcome {
        let path = &event.path;

        if event.op.is_removal() {
            let was_dir = self.dirs.contains(path);
            if was_dir {
                self.unwatch_subtree(path);
            }
            cache.purge_subtree(path);
            return SyncOutcome { is_dir: was_dir };
        }

        let is_dir = self.dirs.contains(path) || is_directory(path);

        if event.op.contains(EventOp::CREATE) && is_dir && self.recursive {
            match file_name_str(path) {
                Some(name) if self.patterns.excludes_name(&name) => {
                    debug!(?path, "new directory excluded; not watching");
                }
                _ => self.add_tree(path),
            }
        }

        SyncOutcome { is_dir }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Drop every registration and close the backend.
    pub fn close(&mut self) -> anyhow::Result<()> {
        self.dirs.clear();
        self.backend.close()
    }

    /// Watch a newly created directory and whatever already exists below it.
    fn add_tree(&mut self, dir: &Path) {
        if self.dirs.contains(dir) {
            return;
        }
        if let Err(e) = self.backend.add(dir) {
            warn!(?dir, error = %format!("{e:#}"), "could not watch new directory");
            return;
        }
        self.dirs.insert(dir.to_path_buf());
        let nested = self.add_descendants(dir);
        debug!(?dir, nested, "watching new directory");
    }

    /// Walk below `dir`, registering each non-excluded directory. Excluded
    /// directories are skipped together with their subtree; walk errors skip
    /// the entry. Returns the number of directories added.
    fn add_descendants(&mut self, dir: &Path) -> usize {
        let patterns = &self.patterns;
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.depth() > 0
                    && entry.file_type().is_dir()
                    && patterns.excludes_name(&entry.file_name().to_string_lossy()))
            });

        let mut found = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => found.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "skipping unreadable entry during walk"),
            }
        }

        let mut added = 0;
        for path in found {
            if self.dirs.contains(&path) {
                continue;
            }
            match self.backend.add(&path) {
                Ok(()) => {
                    self.dirs.insert(path);
                    added += 1;
                }
                Err(e) => warn!(?path, error = %format!("{e:#}"), "could not watch directory"),
            }
        }
        added
    }

    fn unwatch_subtree(&mut self, dir: &Path) {
        let doomed: Vec<PathBuf> = self
            .dirs
            .iter()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect();
        for path in doomed {
            // The OS usually drops the watch itself when the directory goes.
            if let Err(e) = self.backend.remove(&path) {
                debug!(?path, error = %format!("{e:#}"), "unwatch failed");
            }
            self.dirs.remove(&path);
        }
        debug!(?dir, "unwatched subtree");
    }
}

fn is_directory(path: &Path) -> bool {
    path.symlink_metadata().map(|m| m.is_dir()).unwrap_or(false)
}
