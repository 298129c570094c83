// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::fs::FileSystem;
use crate::types::EventOp;
use crate::watch::hash::{Checksum, SettlePolicy, compute_checksum, wait_for_stable};

/// Last observed size and checksum of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub checksum: Checksum,
}

/// Result of comparing a file against its cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentChange {
    /// No snapshot existed (or the event was a create); one was taken.
    New,
    /// Size or checksum differed; the snapshot was updated.
    Modified,
    /// Same size and checksum as the snapshot.
    Unchanged,
}

impl ContentChange {
    pub fn is_changed(self) -> bool {
        !matches!(self, ContentChange::Unchanged)
    }
}

/// Per-file content snapshots used to drop writes that leave the bytes
/// unchanged.
///
/// Owned by the consumer task; never shared.
#[derive(Debug)]
pub struct ContentCache {
    entries: HashMap<PathBuf, FileEntry>,
    fs: Arc<dyn FileSystem>,
    settle: SettlePolicy,
}

impl ContentCache {
    pub fn new(fs: Arc<dyn FileSystem>, settle: SettlePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            fs,
            settle,
        }
    }

    /// Settle, then snapshot `path` and compare with the cached entry.
    ///
    /// A create always replaces the entry. Any I/O failure is returned and the
    /// cache is left as it was.
    pub async fn refresh(&mut self, path: &Path, op: EventOp) -> Result<ContentChange> {
        let size = wait_for_stable(self.fs.as_ref(), path, &self.settle).await?;

        let checksum = {
            let fs = Arc::clone(&self.fs);
            let owned = path.to_path_buf();
            tokio::task::spawn_blocking(move || compute_checksum(fs.as_ref(), &owned))
                .await
                .context("hashing task panicked")??
        };

        let fresh = FileEntry {
            path: path.to_path_buf(),
            size,
            checksum,
        };

        if op.contains(EventOp::CREATE) {
            debug!(?path, size, "snapshot taken on create");
            self.entries.insert(path.to_path_buf(), fresh);
            return Ok(ContentChange::New);
        }

        let change = match self.entries.get(path) {
            None => ContentChange::New,
            // Size first: a different length is a change regardless of bytes.
            Some(old) if old.size != size => ContentChange::Modified,
            Some(old) if old.checksum != checksum => ContentChange::Modified,
            Some(_) => ContentChange::Unchanged,
        };

        if change.is_changed() {
            self.entries.insert(path.to_path_buf(), fresh);
        }
        debug!(?path, size, ?change, "content compared");
        Ok(change)
    }

    pub fn get(&self, path: &Path) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    pub fn remove(&mut self, path: &Path) -> Option<FileEntry> {
        self.entries.remove(path)
    }

    /// Drop `dir` and every entry below it (component-wise prefix).
    pub fn purge_subtree(&mut self, dir: &Path) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p, _| !p.starts_with(dir));
        let purged = before - self.entries.len();
        if purged > 0 {
            debug!(?dir, purged, "purged cache entries");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
