use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Result, bail};

use super::backend::WatchBackend;

#[derive(Debug, Default)]
struct MockState {
    watched: HashSet<PathBuf>,
    added: Vec<PathBuf>,
    removed: Vec<PathBuf>,
    fail: HashSet<PathBuf>,
    closed: bool,
}

/// Backend that only records registrations. Clones share state, so a test
/// can keep one handle while the pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every future `add` of `path` fail.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.state().fail.insert(path.into());
    }

    pub fn watched(&self) -> HashSet<PathBuf> {
        self.state().watched.clone()
    }

    pub fn is_watched(&self, path: impl AsRef<Path>) -> bool {
        self.state().watched.contains(path.as_ref())
    }

    /// Every path passed to `add`, in order, including failed ones.
    pub fn added(&self) -> Vec<PathBuf> {
        self.state().added.clone()
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.state().removed.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

impl WatchBackend for MockBackend {
    fn add(&mut self, path: &Path) -> Result<()> {
        let mut state = self.state();
        state.added.push(path.to_path_buf());
        if state.closed {
            bail!("backend closed");
        }
        if state.fail.contains(path) {
            bail!("mock add failure for {:?}", path);
        }
        state.watched.insert(path.to_path_buf());
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        let mut state = self.state();
        state.removed.push(path.to_path_buf());
        if !state.watched.remove(path) {
            bail!("{:?} was not watched", path);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state().closed = true;
        Ok(())
    }
}
