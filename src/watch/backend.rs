// src/watch/backend.rs

use std::path::Path;

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Registration side of the OS notification primitive.
///
/// Events and asynchronous errors are not returned from here; they arrive on
/// the channel handed to the backend at construction.
pub trait WatchBackend: Send {
    /// Start watching a single directory (non-recursively).
    fn add(&mut self, path: &Path) -> Result<()>;
    fn remove(&mut self, path: &Path) -> Result<()>;
    /// Release the primitive. The event channel closes once every sender is
    /// gone.
    fn close(&mut self) -> Result<()>;
}

/// Backend over `notify::RecommendedWatcher`.
pub struct NotifyBackend {
    watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend")
            .field("open", &self.watcher.is_some())
            .finish()
    }
}

impl NotifyBackend {
    /// Open the watcher. The notify callback runs on notify's own thread and
    /// blocks when `raw_tx` is full.
    pub fn new(raw_tx: mpsc::Sender<notify::Result<Event>>) -> notify::Result<Self> {
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if raw_tx.blocking_send(res).is_err() {
                    // Receiver gone: the pipeline is shutting down.
                    debug!("dropping notify event after shutdown");
                }
            },
            Config::default(),
        )?;
        info!("notification source opened");
        Ok(Self {
            watcher: Some(watcher),
        })
    }

    fn watcher(&mut self) -> Result<&mut RecommendedWatcher> {
        self.watcher
            .as_mut()
            .context("notification source already closed")
    }
}

impl WatchBackend for NotifyBackend {
    fn add(&mut self, path: &Path) -> Result<()> {
        self.watcher()?
            .watch(path, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {:?}", path))
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        self.watcher()?
            .unwatch(path)
            .with_context(|| format!("unwatching {:?}", path))
    }

    fn close(&mut self) -> Result<()> {
        if self.watcher.take().is_some() {
            info!("notification source closed");
        }
        Ok(())
    }
}
