// src/engine/pipeline.rs

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::Event;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{Result, WatchcmdError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::{EventTranslator, NotifyBackend, WatchBackend, WatchEvent};

use super::processor::{DispatchReport, EventProcessor};

/// Items flowing from the producer to the consumer.
#[derive(Debug)]
enum QueueItem {
    Event(WatchEvent),
    /// The notification source reported an error; nothing after it is
    /// trustworthy.
    SourceFailed(String),
}

/// Channel the notification source writes into.
pub type RawEventSender = mpsc::Sender<notify::Result<Event>>;
pub type RawEventReceiver = mpsc::Receiver<notify::Result<Event>>;

/// Sink for one [`DispatchReport`] per batch that ran.
pub type Reporter = mpsc::UnboundedSender<DispatchReport>;

/// Running producer/consumer pair.
///
/// The producer forwards raw notifications into a bounded queue; the single
/// consumer drains it in order and, per event, syncs the watch set, runs the
/// filter chain and executes the command batch.
pub struct Pipeline {
    shutdown_tx: watch::Sender<bool>,
    producer: Option<JoinHandle<()>>,
    consumer: Option<JoinHandle<Result<()>>>,
    grace: Duration,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("producer_running", &self.producer.is_some())
            .field("consumer_running", &self.consumer.is_some())
            .field("grace", &self.grace)
            .finish()
    }
}

impl Pipeline {
    /// Open the OS notification source on `root` and start both tasks.
    ///
    /// Must be called from within a tokio runtime. Errors opening the source
    /// or registering the root are returned here.
    pub fn start(cfg: &ConfigFile, root: &Path, reporter: Option<Reporter>) -> Result<Self> {
        let (raw_tx, raw_rx) = mpsc::channel(cfg.queue_capacity);
        let backend = NotifyBackend::new(raw_tx)?;
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        Self::start_with(cfg, root, backend, raw_rx, fs, reporter)
    }

    /// Start over an arbitrary backend and raw event channel.
    pub fn start_with<B>(
        cfg: &ConfigFile,
        root: &Path,
        backend: B,
        raw_rx: RawEventReceiver,
        fs: Arc<dyn FileSystem>,
        reporter: Option<Reporter>,
    ) -> Result<Self>
    where
        B: WatchBackend + 'static,
    {
        let mut processor = EventProcessor::new(cfg, root, backend, fs)?;
        if let Err(e) = processor.register_root() {
            processor.close();
            return Err(e);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (queue_tx, queue_rx) = mpsc::channel(cfg.queue_capacity);

        let producer = tokio::spawn(produce(raw_rx, queue_tx, shutdown_rx));
        let consumer = tokio::spawn(consume(processor, queue_rx, reporter));

        info!(root = ?root, "pipeline started");
        Ok(Self {
            shutdown_tx,
            producer: Some(producer),
            consumer: Some(consumer),
            grace: cfg.stop_grace,
        })
    }

    /// Resolve when the consumer ends on its own, i.e. after a fatal
    /// notification error. Cancel-safe; `stop` is still required afterwards.
    pub async fn wait(&mut self) -> Result<()> {
        let Some(handle) = self.consumer.as_mut() else {
            return Ok(());
        };
        let joined = handle.await;
        self.consumer = None;
        match joined {
            Ok(res) => res,
            Err(e) => Err(WatchcmdError::TaskFailed(format!("consumer task: {e}"))),
        }
    }

    /// Signal shutdown and wait for both tasks, aborting whatever is still
    /// running once the grace period has passed.
    ///
    /// Events already queued are processed before the consumer exits. A
    /// fatal error the consumer hit is returned here if `wait` did not
    /// already report it.
    pub async fn stop(mut self) -> Result<()> {
        info!("stopping pipeline");
        // Receivers may already be gone.
        let _ = self.shutdown_tx.send(true);
        let deadline = Instant::now().checked_add(self.grace);

        if let Some(handle) = self.producer.take() {
            join_until("producer", handle, deadline).await?;
        }
        let consumer_result = match self.consumer.take() {
            Some(handle) => join_until("consumer", handle, deadline).await?,
            None => None,
        };

        info!("pipeline stopped");
        consumer_result.unwrap_or(Ok(()))
    }
}

/// Join `handle`, aborting it at `deadline`. No deadline waits indefinitely.
async fn join_until<T>(
    name: &str,
    mut handle: JoinHandle<T>,
    deadline: Option<Instant>,
) -> Result<Option<T>> {
    let joined = match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, &mut handle).await,
        None => Ok((&mut handle).await),
    };
    match joined {
        Ok(Ok(value)) => Ok(Some(value)),
        Ok(Err(e)) => Err(WatchcmdError::TaskFailed(format!("{name} task: {e}"))),
        Err(_) => {
            warn!(task = name, "task did not stop within grace period; aborting");
            handle.abort();
            Ok(None)
        }
    }
}

async fn produce(
    mut raw_rx: RawEventReceiver,
    queue_tx: mpsc::Sender<QueueItem>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    debug!("producer started");
    let mut translator = EventTranslator::new();
    'outer: loop {
        let raw = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            raw = raw_rx.recv() => match raw {
                Some(raw) => raw,
                None => {
                    debug!("notification source closed");
                    break;
                }
            },
        };

        let (items, fatal) = match raw {
            Ok(event) => {
                let items: Vec<QueueItem> = translator
                    .translate(event)
                    .into_iter()
                    .map(QueueItem::Event)
                    .collect();
                (items, false)
            }
            Err(e) => (vec![QueueItem::SourceFailed(e.to_string())], true),
        };

        for item in items {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break 'outer,
                sent = queue_tx.send(item) => {
                    if sent.is_err() {
                        break 'outer;
                    }
                }
            }
        }

        if fatal {
            break;
        }
    }
    debug!("producer finished");
}

async fn consume<B: WatchBackend>(
    mut processor: EventProcessor<B>,
    mut queue_rx: mpsc::Receiver<QueueItem>,
    reporter: Option<Reporter>,
) -> Result<()> {
    debug!("consumer started");
    let mut result = Ok(());

    while let Some(item) = queue_rx.recv().await {
        match item {
            QueueItem::Event(event) => {
                if let Some(report) = processor.handle(event).await {
                    if let Some(tx) = &reporter {
                        // Nobody listening is fine.
                        let _ = tx.send(report);
                    }
                }
            }
            QueueItem::SourceFailed(reason) => {
                error!(%reason, "notification source failed; stopping");
                result = Err(WatchcmdError::SourceFailed(reason));
                break;
            }
        }
    }

    processor.close();
    debug!("consumer finished");
    result
}
