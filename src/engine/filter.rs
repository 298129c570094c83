// src/engine/filter.rs

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::types::EventOp;
use crate::watch::{ContentCache, PatternFilter, WatchEvent};

use super::gate::ExecutionGate;

/// Why an event did not make it through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Operation not in the subscribed event set.
    Unsubscribed,
    /// File name failed include or hit exclude.
    Pattern,
    /// A batch ran too recently.
    Interval,
    /// Content identical to the last snapshot, or a directory metadata
    /// change.
    Unchanged,
    /// The file could not be read or hashed.
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(RejectReason),
}

/// Ordered checks deciding whether an event runs the command batch.
///
/// Evaluated once per event and stops at the first rejection:
/// subscription mask, file-name pattern, interval gate, content dedup.
#[derive(Debug)]
pub struct FilterChain {
    events: EventOp,
    patterns: PatternFilter,
    gate: ExecutionGate,
    cache: ContentCache,
}

impl FilterChain {
    pub fn new(
        events: EventOp,
        patterns: PatternFilter,
        gate: ExecutionGate,
        cache: ContentCache,
    ) -> Self {
        Self {
            events,
            patterns,
            gate,
            cache,
        }
    }

    /// Run the chain. `is_dir` comes from the watch-set sync for this event.
    ///
    /// The gate is stamped only on acceptance.
    pub async fn accept(&mut self, event: &WatchEvent, is_dir: bool) -> Decision {
        let decision = self.evaluate(event, is_dir).await;
        match decision {
            Decision::Accept => {
                self.gate.record(Instant::now());
                debug!(path = ?event.path, op = %event.op, "event accepted");
            }
            Decision::Reject(reason) => {
                trace!(path = ?event.path, op = %event.op, ?reason, "event rejected");
            }
        }
        decision
    }

    async fn evaluate(&mut self, event: &WatchEvent, is_dir: bool) -> Decision {
        if !event.op.intersects(self.events) {
            return Decision::Reject(RejectReason::Unsubscribed);
        }

        if !self.patterns.matches_path(&event.path) {
            return Decision::Reject(RejectReason::Pattern);
        }

        if !self.gate.permits(Instant::now()) {
            return Decision::Reject(RejectReason::Interval);
        }

        self.check_content(event, is_dir).await
    }

    async fn check_content(&mut self, event: &WatchEvent, is_dir: bool) -> Decision {
        let structural = EventOp::CREATE | EventOp::REMOVE | EventOp::RENAME;

        if is_dir {
            return if event.op.intersects(structural) {
                Decision::Accept
            } else {
                Decision::Reject(RejectReason::Unchanged)
            };
        }

        if event.op.is_removal() {
            self.cache.remove(&event.path);
            return Decision::Accept;
        }

        match self.cache.refresh(&event.path, event.op).await {
            Ok(change) if change.is_changed() => Decision::Accept,
            Ok(_) => Decision::Reject(RejectReason::Unchanged),
            Err(e) => {
                warn!(path = ?event.path, error = %format!("{e:#}"), "content check failed");
                Decision::Reject(RejectReason::Io)
            }
        }
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ContentCache {
        &mut self.cache
    }
}
