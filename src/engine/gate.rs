// src/engine/gate.rs

use std::time::{Duration, Instant};

/// Rate limit on command batches: at most one per `interval`.
///
/// A zero interval disables gating.
#[derive(Debug, Clone)]
pub struct ExecutionGate {
    last_execution: Option<Instant>,
    interval: Duration,
}

impl ExecutionGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_execution: None,
            interval,
        }
    }

    /// True if a batch may start at `now`.
    pub fn permits(&self, now: Instant) -> bool {
        if self.interval.is_zero() {
            return true;
        }
        match self.last_execution {
            None => true,
            // An interval past the end of the clock never reopens.
            Some(last) => last
                .checked_add(self.interval)
                .is_some_and(|reopens| now >= reopens),
        }
    }

    /// Mark a batch as started at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_execution = Some(now);
    }

    pub fn last_execution(&self) -> Option<Instant> {
        self.last_execution
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
