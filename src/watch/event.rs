// src/watch/event.rs

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use notify::event::{EventKind, ModifyKind, RenameMode};

use crate::types::EventOp;

/// A single filesystem notification, after translation from `notify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub op: EventOp,
    pub timestamp: Instant,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, op: EventOp) -> Self {
        Self {
            path: path.into(),
            op,
            timestamp: Instant::now(),
        }
    }

    /// Translate a raw `notify` event into zero or more watch events.
    ///
    /// Access events are dropped. A rename carrying both ends becomes a
    /// rename of the source plus a create of the destination.
    pub fn from_notify(event: notify::Event) -> Vec<WatchEvent> {
        let now = Instant::now();
        let make = |path: PathBuf, op: EventOp| WatchEvent {
            path,
            op,
            timestamp: now,
        };

        let op = match event.kind {
            EventKind::Access(_) => return Vec::new(),
            EventKind::Create(_) => EventOp::CREATE,
            EventKind::Remove(_) => EventOp::REMOVE,
            EventKind::Modify(ModifyKind::Metadata(_)) => EventOp::CHMOD,
            EventKind::Modify(ModifyKind::Name(mode)) => {
                return rename_events(event.paths, mode, make);
            }
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => EventOp::WRITE,
        };

        event.paths.into_iter().map(|p| make(p, op)).collect()
    }
}

/// Rename cookies remembered while waiting for the combined event.
const MAX_PENDING_RENAMES: usize = 256;

/// Stateful translation for a live notification stream.
///
/// Some backends report one rename three times: the source half, the
/// destination half and a combined event, all carrying the same tracker.
/// The combined event is dropped once either half with its tracker has been
/// translated, so one rename yields one RENAME and one CREATE.
#[derive(Debug, Default)]
pub struct EventTranslator {
    seen_halves: VecDeque<usize>,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, event: notify::Event) -> Vec<WatchEvent> {
        if let EventKind::Modify(ModifyKind::Name(mode)) = event.kind {
            if let Some(tracker) = event.tracker() {
                match mode {
                    RenameMode::From | RenameMode::To => self.remember(tracker),
                    RenameMode::Both if self.forget(tracker) => return Vec::new(),
                    _ => {}
                }
            }
        }
        WatchEvent::from_notify(event)
    }

    fn remember(&mut self, tracker: usize) {
        if self.seen_halves.contains(&tracker) {
            return;
        }
        if self.seen_halves.len() == MAX_PENDING_RENAMES {
            self.seen_halves.pop_front();
        }
        self.seen_halves.push_back(tracker);
    }

    fn forget(&mut self, tracker: usize) -> bool {
        match self.seen_halves.iter().position(|t| *t == tracker) {
            Some(idx) => {
                self.seen_halves.remove(idx);
                true
            }
            None => false,
        }
    }
}

fn rename_events(
    paths: Vec<PathBuf>,
    mode: RenameMode,
    make: impl Fn(PathBuf, EventOp) -> WatchEvent,
) -> Vec<WatchEvent> {
    match mode {
        RenameMode::From => paths.into_iter().map(|p| make(p, EventOp::RENAME)).collect(),
        RenameMode::To => paths.into_iter().map(|p| make(p, EventOp::CREATE)).collect(),
        RenameMode::Both => {
            let mut iter = paths.into_iter();
            let mut out = Vec::with_capacity(2);
            if let Some(from) = iter.next() {
                out.push(make(from, EventOp::RENAME));
            }
            if let Some(to) = iter.next() {
                out.push(make(to, EventOp::CREATE));
            }
            out
        }
        // Backends that cannot tell which end this is: the one that still
        // exists is the destination.
        RenameMode::Any | RenameMode::Other => paths
            .into_iter()
            .map(|p| {
                let op = if p.symlink_metadata().is_ok() {
                    EventOp::CREATE
                } else {
                    EventOp::RENAME
                };
                make(p, op)
            })
            .collect(),
    }
}
