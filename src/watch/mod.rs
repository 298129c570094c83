// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Translating `notify` events into [`WatchEvent`]s.
//! - Keeping the set of watched directories in step with the tree
//!   ([`WatchSet`] over a [`WatchBackend`]).
//! - Compiling include/exclude file-name patterns.
//! - Remembering file contents so unchanged rewrites can be ignored.
//!
//! It does not decide whether commands run; that is the engine's filter
//! chain.

pub mod backend;
pub mod cache;
pub mod event;
pub mod hash;
pub mod mock;
pub mod path_utils;
pub mod patterns;
pub mod watch_set;

pub use backend::{NotifyBackend, WatchBackend};
pub use cache::{ContentCache, ContentChange, FileEntry};
pub use event::{EventTranslator, WatchEvent};
pub use hash::{Checksum, SettlePolicy, compute_checksum, wait_for_stable};
pub use patterns::{Pattern, PatternFilter};
pub use watch_set::{SyncOutcome, WatchSet};
