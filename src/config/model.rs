use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{EventOp, PatternSyntax};
use crate::watch::hash::SettlePolicy;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// recursive = true
/// events = ["write", "create"]
/// include = "\\.rs$"
/// interval = "100ms"
///
/// [run]
/// commands = ["cargo check", "echo %t %f"]
/// continue_on_error = false
/// ```
///
/// All sections are optional and have reasonable defaults, except that at
/// least one command must be configured somewhere (file or CLI).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawConfigFile {
    /// What to watch and which events qualify, from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// Commands run for each accepted event, from `[run]`.
    #[serde(default)]
    pub run: RunSection,

    /// Queue sizing, shutdown and settle tuning, from `[pipeline]`.
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WatchSection {
    /// Watch subdirectories too, following creations and removals.
    #[serde(default)]
    pub recursive: bool,

    /// Subscribed events: `create`, `write`, `remove`, `rename`, `chmod`,
    /// `all`.
    #[serde(default = "default_events")]
    pub events: Vec<String>,

    #[serde(default)]
    pub pattern_syntax: PatternSyntax,

    /// File-name include pattern. `None` means "everything" for the syntax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,

    /// File-name exclude pattern. `None` means hidden files; `""` disables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Minimum time between two command batches; `"0"` disables the gate.
    #[serde(default = "default_interval")]
    pub interval: String,
}

fn default_events() -> Vec<String> {
    vec!["all".to_string()]
}

fn default_interval() -> String {
    "100ms".to_string()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            recursive: false,
            events: default_events(),
            pattern_syntax: PatternSyntax::default(),
            include: None,
            exclude: None,
            interval: default_interval(),
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RunSection {
    /// Command templates, run in order. `%f` is replaced by the changed
    /// path and `%t` by the event type.
    #[serde(default)]
    pub commands: Vec<String>,

    /// Keep going after a failed command instead of halting the batch.
    #[serde(default)]
    pub continue_on_error: bool,

    /// Optional per-command timeout (e.g. `"30s"`). Without it a hanging
    /// command blocks all later event processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineSection {
    /// Capacity of the queue between the notification producer and the
    /// consumer. A full queue blocks the producer; nothing is dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long `stop()` waits for the tasks before aborting them.
    #[serde(default = "default_stop_grace")]
    pub stop_grace: String,

    /// Delay between two size polls while waiting for a write to settle.
    #[serde(default = "default_settle_interval")]
    pub settle_interval: String,

    /// Consecutive unchanged polls that count as "file closed".
    #[serde(default = "default_settle_polls")]
    pub settle_polls: u32,

    /// Upper bound on polls before the content is read regardless.
    #[serde(default = "default_settle_max_polls")]
    pub settle_max_polls: u32,
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_stop_grace() -> String {
    "5s".to_string()
}

fn default_settle_interval() -> String {
    "20ms".to_string()
}

fn default_settle_polls() -> u32 {
    2
}

fn default_settle_max_polls() -> u32 {
    50
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            stop_grace: default_stop_grace(),
            settle_interval: default_settle_interval(),
            settle_polls: default_settle_polls(),
            settle_max_polls: default_settle_max_polls(),
        }
    }
}

/// Validated configuration.
///
/// Built from a [`RawConfigFile`] through `TryFrom` (see `validate.rs`), so
/// every duration, event name and pattern here is known to be well formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub recursive: bool,
    pub events: EventOp,
    pub pattern_syntax: PatternSyntax,
    pub include: String,
    /// `None` when excluding is disabled.
    pub exclude: Option<String>,
    pub interval: Duration,
    pub commands: Vec<String>,
    pub continue_on_error: bool,
    pub command_timeout: Option<Duration>,
    pub queue_capacity: usize,
    pub stop_grace: Duration,
    pub settle: SettlePolicy,
    raw: RawConfigFile,
}

impl ConfigFile {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_unchecked(
        raw: RawConfigFile,
        events: EventOp,
        include: String,
        exclude: Option<String>,
        interval: Duration,
        command_timeout: Option<Duration>,
        stop_grace: Duration,
        settle: SettlePolicy,
    ) -> Self {
        Self {
            recursive: raw.watch.recursive,
            events,
            pattern_syntax: raw.watch.pattern_syntax,
            include,
            exclude,
            interval,
            commands: raw.run.commands.clone(),
            continue_on_error: raw.run.continue_on_error,
            command_timeout,
            queue_capacity: raw.pipeline.queue_capacity,
            stop_grace,
            settle,
            raw,
        }
    }

    /// The raw form this config was validated from (used for `--write-config`).
    pub fn raw(&self) -> &RawConfigFile {
        &self.raw
    }
}
