#![allow(dead_code)]

use watchcmd::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the file defaults with two test-friendly changes: the
/// interval gate is off and the settle poll is 1ms, so events are processed
/// immediately.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.watch.interval = "0".to_string();
        config.pipeline.settle_interval = "1ms".to_string();
        config.pipeline.settle_polls = 2;
        config.pipeline.settle_max_polls = 20;
        config.pipeline.stop_grace = "2s".to_string();
        Self { config }
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.config.run.commands.push(cmd.to_string());
        self
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.config.watch.recursive = val;
        self
    }

    pub fn events(mut self, events: &[&str]) -> Self {
        self.config.watch.events = events.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.config.watch.include = Some(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude = Some(pattern.to_string());
        self
    }

    pub fn glob(mut self) -> Self {
        self.config.watch.pattern_syntax = watchcmd::types::PatternSyntax::Glob;
        self
    }

    pub fn interval(mut self, interval: &str) -> Self {
        self.config.watch.interval = interval.to_string();
        self
    }

    pub fn continue_on_error(mut self, val: bool) -> Self {
        self.config.run.continue_on_error = val;
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.config.run.timeout = Some(timeout.to_string());
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.pipeline.queue_capacity = capacity;
        self
    }

    pub fn stop_grace(mut self, grace: &str) -> Self {
        self.config.pipeline.stop_grace = grace.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
