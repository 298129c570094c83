use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchcmdError};
use crate::types::{EventOp, parse_duration};
use crate::watch::hash::SettlePolicy;
use crate::watch::patterns::PatternFilter;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WatchcmdError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_commands(&raw)?;
        let events = validate_events(&raw)?;

        let syntax = raw.watch.pattern_syntax;
        let include = raw
            .watch
            .include
            .clone()
            .unwrap_or_else(|| syntax.default_include().to_string());
        let exclude = match raw.watch.exclude.as_deref() {
            None => Some(syntax.default_exclude().to_string()),
            Some("") => None,
            Some(pat) => Some(pat.to_string()),
        };
        // Compile once here so a bad pattern is a config error, not a
        // runtime surprise.
        PatternFilter::new(&include, exclude.as_deref(), syntax)?;

        let interval = duration_field("[watch].interval", &raw.watch.interval)?;
        let command_timeout = match raw.run.timeout.as_deref() {
            Some(s) => {
                let timeout = duration_field("[run].timeout", s)?;
                if timeout.is_zero() {
                    return Err(WatchcmdError::ConfigError(
                        "[run].timeout must be greater than 0 (omit it to disable)".to_string(),
                    ));
                }
                Some(timeout)
            }
            None => None,
        };

        validate_pipeline(&raw)?;
        let stop_grace = duration_field("[pipeline].stop_grace", &raw.pipeline.stop_grace)?;
        let settle = SettlePolicy {
            poll_interval: duration_field(
                "[pipeline].settle_interval",
                &raw.pipeline.settle_interval,
            )?,
            stable_polls: raw.pipeline.settle_polls,
            max_polls: raw.pipeline.settle_max_polls,
        };

        Ok(ConfigFile::new_unchecked(
            raw,
            events,
            include,
            exclude,
            interval,
            command_timeout,
            stop_grace,
            settle,
        ))
    }
}

fn ensure_has_commands(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.commands.is_empty() {
        return Err(WatchcmdError::ConfigError(
            "at least one command is required ([run].commands or -c)".to_string(),
        ));
    }
    if let Some(idx) = cfg.run.commands.iter().position(|c| c.trim().is_empty()) {
        return Err(WatchcmdError::ConfigError(format!(
            "[run].commands[{idx}] is empty"
        )));
    }
    Ok(())
}

fn validate_events(cfg: &RawConfigFile) -> Result<EventOp> {
    if cfg.watch.events.is_empty() {
        return Err(WatchcmdError::ConfigError(
            "[watch].events must list at least one event".to_string(),
        ));
    }
    EventOp::parse_list(&cfg.watch.events).map_err(WatchcmdError::ConfigError)
}

fn validate_pipeline(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.queue_capacity == 0 {
        return Err(WatchcmdError::ConfigError(
            "[pipeline].queue_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.pipeline.settle_max_polls < cfg.pipeline.settle_polls {
        return Err(WatchcmdError::ConfigError(format!(
            "[pipeline].settle_max_polls ({}) must be >= settle_polls ({})",
            cfg.pipeline.settle_max_polls, cfg.pipeline.settle_polls
        )));
    }
    Ok(())
}

fn duration_field(field: &str, value: &str) -> Result<std::time::Duration> {
    parse_duration(value).map_err(|e| WatchcmdError::ConfigError(format!("{field}: {e}")))
}
