use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of filesystem operations carried by a single watch event.
    ///
    /// Also used as the subscription mask from `[watch].events`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventOp: u8 {
        const CREATE = 1;
        const WRITE = 1 << 1;
        const REMOVE = 1 << 2;
        const RENAME = 1 << 3;
        const CHMOD = 1 << 4;
    }
}

const OP_NAMES: [(EventOp, &str); 5] = [
    (EventOp::CREATE, "CREATE"),
    (EventOp::WRITE, "WRITE"),
    (EventOp::REMOVE, "REMOVE"),
    (EventOp::RENAME, "RENAME"),
    (EventOp::CHMOD, "CHMOD"),
];

impl EventOp {
    /// Union of every operation (`"all"` in config).
    pub const ALL: EventOp = EventOp::all();

    /// True for operations after which the path no longer exists under its
    /// old name.
    pub fn is_removal(self) -> bool {
        self.intersects(EventOp::REMOVE | EventOp::RENAME)
    }

    /// Parse a list of event names (`create`, `write`, ..., `all`) into a set.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<EventOp, String> {
        names.iter().try_fold(EventOp::empty(), |acc, name| {
            Ok(acc | EventOp::from_str(name.as_ref())?)
        })
    }

    /// Lower-case names of the operations in this set, for writing config.
    pub fn to_names(self) -> Vec<String> {
        if self == EventOp::ALL {
            return vec!["all".to_string()];
        }
        OP_NAMES
            .iter()
            .filter(|(op, _)| self.contains(*op))
            .map(|(_, name)| name.to_lowercase())
            .collect()
    }
}

impl fmt::Display for EventOp {
    /// Upper-case names joined by `|`, e.g. `WRITE|CHMOD`. This is what `%t`
    /// expands to in command templates.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (op, name) in OP_NAMES.iter() {
            if self.contains(*op) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl FromStr for EventOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(EventOp::CREATE),
            "write" => Ok(EventOp::WRITE),
            "remove" => Ok(EventOp::REMOVE),
            "rename" => Ok(EventOp::RENAME),
            "chmod" => Ok(EventOp::CHMOD),
            "all" => Ok(EventOp::ALL),
            other => Err(format!(
                "invalid event: {other} (expected create, write, remove, rename, chmod or all)"
            )),
        }
    }
}

/// Syntax used for `include` / `exclude` patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSyntax {
    /// Unanchored, case-sensitive regular expression.
    Regex,
    /// Shell-style glob matched against the whole file name.
    Glob,
}

impl Default for PatternSyntax {
    fn default() -> Self {
        PatternSyntax::Regex
    }
}

impl PatternSyntax {
    pub fn default_include(self) -> &'static str {
        match self {
            PatternSyntax::Regex => ".*",
            PatternSyntax::Glob => "*",
        }
    }

    /// Hidden files are excluded unless configured otherwise.
    pub fn default_exclude(self) -> &'static str {
        match self {
            PatternSyntax::Regex => r"^\.",
            PatternSyntax::Glob => ".*",
        }
    }
}

impl FromStr for PatternSyntax {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regex" => Ok(PatternSyntax::Regex),
            "glob" => Ok(PatternSyntax::Glob),
            other => Err(format!(
                "invalid pattern_syntax: {other} (expected \"regex\" or \"glob\")"
            )),
        }
    }
}

/// Parse a duration such as `"100ms"`, `"3s"`, `"2m"`, `"1h"`, or a bare `"0"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

    let secs_per_unit = match unit_part.trim() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        unit => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m, or h"
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}

/// Render a duration in the same notation `parse_duration` accepts.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0".to_string();
    }
    let ms = d.as_millis();
    if ms % 1000 != 0 {
        format!("{ms}ms")
    } else if ms % 3_600_000 == 0 {
        format!("{}h", ms / 3_600_000)
    } else if ms % 60_000 == 0 {
        format!("{}m", ms / 60_000)
    } else {
        format!("{}s", ms / 1000)
    }
}
