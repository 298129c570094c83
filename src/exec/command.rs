// src/exec/command.rs

use crate::types::EventOp;

/// Placeholder replaced by the changed path.
pub const PATH_PLACEHOLDER: &str = "%f";
/// Placeholder replaced by the event type, e.g. `WRITE` or `CREATE|CHMOD`.
pub const EVENT_PLACEHOLDER: &str = "%t";

/// Ordered command templates run for every accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    templates: Vec<String>,
}

/// One template after substitution and splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    /// The substituted line, before splitting.
    pub line: String,
    /// `None` when the line is blank after substitution.
    pub program: Option<String>,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Substitute placeholders in every template, in order.
    ///
    /// Substitution happens before splitting on whitespace, so a path with
    /// spaces becomes several arguments. There is no quoting.
    pub fn render(&self, path: &str, op: EventOp) -> Vec<RenderedCommand> {
        let op_name = op.to_string();
        self.templates
            .iter()
            .map(|template| {
                let line = template
                    .replace(PATH_PLACEHOLDER, path)
                    .replace(EVENT_PLACEHOLDER, &op_name);
                let mut parts = line.split_whitespace().map(str::to_string);
                let program = parts.next();
                let args = parts.collect();
                RenderedCommand {
                    line,
                    program,
                    args,
                }
            })
            .collect()
    }
}
