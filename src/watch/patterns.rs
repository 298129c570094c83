// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::errors::{Result, WatchcmdError};
use crate::types::PatternSyntax;

/// A single compiled file-name pattern.
///
/// Regexes are case-sensitive and unanchored (a match anywhere in the name
/// counts). Globs must match the whole name.
#[derive(Clone)]
pub enum Pattern {
    Regex(Regex),
    Glob(GlobMatcher),
}

impl Pattern {
    pub fn compile(source: &str, syntax: PatternSyntax) -> Result<Self> {
        match syntax {
            PatternSyntax::Regex => Regex::new(source)
                .map(Pattern::Regex)
                .map_err(|e| WatchcmdError::InvalidPattern(format!("regex {source:?}: {e}"))),
            PatternSyntax::Glob => Glob::new(source)
                .map(|g| Pattern::Glob(g.compile_matcher()))
                .map_err(|e| WatchcmdError::InvalidPattern(format!("glob {source:?}: {e}"))),
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(name),
            Pattern::Glob(glob) => glob.is_match(name),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Regex(re) => re.as_str(),
            Pattern::Glob(glob) => glob.glob().glob(),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Regex(_) => write!(f, "Regex({:?})", self.as_str()),
            Pattern::Glob(_) => write!(f, "Glob({:?})", self.as_str()),
        }
    }
}

/// Include/exclude pair evaluated against base file names.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    include: Pattern,
    exclude: Option<Pattern>,
}

impl PatternFilter {
    pub fn new(include: &str, exclude: Option<&str>, syntax: PatternSyntax) -> Result<Self> {
        let include = Pattern::compile(include, syntax)?;
        let exclude = exclude
            .map(|source| Pattern::compile(source, syntax))
            .transpose()?;
        Ok(Self { include, exclude })
    }

    /// True if `name` matches the include pattern and not the exclude one.
    pub fn matches_name(&self, name: &str) -> bool {
        self.include.is_match(name) && !self.excludes_name(name)
    }

    /// [`matches_name`](Self::matches_name) on the last component of `path`.
    /// A path without a file name never matches.
    pub fn matches_path(&self, path: &Path) -> bool {
        match file_name_str(path) {
            Some(name) => self.matches_name(&name),
            None => false,
        }
    }

    pub fn excludes_name(&self, name: &str) -> bool {
        self.exclude.as_ref().is_some_and(|ex| ex.is_match(name))
    }
}

pub(crate) fn file_name_str(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
