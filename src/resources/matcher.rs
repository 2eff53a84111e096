/*!
 * Resource Matching
 *
 * Per-domain match rules compiled to case-insensitive regexes. Each domain is
 * evaluated on its own: a pattern that matched a window is still tried
 * against processes.
 */

use super::traits::{ProcessTable, WindowSystem};
use super::types::Handle;
use crate::errors::{ConfigError, ConfigResult};
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which resources of a domain are eligible for teardown
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Leave the domain alone
    #[default]
    Skip,

    /// Every resource in the domain
    All,

    /// Resources whose label matches at least one glob
    Patterns(Vec<String>),
}

impl MatchRule {
    pub fn patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Patterns(patterns.into_iter().map(Into::into).collect())
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }
}

impl From<bool> for MatchRule {
    fn from(all: bool) -> Self {
        if all {
            Self::All
        } else {
            Self::Skip
        }
    }
}

impl From<Vec<String>> for MatchRule {
    fn from(patterns: Vec<String>) -> Self {
        Self::Patterns(patterns)
    }
}

impl From<&[&str]> for MatchRule {
    fn from(patterns: &[&str]) -> Self {
        Self::patterns(patterns.iter().copied())
    }
}

/// Translate a glob to an unanchored regex
///
/// `*` becomes `.*`, `?` becomes `.`, everything else is literal.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    let mut buf = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    out
}

/// A compiled glob
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn compile(glob: &str) -> ConfigResult<Self> {
        let regex = RegexBuilder::new(&glob_to_regex(glob))
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: glob.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    #[inline]
    pub fn is_match(&self, label: &str) -> bool {
        self.regex.is_match(label)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// A compiled `MatchRule`
#[derive(Debug, Clone)]
pub enum Matcher {
    Skip,
    All,
    Any(Vec<GlobPattern>),
}

impl Matcher {
    /// Compile a rule; an empty pattern list can never match and compiles to `Skip`
    pub fn compile(rule: &MatchRule) -> ConfigResult<Self> {
        match rule {
            MatchRule::Skip => Ok(Self::Skip),
            MatchRule::All => Ok(Self::All),
            MatchRule::Patterns(patterns) if patterns.is_empty() => Ok(Self::Skip),
            MatchRule::Patterns(patterns) => patterns
                .iter()
                .map(|p| GlobPattern::compile(p))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Self::Any),
        }
    }

    /// Whether the domain needs enumerating at all
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Skip)
    }

    /// True if any label matches any pattern
    pub fn matches<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> bool {
        match self {
            Self::Skip => false,
            Self::All => true,
            Self::Any(patterns) => labels
                .into_iter()
                .any(|label| patterns.iter().any(|p| p.is_match(label))),
        }
    }
}

/// Windows whose title matches
///
/// An enumeration failure yields an empty set.
pub fn match_windows(system: &dyn WindowSystem, matcher: &Matcher) -> BTreeSet<Handle> {
    if !matcher.is_enabled() {
        return BTreeSet::new();
    }

    match system.enumerate_windows() {
        Ok(windows) => windows
            .into_iter()
            .filter(|w| matcher.matches([w.title.as_str()]))
            .map(|w| w.handle)
            .collect(),
        Err(e) => {
            warn!("Window enumeration failed, skipping windows: {}", e);
            BTreeSet::new()
        }
    }
}

/// Descendant processes whose name or command line matches
///
/// Processes that vanish or deny inspection are left out; they never abort
/// matching for the rest.
pub fn match_processes(table: &dyn ProcessTable, matcher: &Matcher) -> BTreeSet<Handle> {
    if !matcher.is_enabled() {
        return BTreeSet::new();
    }

    let entries = match table.enumerate_child_processes() {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Process enumeration failed, skipping processes: {}", e);
            return BTreeSet::new();
        }
    };

    let mut matched = BTreeSet::new();
    for entry in entries {
        match entry {
            Ok(info) => {
                let cmdline = info.command_line();
                if matcher.matches([info.name.as_str(), cmdline.as_str()]) {
                    matched.insert(info.handle);
                }
            }
            Err(e) => debug!("Skipping uninspectable process: {}", e),
        }
    }
    matched
}
