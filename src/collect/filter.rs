//! Path Admission Filtering
//!
//! Decides, per candidate path, whether traversal may build a node for it.
//! Rules are checked in a fixed order with first-match-wins semantics:
//! unconditional hard-skip names, configured do-not-recurse globs, scoped
//! exclusion lists, then the `ignore_collect` hook (dispatched by the
//! session). Rule chaining uses `ControlFlow` for early termination.

use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use regex::Regex;

use super::config::CollectConfig;
use super::error::{CollectError, CollectResult};

/// Filter outcome for one rule: `Break` carries the skip reason
pub type FilterResult = ControlFlow<SkipReason, ()>;

/// Basenames that are never descended into, regardless of configuration.
/// Dot-prefixed names are covered separately.
pub const HARD_SKIP_NAMES: &[&str] = &["CVS", "_darcs", "{arch}"];

/// Why a path was skipped before node resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Version-control or hidden name, unconditional
    HardSkip,
    /// Matched a configured do-not-recurse glob
    NoRecurse(String),
    /// Listed in a scoped exclusion list declared at the given scope
    Excluded(PathBuf),
    /// A registered hook answered true from `ignore_collect`
    Hook(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::HardSkip => write!(f, "hard-skip name"),
            SkipReason::NoRecurse(pattern) => write!(f, "do-not-recurse pattern '{}'", pattern),
            SkipReason::Excluded(scope) => {
                write!(f, "exclusion list scoped at {}", scope.display())
            }
            SkipReason::Hook(name) => write!(f, "ignore_collect hook '{}'", name),
        }
    }
}

/// The basename of a path as UTF-8, or empty when unavailable
pub fn basename(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Rule 1: unconditional hard-skip check
pub fn is_hard_skipped(name: &str) -> bool {
    name.starts_with('.') || HARD_SKIP_NAMES.contains(&name)
}

/// A compiled set of shell-style glob patterns matched against basenames
#[derive(Debug, Clone)]
pub struct GlobSet {
    patterns: Vec<(String, Regex)>,
}

impl GlobSet {
    /// Compile glob patterns; invalid patterns are configuration errors
    pub fn compile<I, S>(patterns: I) -> CollectResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = Regex::new(&glob_to_regex(pattern)).map_err(|e| {
                CollectError::configuration(format!("invalid glob pattern '{}': {}", pattern, e))
            })?;
            compiled.push((pattern.to_string(), regex));
        }
        Ok(Self { patterns: compiled })
    }

    /// The first pattern matching the name, if any
    pub fn matches(&self, name: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(name))
            .map(|(pattern, _)| pattern.as_str())
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.matches(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Translate a shell-style glob into an anchored regular expression
pub fn glob_to_regex(glob: &str) -> String {
    let mut re = String::from("^");
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => {
                let mut set = String::new();
                let mut negated = false;
                let mut closed = false;
                if chars.peek() == Some(&'!') {
                    chars.next();
                    negated = true;
                }
                while let Some(n) = chars.next() {
                    if n == ']' && !set.is_empty() {
                        closed = true;
                        break;
                    }
                    match n {
                        ']' => set.push_str("\\]"),
                        '\\' => set.push_str("\\\\"),
                        '^' => set.push_str("\\^"),
                        other => set.push(other),
                    }
                }
                if closed {
                    re.push('[');
                    if negated {
                        re.push('^');
                    }
                    re.push_str(&set);
                    re.push(']');
                } else {
                    // Unterminated character class is matched literally
                    re.push_str(&regex::escape("["));
                    if negated {
                        re.push_str(&regex::escape("!"));
                    }
                    re.push_str(&regex::escape(&set.replace("\\]", "]").replace("\\\\", "\\")));
                }
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    re
}

/// One exclusion scope: exact basenames excluded at a directory and below
#[derive(Debug, Clone)]
pub struct ExclusionScope {
    pub root: PathBuf,
    pub names: Vec<String>,
}

/// Ordered, mutable set of scoped exact-name exclusion lists.
///
/// The scoped analog of a conftest-declared ignore list: each scope applies
/// to the declaring directory and all its descendants, matching candidate
/// basenames exactly. Mutation happens through the configure-time context.
#[derive(Debug, Clone, Default)]
pub struct ScopedExclusions {
    scopes: Vec<ExclusionScope>,
}

impl ScopedExclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an exclusion list scoped at `root`
    pub fn add_scope<P, I, S>(&mut self, root: P, names: I)
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.push(ExclusionScope {
            root: root.into(),
            names: names.into_iter().map(|n| n.into()).collect(),
        });
    }

    /// Drop every declared scope
    pub fn clear(&mut self) {
        self.scopes.clear();
    }

    /// Drop the scopes declared at exactly `root`
    pub fn remove_scope(&mut self, root: &Path) {
        self.scopes.retain(|scope| scope.root != root);
    }

    /// The first scope excluding this path, if any
    pub fn lookup(&self, path: &Path) -> Option<&ExclusionScope> {
        let name = basename(path);
        if name.is_empty() {
            return None;
        }
        let dir = path.parent()?;
        self.scopes
            .iter()
            .find(|scope| dir.starts_with(&scope.root) && scope.names.iter().any(|n| n == name))
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn scopes(&self) -> &[ExclusionScope] {
        &self.scopes
    }
}

/// The static part of the admission filter (rules 1–3); the hook rule is
/// dispatched by the session so this stays free of extension state.
#[derive(Debug, Clone)]
pub struct PathFilter {
    norecurse: GlobSet,
}

impl PathFilter {
    pub fn from_config(config: &CollectConfig) -> CollectResult<Self> {
        Ok(Self { norecurse: GlobSet::compile(&config.norecurse)? })
    }

    /// Apply rules 1–3 in order, first match wins
    pub fn check_static(&self, path: &Path, exclusions: &ScopedExclusions) -> FilterResult {
        let name = basename(path);
        if is_hard_skipped(name) {
            return ControlFlow::Break(SkipReason::HardSkip);
        }
        if let Some(pattern) = self.norecurse.matches(name) {
            return ControlFlow::Break(SkipReason::NoRecurse(pattern.to_string()));
        }
        if let Some(scope) = exclusions.lookup(path) {
            return ControlFlow::Break(SkipReason::Excluded(scope.root.clone()));
        }
        ControlFlow::Continue(())
    }
}
