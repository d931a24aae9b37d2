//! Collection Configuration
//!
//! Static configuration consumed by the collection engine: the traversal root,
//! do-not-recurse patterns, the artifact naming convention and free-form
//! options read by hooks at configure time.

use std::collections::HashMap;
use std::path::PathBuf;

use super::error::{CollectError, CollectResult};

/// Default do-not-recurse glob patterns, matched against basenames only.
///
/// Version-control and hidden directories are excluded unconditionally by the
/// hard-skip rule and are deliberately not repeated here.
pub const DEFAULT_NORECURSE: &[&str] = &["*.egg", "*.egg-info", "__pycache__", "node_modules"];

/// Default glob patterns for recognized test file names.
pub const DEFAULT_FILE_PATTERNS: &[&str] = &["test_*.py", "*_test.py"];

/// Configuration for a collection session
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// Root directory for traversal
    pub root: PathBuf,

    /// Do-not-recurse glob patterns (basename matching)
    pub norecurse: Vec<String>,

    /// Glob patterns a file basename must match to become a module collector
    pub file_patterns: Vec<String>,

    /// Prefix a callable name must carry to be collected as a test function
    pub function_prefix: String,

    /// Prefix a class name must carry to be collected as a test class
    pub class_prefix: String,

    /// Free-form options, readable by hooks during the configure pass
    pub options: HashMap<String, String>,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            norecurse: DEFAULT_NORECURSE.iter().map(|s| s.to_string()).collect(),
            file_patterns: DEFAULT_FILE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            function_prefix: "test".to_string(),
            class_prefix: "Test".to_string(),
            options: HashMap::new(),
        }
    }
}

impl CollectConfig {
    /// Create a configuration rooted at the given directory
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into(), ..Default::default() }
    }

    /// Set the traversal root
    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = root.into();
        self
    }

    /// Replace the do-not-recurse patterns
    pub fn with_norecurse<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.norecurse = patterns.into_iter().map(|p| p.into()).collect();
        self
    }

    /// Add further do-not-recurse patterns to the configured set
    pub fn add_norecurse<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.norecurse.extend(patterns.into_iter().map(|p| p.into()));
    }

    /// Replace the recognized file name patterns
    pub fn with_file_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_patterns = patterns.into_iter().map(|p| p.into()).collect();
        self
    }

    /// Set a free-form option
    pub fn with_option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Check whether a boolean-style option flag is set
    pub fn flag(&self, key: &str) -> bool {
        match self.options.get(key) {
            Some(value) => !matches!(value.to_lowercase().as_str(), "false" | "0" | "no" | "off"),
            None => false,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CollectResult<()> {
        if self.file_patterns.is_empty() {
            return Err(CollectError::configuration(
                "at least one recognized file pattern is required",
            ));
        }
        if self.function_prefix.is_empty() {
            return Err(CollectError::configuration("function prefix must not be empty"));
        }
        if self.class_prefix.is_empty() {
            return Err(CollectError::configuration("class prefix must not be empty"));
        }
        if self.norecurse.iter().any(|p| p.is_empty())
            || self.file_patterns.iter().any(|p| p.is_empty())
        {
            return Err(CollectError::configuration("glob patterns must not be empty strings"));
        }
        Ok(())
    }
}
