//! Collection Error Types
//!
//! Error taxonomy for discovery and collection with context-aware error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for collection operations
pub type CollectResult<T> = Result<T, CollectError>;

/// Error types raised while building or collecting nodes
#[derive(Error, Debug, Clone)]
pub enum CollectError {
    /// Filesystem access failed for a path
    #[error("{path}: {message}")]
    Io { path: PathBuf, message: String },

    /// A test artifact could not be loaded or scanned
    #[error("{path}:{line}: {message}")]
    Load {
        path: PathBuf,
        line: usize,
        message: String,
        source_line: Option<String>,
    },

    /// A registered hook failed while resolving a path
    #[error("hook '{hook}' failed for {path}: {message}")]
    Hook {
        hook: String,
        path: PathBuf,
        message: String,
    },

    /// The configured collection root is unusable
    #[error("invalid collection root {path}: {message}")]
    InvalidRoot { path: PathBuf, message: String },

    /// Collection configuration is invalid
    #[error("collection configuration error: {message}")]
    Configuration { message: String },

    /// The owning session was dropped while a node was still in use
    #[error("collection session is no longer alive")]
    SessionClosed,

    /// Extension-defined failure kind, recognized by variant-specific renderers
    #[error("{kind}: {message}")]
    Custom { kind: String, message: String },
}

impl CollectError {
    /// Create an IO error for a path
    pub fn io<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Io { path: path.into(), message: message.into() }
    }

    /// Create a load error without a source excerpt
    pub fn load<P: Into<PathBuf>, S: Into<String>>(path: P, line: usize, message: S) -> Self {
        Self::Load { path: path.into(), line, message: message.into(), source_line: None }
    }

    /// Create a load error carrying the offending source line
    pub fn load_with_source<P: Into<PathBuf>, S: Into<String>>(
        path: P,
        line: usize,
        message: S,
        source_line: String,
    ) -> Self {
        Self::Load {
            path: path.into(),
            line,
            message: message.into(),
            source_line: Some(source_line),
        }
    }

    /// Create an extension failure attributed to a named hook
    pub fn hook<S: Into<String>, P: Into<PathBuf>, M: Into<String>>(
        hook: S,
        path: P,
        message: M,
    ) -> Self {
        Self::Hook { hook: hook.into(), path: path.into(), message: message.into() }
    }

    /// Create an invalid root error
    pub fn invalid_root<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::InvalidRoot { path: path.into(), message: message.into() }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create an extension-defined failure
    pub fn custom<K: Into<String>, S: Into<String>>(kind: K, message: S) -> Self {
        Self::Custom { kind: kind.into(), message: message.into() }
    }

    /// Wrap a std IO error with the path it occurred on
    pub fn from_io(path: &Path, err: &std::io::Error) -> Self {
        Self::io(path, err.to_string())
    }

    /// Check if this failure came from loading an artifact
    pub fn is_load_failure(&self) -> bool {
        matches!(self, CollectError::Load { .. })
    }

    /// Check if this failure came from a registered extension
    pub fn is_extension_failure(&self) -> bool {
        matches!(self, CollectError::Hook { .. })
    }

    /// The extension-defined failure kind, if any
    pub fn custom_kind(&self) -> Option<&str> {
        match self {
            CollectError::Custom { kind, .. } => Some(kind.as_str()),
            _ => None,
        }
    }

    /// The path this failure is attributed to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            CollectError::Io { path, .. }
            | CollectError::Load { path, .. }
            | CollectError::Hook { path, .. }
            | CollectError::InvalidRoot { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }
}
