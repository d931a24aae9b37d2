//! Hook Error Types
//!
//! Error handling for hook registration and dispatch.

use thiserror::Error;

/// Result type for hook operations
pub type HookResult<T> = Result<T, HookError>;

/// Error types for hook operations
#[derive(Error, Debug, Clone)]
pub enum HookError {
    /// A hook with the same name is already registered
    #[error("hook already registered: {hook}")]
    AlreadyRegistered { hook: String },

    /// A hook call failed, attributed to the hook by the registry
    #[error("hook '{hook}' failed: {message}")]
    CallFailed { hook: String, message: String },

    /// A failure raised inside a hook implementation, not yet attributed
    #[error("{message}")]
    Failed { message: String },
}

impl HookError {
    /// Create an already-registered error
    pub fn already_registered<S: Into<String>>(hook: S) -> Self {
        Self::AlreadyRegistered { hook: hook.into() }
    }

    /// Create a failure raised by a hook implementation
    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self::Failed { message: message.into() }
    }

    /// Attribute this failure to a named hook
    pub fn attributed_to(self, hook: &str) -> Self {
        match self {
            Self::Failed { message } => Self::CallFailed { hook: hook.to_string(), message },
            other => other,
        }
    }

    /// The hook this error is attributed to, if known
    pub fn hook_name(&self) -> Option<&str> {
        match self {
            Self::AlreadyRegistered { hook } | Self::CallFailed { hook, .. } => Some(hook),
            Self::Failed { .. } => None,
        }
    }

    /// The underlying failure message
    pub fn message(&self) -> &str {
        match self {
            Self::AlreadyRegistered { hook } => hook,
            Self::CallFailed { message, .. } | Self::Failed { message } => message,
        }
    }
}
