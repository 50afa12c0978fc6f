//! Unified error types for the wgns workspace.
//!
//! Failures of the underlying `ip` tool are classified into these variants
//! by the component that issued the command, since the same diagnostic means
//! different things for different operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum WgnsError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A name, address, or configuration value is malformed.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected value.
        message: String,
    },

    /// A referenced resource does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The target resource is already present in a form that cannot be reused.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Type of the conflicting resource.
        kind: &'static str,
        /// Identifier of the conflicting resource.
        id: String,
    },

    /// A privileged operation was attempted without sufficient rights.
    #[error("permission denied: {message} (run as root or with sudo)")]
    PermissionDenied {
        /// Description of the denied operation.
        message: String,
    },

    /// The underlying tool exited non-zero for any other reason.
    #[error("command `{command}` failed: {message}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Raw diagnostic text reported by the tool.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Coarse classification of a [`WgnsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Target state already present.
    AlreadyExists,
    /// Referenced namespace, interface, or document absent.
    NotFound,
    /// Insufficient privileges.
    PermissionDenied,
    /// Malformed name, address, or value.
    InvalidInput,
    /// Any other failure of the underlying tool or the host.
    CommandFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "already-exists"),
            Self::NotFound => write!(f, "not-found"),
            Self::PermissionDenied => write!(f, "permission-denied"),
            Self::InvalidInput => write!(f, "invalid-input"),
            Self::CommandFailure => write!(f, "command-failure"),
        }
    }
}

impl WgnsError {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Io { source, .. } if matches!(source.kind(), std::io::ErrorKind::PermissionDenied) => {
                ErrorKind::PermissionDenied
            }
            Self::Io { .. } | Self::CommandFailed { .. } | Self::Serialization { .. } => {
                ErrorKind::CommandFailure
            }
        }
    }

    /// Shorthand for an [`WgnsError::InvalidInput`] with the given message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, WgnsError>;
