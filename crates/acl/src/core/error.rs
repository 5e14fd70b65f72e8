//! Error types for access-control operations
//!
//! This module defines a small error hierarchy:
//! - [`AclError`]: Top-level error returned by the engine, permission service
//!   and handler
//! - [`StorageError`]: Failures reported by a store implementation
//! - [`ValidationError`]: Malformed actors or operation lists
//! - [`ConfigError`]: Invalid or unreadable configuration
//!
//! # Message keys
//!
//! `NotFound` and `PermissionDenied` carry a stable message key (for example
//! `error.resource_not_found`) that the API layer translates into a response
//! body. Callers must not infer anything beyond the error kind from a
//! `NotFound`: an unauthorized caller and a missing credential look the same.
//!
//! ```
//! use credgate_acl::core::{AclError, StorageError};
//!
//! let err: AclError = StorageError::backend("find_by_name", "connection reset").into();
//! assert!(matches!(err, AclError::Storage { .. }));
//! ```

use thiserror::Error;

/// Message key used when a credential cannot be found (or must appear so).
pub const RESOURCE_NOT_FOUND: &str = "error.resource_not_found";

/// Message key used when the caller lacks the `write_acl` capability.
pub const LACKS_CREDENTIAL_WRITE: &str = "error.acl.lacks_credential_write";

/// Message key used by `verify_*` checks for the remaining capabilities.
pub const CREDENTIAL_INVALID_ACCESS: &str = "error.credential.invalid_access";

/// Top-level access-control error
#[derive(Debug, Error)]
pub enum AclError {
    /// Credential does not exist, or the caller may not learn that it does
    #[error("Not found: {key}")]
    NotFound {
        /// Stable message key
        key: &'static str,
    },

    /// Caller lacks the capability required for the operation
    #[error("Permission denied: {key}")]
    PermissionDenied {
        /// Stable message key
        key: &'static str,
    },

    /// Request data failed validation
    #[error("Validation error: {source}")]
    Validation {
        /// Underlying validation error
        #[source]
        source: ValidationError,
    },

    /// Store failure, propagated unchanged
    #[error("Storage error: {source}")]
    Storage {
        /// Underlying storage error
        #[source]
        source: StorageError,
    },
}

impl AclError {
    /// `NotFound` with the generic resource key
    pub fn not_found() -> Self {
        Self::NotFound {
            key: RESOURCE_NOT_FOUND,
        }
    }

    /// `PermissionDenied` with the given key
    pub fn permission_denied(key: &'static str) -> Self {
        Self::PermissionDenied { key }
    }

    /// Stable message key for `NotFound` / `PermissionDenied`, if any
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { key } | Self::PermissionDenied { key } => Some(key),
            Self::Validation { .. } | Self::Storage { .. } => None,
        }
    }

    /// Check whether this is a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check whether this is a permission-denied condition
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Store failures
///
/// Stores report failures through this type; nothing in this crate retries
/// them.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend failed (connection loss, query error, ...)
    #[error("Storage operation '{operation}' failed: {reason}")]
    Backend {
        /// Store operation that failed
        operation: String,
        /// Backend-provided reason
        reason: String,
    },

    /// A uniqueness or integrity constraint was violated
    #[error("Storage conflict: {reason}")]
    Conflict {
        /// Backend-provided reason
        reason: String,
    },
}

impl StorageError {
    /// Shorthand for [`StorageError::Backend`]
    pub fn backend(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Request validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Actor cannot be empty
    #[error("Actor cannot be empty")]
    EmptyActor,

    /// Actor is malformed
    #[error("Invalid actor '{actor}': {reason}")]
    InvalidActor {
        /// The rejected actor
        actor: String,
        /// Reason for rejection
        reason: String,
    },

    /// Entry grants no operations
    #[error("Entry for actor '{actor}' lists no operations")]
    EmptyOperations {
        /// Actor of the rejected entry
        actor: String,
    },

    /// Operation name is not one of the five known operations
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidValue {
        /// Offending field
        field: String,
        /// Why it is invalid
        reason: String,
    },

    /// Missing required component or value
    #[error("Missing required configuration: {field}")]
    MissingRequired {
        /// Missing field or component
        field: String,
    },

    /// Configuration text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration file: {source}")]
    Io {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for access-control operations
pub type AclResult<T> = std::result::Result<T, AclError>;

/// Result type alias for store operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for AclError {
    fn from(source: StorageError) -> Self {
        Self::Storage { source }
    }
}

impl From<ValidationError> for AclError {
    fn from(source: ValidationError) -> Self {
        Self::Validation { source }
    }
}
