//! Credgate ACL - per-credential access control for a secret store
//!
//! Decides which actors may read, write, delete, view the access list of, or
//! modify the access list of each stored credential, and answers the
//! version-history queries used by certificate selection and encryption-key
//! rotation.
//!
//! # Features
//!
//! - **Additive grants** - saving entries only ever adds capabilities
//! - **Deny by default** - no entry means no capabilities
//! - **Masked reads** - an ACL the caller may not read looks missing
//! - **Rotation queries** - per-key counts, paging and retirement checks
//! - **Pluggable storage** - in-memory stores, PostgreSQL behind
//!   `storage-postgres`
#![forbid(unsafe_code)]

/// Composition root
pub mod compose;
/// Configuration loading and validation
pub mod config;
/// Core types, errors, and primitives
pub mod core;
/// Logging initialization
pub mod logging;
/// Engine, permission service and request handler
pub mod service;
/// Store implementations
pub mod storage;
/// Repository traits
pub mod traits;
/// Version selection and key rotation
pub mod version;

// ── Root re-exports ─────────────────────────────────────────────────────────
// Commonly-used types available directly as `credgate_acl::TypeName`.

pub use crate::compose::{AccessControl, AccessControlBuilder, MemoryStores};
pub use crate::config::{AclConfig, Format, LogConfig};
pub use crate::core::{
    AccessControlEntry, AccessControlList, AccessControlOperation, AclError, AclResult,
    CallerContext, ConfigError, CredentialName, StorageError, ValidationError,
};
pub use crate::service::{AccessControlDataService, AccessControlHandler, PermissionService};
pub use crate::traits::{AccessEntryStore, CredentialNameStore, CredentialVersionStore};
pub use crate::version::{KeyRotationQueries, RotationProgress};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::compose::{AccessControl, AccessControlBuilder};
    pub use crate::config::AclConfig;
    pub use crate::core::{
        AccessControlEntry, AccessControlList, AccessControlOperation, AclError, AclResult,
        CallerContext, CredentialKind, CredentialName, CredentialVersion, EncryptionKeyId,
    };
    pub use crate::service::{AccessControlHandler, PermissionService};
    pub use crate::storage::{
        MemoryAccessEntryStore, MemoryCredentialNameStore, MemoryCredentialVersionStore,
    };
    pub use crate::traits::{AccessEntryStore, CredentialNameStore, CredentialVersionStore};
}
