//! Core types for access control

mod context;
mod error;
mod id;
mod operation;
mod permission;
mod version;

pub use context::CallerContext;
pub use error::{
    AclError, AclResult, CREDENTIAL_INVALID_ACCESS, ConfigError, LACKS_CREDENTIAL_WRITE,
    RESOURCE_NOT_FOUND, StorageError, StorageResult, ValidationError,
};
pub use id::{CredentialName, EncryptionKeyId, validate_actor};
pub use operation::AccessControlOperation;
pub use permission::{AccessControlEntry, AccessControlList, AccessEntry, PermissionFlags};
pub use version::{
    CredentialKind, CredentialVersion, PageRequest, ROTATION_BATCH_SIZE, VersionSlice,
};
