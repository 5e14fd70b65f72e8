//! Permission grants and their views
//!
//! An [`AccessEntry`] is the stored grant for one (credential, actor) pair.
//! Its capabilities are a fixed five-bit [`PermissionFlags`] set, so a
//! capability check is a single bit test after one fetch, and re-granting a
//! held capability is a no-op.

use crate::core::{AccessControlOperation, ValidationError, validate_actor};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

bitflags! {
    /// Capabilities held by one actor on one credential.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PermissionFlags: u8 {
        /// May read the credential value.
        const READ = 0b0000_0001;
        /// May write a new credential value.
        const WRITE = 0b0000_0010;
        /// May delete the credential.
        const DELETE = 0b0000_0100;
        /// May read the access-control list.
        const READ_ACL = 0b0000_1000;
        /// May modify the access-control list.
        const WRITE_ACL = 0b0001_0000;
    }
}

impl From<AccessControlOperation> for PermissionFlags {
    fn from(op: AccessControlOperation) -> Self {
        match op {
            AccessControlOperation::Read => Self::READ,
            AccessControlOperation::Write => Self::WRITE,
            AccessControlOperation::Delete => Self::DELETE,
            AccessControlOperation::ReadAcl => Self::READ_ACL,
            AccessControlOperation::WriteAcl => Self::WRITE_ACL,
        }
    }
}

impl PermissionFlags {
    /// Union of the flags for the given operations
    pub fn from_operations(operations: &[AccessControlOperation]) -> Self {
        operations
            .iter()
            .fold(Self::empty(), |acc, op| acc | Self::from(*op))
    }

    /// Decode into operations, in canonical order
    pub fn operations(self) -> Vec<AccessControlOperation> {
        AccessControlOperation::ALL
            .into_iter()
            .filter(|op| self.contains(Self::from(*op)))
            .collect()
    }
}

/// Stored permission grant for one (credential, actor) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEntry {
    credential_uuid: Uuid,
    actor: String,
    flags: PermissionFlags,
}

impl AccessEntry {
    /// New entry with no capabilities
    pub fn new(credential_uuid: Uuid, actor: impl Into<String>) -> Self {
        Self::with_flags(credential_uuid, actor, PermissionFlags::empty())
    }

    /// Rebuild an entry loaded from storage
    pub fn with_flags(
        credential_uuid: Uuid,
        actor: impl Into<String>,
        flags: PermissionFlags,
    ) -> Self {
        Self {
            credential_uuid,
            actor: actor.into(),
            flags,
        }
    }

    /// Uuid of the credential this entry belongs to
    pub fn credential_uuid(&self) -> Uuid {
        self.credential_uuid
    }

    /// Actor this entry grants capabilities to
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Current capability set
    pub fn flags(&self) -> PermissionFlags {
        self.flags
    }

    /// OR-merge the given operations; flags not mentioned are left as they are
    pub fn enable_operations(&mut self, operations: &[AccessControlOperation]) {
        self.flags |= PermissionFlags::from_operations(operations);
    }

    /// OR-merge another flag set, as stores do on save
    pub fn merge_flags(&mut self, flags: PermissionFlags) {
        self.flags |= flags;
    }

    /// Check a single capability
    pub fn allows(&self, operation: AccessControlOperation) -> bool {
        self.flags.contains(PermissionFlags::from(operation))
    }

    /// Decode into operations, in canonical order
    pub fn operations(&self) -> Vec<AccessControlOperation> {
        self.flags.operations()
    }

    /// Build the API view of this entry
    pub fn to_view(&self) -> AccessControlEntry {
        AccessControlEntry::new(self.actor.clone(), self.operations())
    }
}

/// Actor and granted operations, as exchanged with the API layer
///
/// Used both as the request item for setting an ACL and as the view derived
/// from a stored [`AccessEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    /// Actor the operations apply to
    pub actor: String,
    /// Granted operations
    pub operations: Vec<AccessControlOperation>,
}

impl AccessControlEntry {
    /// Create an entry
    pub fn new(actor: impl Into<String>, operations: Vec<AccessControlOperation>) -> Self {
        Self {
            actor: actor.into(),
            operations,
        }
    }

    /// Check the entry is well formed
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a malformed actor or an empty
    /// operation list.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_actor(&self.actor)?;
        if self.operations.is_empty() {
            return Err(ValidationError::EmptyOperations {
                actor: self.actor.clone(),
            });
        }
        Ok(())
    }
}

/// Access-control list of one credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
    /// Name of the credential
    pub credential_name: String,
    /// One entry per actor
    pub access_control_list: Vec<AccessControlEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AccessControlOperation::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_entry_has_no_capabilities() {
        let entry = AccessEntry::new(Uuid::new_v4(), "alice");
        assert!(entry.flags().is_empty());
        assert!(entry.operations().is_empty());
        for op in AccessControlOperation::ALL {
            assert!(!entry.allows(op));
        }
    }

    #[test]
    fn test_enable_operations_is_or_merge() {
        let mut entry = AccessEntry::new(Uuid::new_v4(), "alice");
        entry.enable_operations(&[Read]);
        entry.enable_operations(&[WriteAcl]);
        entry.enable_operations(&[Read]);
        assert_eq!(entry.operations(), vec![Read, WriteAcl]);
    }

    #[test]
    fn test_operations_are_decoded_in_canonical_order() {
        let flags = PermissionFlags::from_operations(&[WriteAcl, Delete, Read, ReadAcl, Write]);
        assert_eq!(flags, PermissionFlags::all());
        assert_eq!(flags.operations(), AccessControlOperation::ALL.to_vec());
    }

    #[test]
    fn test_to_view() {
        let mut entry = AccessEntry::new(Uuid::new_v4(), "bob");
        entry.enable_operations(&[Delete, Read]);
        assert_eq!(
            entry.to_view(),
            AccessControlEntry::new("bob", vec![Read, Delete])
        );
    }

    #[test]
    fn test_entry_validation() {
        assert!(AccessControlEntry::new("alice", vec![Read]).validate().is_ok());
        assert_eq!(
            AccessControlEntry::new("alice", vec![]).validate(),
            Err(ValidationError::EmptyOperations {
                actor: "alice".to_string()
            })
        );
        assert_eq!(
            AccessControlEntry::new("", vec![Read]).validate(),
            Err(ValidationError::EmptyActor)
        );
    }

    #[test]
    fn test_entry_serde_shape() {
        let entry = AccessControlEntry::new("alice", vec![Read, WriteAcl]);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"actor": "alice", "operations": ["read", "write_acl"]})
        );
    }
}
