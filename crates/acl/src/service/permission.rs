//! Caller-facing capability checks
//!
//! [`PermissionService`] evaluates the authenticated caller's capabilities on
//! a credential by delegating to the ACL engine with the caller's actor.
//! Nothing is cached; every check reads committed state.

use crate::core::{
    AccessControlOperation, AclError, AclResult, CREDENTIAL_INVALID_ACCESS, CallerContext,
    LACKS_CREDENTIAL_WRITE,
};
use crate::service::AccessControlDataService;
use tracing::warn;

/// Capability checks for an authenticated caller
#[derive(Clone)]
pub struct PermissionService {
    data: AccessControlDataService,
}

impl PermissionService {
    /// Create a service over the ACL engine
    pub fn new(data: AccessControlDataService) -> Self {
        Self { data }
    }

    /// May the caller read the credential value
    pub async fn has_read_permission(&self, caller: &CallerContext, name: &str) -> AclResult<bool> {
        self.data.has_read_permission(&caller.actor, name).await
    }

    /// May the caller write a new credential value
    pub async fn has_write_permission(&self, caller: &CallerContext, name: &str) -> AclResult<bool> {
        self.data
            .has_credential_write_permission(&caller.actor, name)
            .await
    }

    /// May the caller delete the credential
    pub async fn has_delete_permission(&self, caller: &CallerContext, name: &str) -> AclResult<bool> {
        self.data
            .has_credential_delete_permission(&caller.actor, name)
            .await
    }

    /// May the caller read the credential's ACL
    pub async fn has_acl_read_permission(&self, caller: &CallerContext, name: &str) -> AclResult<bool> {
        self.data.has_read_acl_permission(&caller.actor, name).await
    }

    /// May the caller modify the credential's ACL
    pub async fn has_acl_write_permission(&self, caller: &CallerContext, name: &str) -> AclResult<bool> {
        self.data.has_acl_write_permission(&caller.actor, name).await
    }

    /// Require `read`
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when the caller lacks the capability, or the
    /// store error if the check itself failed.
    pub async fn verify_read_permission(&self, caller: &CallerContext, name: &str) -> AclResult<()> {
        self.verify(caller, name, AccessControlOperation::Read).await
    }

    /// Require `write`
    pub async fn verify_write_permission(&self, caller: &CallerContext, name: &str) -> AclResult<()> {
        self.verify(caller, name, AccessControlOperation::Write).await
    }

    /// Require `delete`
    pub async fn verify_delete_permission(&self, caller: &CallerContext, name: &str) -> AclResult<()> {
        self.verify(caller, name, AccessControlOperation::Delete)
            .await
    }

    /// Require `read_acl`
    pub async fn verify_acl_read_permission(&self, caller: &CallerContext, name: &str) -> AclResult<()> {
        self.verify(caller, name, AccessControlOperation::ReadAcl)
            .await
    }

    /// Require `write_acl`
    pub async fn verify_acl_write_permission(
        &self,
        caller: &CallerContext,
        name: &str,
    ) -> AclResult<()> {
        self.verify(caller, name, AccessControlOperation::WriteAcl)
            .await
    }

    async fn verify(
        &self,
        caller: &CallerContext,
        name: &str,
        operation: AccessControlOperation,
    ) -> AclResult<()> {
        if self.data.has_permission(&caller.actor, name, operation).await? {
            return Ok(());
        }

        warn!(
            credential = %name,
            actor = %caller.actor,
            operation = %operation,
            trace_id = %caller.trace_id,
            "Permission check failed"
        );
        Err(AclError::permission_denied(denial_key(operation)))
    }
}

fn denial_key(operation: AccessControlOperation) -> &'static str {
    match operation {
        AccessControlOperation::WriteAcl => LACKS_CREDENTIAL_WRITE,
        AccessControlOperation::Read
        | AccessControlOperation::Write
        | AccessControlOperation::Delete
        | AccessControlOperation::ReadAcl => CREDENTIAL_INVALID_ACCESS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AccessControlEntry;
    use crate::storage::{MemoryAccessEntryStore, MemoryCredentialNameStore};
    use std::sync::Arc;

    async fn service_with_grant(
        actor: &str,
        operations: Vec<AccessControlOperation>,
    ) -> PermissionService {
        let names = Arc::new(MemoryCredentialNameStore::new());
        let credential = names.create("/db/password");
        let data = AccessControlDataService::new(names, Arc::new(MemoryAccessEntryStore::new()));
        data.save_access_control_entries(&credential, &[AccessControlEntry::new(actor, operations)])
            .await
            .unwrap();
        PermissionService::new(data)
    }

    #[tokio::test]
    async fn test_checks_use_caller_actor() {
        let service = service_with_grant("alice", vec![AccessControlOperation::Read]).await;
        let alice = CallerContext::new("alice");
        let bob = CallerContext::new("bob");

        assert!(service.has_read_permission(&alice, "/db/password").await.unwrap());
        assert!(!service.has_read_permission(&bob, "/db/password").await.unwrap());
        assert!(!service.has_write_permission(&alice, "/db/password").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_denial_keys() {
        let service = service_with_grant("alice", vec![AccessControlOperation::Read]).await;
        let alice = CallerContext::new("alice");

        service
            .verify_read_permission(&alice, "/db/password")
            .await
            .unwrap();

        let err = service
            .verify_acl_write_permission(&alice, "/db/password")
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert_eq!(err.key(), Some(LACKS_CREDENTIAL_WRITE));

        let err = service
            .verify_delete_permission(&alice, "/db/password")
            .await
            .unwrap_err();
        assert_eq!(err.key(), Some(CREDENTIAL_INVALID_ACCESS));
    }
}
