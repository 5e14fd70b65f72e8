//! ACL request handling
//!
//! [`AccessControlHandler`] authorizes the caller, then delegates to the ACL
//! engine. Denials are reported per operation:
//!
//! | Operation | Caller lacks the capability                      |
//! |-----------|--------------------------------------------------|
//! | get       | `NotFound("error.resource_not_found")`           |
//! | set       | `PermissionDenied("error.acl.lacks_credential_write")` |
//! | delete    | `NotFound("error.acl.lacks_credential_write")`   |
//!
//! A `get` on a credential the caller may not see is indistinguishable from
//! a `get` on a credential that does not exist.

use crate::core::{
    AccessControlEntry, AccessControlList, AccessControlOperation, AclError, AclResult,
    CallerContext, CredentialName, LACKS_CREDENTIAL_WRITE,
};
use crate::service::{AccessControlDataService, PermissionService};
use crate::traits::CredentialNameStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point for ACL reads and writes on behalf of a caller
#[derive(Clone)]
pub struct AccessControlHandler {
    permissions: PermissionService,
    data: AccessControlDataService,
    names: Arc<dyn CredentialNameStore>,
}

impl AccessControlHandler {
    /// Create a handler
    pub fn new(
        permissions: PermissionService,
        data: AccessControlDataService,
        names: Arc<dyn CredentialNameStore>,
    ) -> Self {
        Self {
            permissions,
            data,
            names,
        }
    }

    /// ACL of `name`, if the caller may read it
    ///
    /// # Errors
    ///
    /// - `NotFound("error.resource_not_found")` when the credential is
    ///   missing or the caller lacks `read_acl`
    /// - `Storage` when a store fails
    pub async fn get_access_control_list(
        &self,
        caller: &CallerContext,
        name: &str,
    ) -> AclResult<AccessControlList> {
        let credential = self.resolve(caller, name).await?;

        if !self.permissions.has_acl_read_permission(caller, name).await? {
            warn!(
                credential = %name,
                actor = %caller.actor,
                trace_id = %caller.trace_id,
                "ACL read denied"
            );
            return Err(AclError::not_found());
        }

        let entries = self.data.get_access_control_list(&credential).await?;
        debug!(
            credential = %name,
            actor = %caller.actor,
            trace_id = %caller.trace_id,
            entries = entries.len(),
            "ACL read"
        );
        Ok(list_response(&credential, entries))
    }

    /// Grant operations on `name` and return the refreshed ACL
    ///
    /// Request entries are validated only after the caller is authorized, so
    /// a validation error never reveals that a credential exists.
    ///
    /// # Errors
    ///
    /// - `NotFound("error.resource_not_found")` when the credential is missing
    /// - `PermissionDenied("error.acl.lacks_credential_write")` when the
    ///   caller lacks `write_acl`
    /// - `Validation` for a malformed request entry
    /// - `Storage` when a store fails; entries before the failing one stay
    ///   applied
    pub async fn set_access_control_entries(
        &self,
        caller: &CallerContext,
        name: &str,
        entries: &[AccessControlEntry],
    ) -> AclResult<AccessControlList> {
        let credential = self.resolve(caller, name).await?;

        if !self.permissions.has_acl_write_permission(caller, name).await? {
            warn!(
                credential = %name,
                actor = %caller.actor,
                trace_id = %caller.trace_id,
                "ACL write denied"
            );
            return Err(AclError::permission_denied(LACKS_CREDENTIAL_WRITE));
        }

        for entry in entries {
            entry.validate()?;
        }

        self.data
            .save_access_control_entries(&credential, entries)
            .await?;
        let refreshed = self.data.get_access_control_list(&credential).await?;

        debug!(
            credential = %name,
            actor = %caller.actor,
            trace_id = %caller.trace_id,
            granted = entries.len(),
            "ACL updated"
        );
        Ok(list_response(&credential, refreshed))
    }

    /// Remove `actor`'s entry on `name`
    ///
    /// # Errors
    ///
    /// - `NotFound("error.acl.lacks_credential_write")` when the caller lacks
    ///   `write_acl` (including when the credential does not exist)
    /// - `Storage` when a store fails
    pub async fn delete_access_control_entry(
        &self,
        caller: &CallerContext,
        name: &str,
        actor: &str,
    ) -> AclResult<()> {
        if !self.permissions.has_acl_write_permission(caller, name).await? {
            warn!(
                credential = %name,
                actor = %caller.actor,
                target_actor = %actor,
                trace_id = %caller.trace_id,
                "ACL entry delete denied"
            );
            return Err(AclError::NotFound {
                key: LACKS_CREDENTIAL_WRITE,
            });
        }

        self.data.delete_access_control_entry(name, actor).await?;
        debug!(
            credential = %name,
            actor = %caller.actor,
            target_actor = %actor,
            trace_id = %caller.trace_id,
            "ACL entry deleted"
        );
        Ok(())
    }

    /// Operations `actor` holds on `name`, without authorizing a caller
    pub async fn get_allowed_operations(
        &self,
        name: &str,
        actor: &str,
    ) -> AclResult<Vec<AccessControlOperation>> {
        self.data.get_allowed_operations(name, actor).await
    }

    async fn resolve(&self, caller: &CallerContext, name: &str) -> AclResult<CredentialName> {
        match self.names.find_by_name(name).await? {
            Some(credential) => Ok(credential),
            None => {
                debug!(
                    credential = %name,
                    actor = %caller.actor,
                    trace_id = %caller.trace_id,
                    "Credential not found"
                );
                Err(AclError::not_found())
            }
        }
    }
}

fn list_response(credential: &CredentialName, entries: Vec<AccessControlEntry>) -> AccessControlList {
    AccessControlList {
        credential_name: credential.name().to_string(),
        access_control_list: entries,
    }
}
