//! ACL engine
//!
//! [`AccessControlDataService`] lists, upserts, deletes and evaluates
//! access entries. It performs no caller authorization itself; that is the
//! handler's job.

use crate::core::{
    AccessControlEntry, AccessControlOperation, AccessEntry, AclResult, CredentialName,
};
use crate::service::EntryLocks;
use crate::traits::{AccessEntryStore, CredentialNameStore};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info};

/// Access-entry engine over the name and entry stores
#[derive(Clone)]
pub struct AccessControlDataService {
    names: Arc<dyn CredentialNameStore>,
    entries: Arc<dyn AccessEntryStore>,
    locks: Option<Arc<EntryLocks>>,
}

impl AccessControlDataService {
    /// Create an engine that serializes upserts and deletes per (credential, actor)
    pub fn new(names: Arc<dyn CredentialNameStore>, entries: Arc<dyn AccessEntryStore>) -> Self {
        Self {
            names,
            entries,
            locks: Some(Arc::new(EntryLocks::new())),
        }
    }

    /// Create an engine that leaves upsert atomicity to the store
    pub fn without_entry_locks(
        names: Arc<dyn CredentialNameStore>,
        entries: Arc<dyn AccessEntryStore>,
    ) -> Self {
        Self {
            names,
            entries,
            locks: None,
        }
    }

    /// Current ACL of a credential, one view per stored entry
    pub async fn get_access_control_list(
        &self,
        credential: &CredentialName,
    ) -> AclResult<Vec<AccessControlEntry>> {
        let entries = self
            .entries
            .find_all_by_credential(credential.uuid())
            .await?;
        Ok(entries.iter().map(AccessEntry::to_view).collect())
    }

    /// Grant the listed operations, item by item in caller order
    ///
    /// Flags already held are kept. Nothing is rolled back: if item `k`
    /// fails, items before it stay committed and the error is returned.
    pub async fn save_access_control_entries(
        &self,
        credential: &CredentialName,
        entries: &[AccessControlEntry],
    ) -> AclResult<()> {
        info!(
            credential = %credential,
            count = entries.len(),
            "Saving access control entries"
        );

        for (index, item) in entries.iter().enumerate() {
            if let Err(e) = self.upsert_entry(credential, item).await {
                error!(
                    credential = %credential,
                    actor = %item.actor,
                    applied = index,
                    error = %e,
                    "Access entry upsert failed"
                );
                return Err(e);
            }
        }

        Ok(())
    }

    async fn upsert_entry(
        &self,
        credential: &CredentialName,
        item: &AccessControlEntry,
    ) -> AclResult<()> {
        let guard = self.lock_pair(credential, &item.actor).await;

        // Only the requested flags go to the store, which ORs them into
        // whatever is stored at write time.
        let mut grant = AccessEntry::new(credential.uuid(), item.actor.clone());
        grant.enable_operations(&item.operations);
        let saved = self.entries.save(&grant).await;

        drop(guard);
        self.release_pair(credential, &item.actor);
        saved?;

        debug!(
            credential = %credential,
            actor = %item.actor,
            granted = grant.flags().bits(),
            "Access entry saved"
        );
        Ok(())
    }

    async fn lock_pair(
        &self,
        credential: &CredentialName,
        actor: &str,
    ) -> Option<OwnedMutexGuard<()>> {
        match &self.locks {
            Some(locks) => Some(locks.lock(credential.uuid(), actor).await),
            None => None,
        }
    }

    fn release_pair(&self, credential: &CredentialName, actor: &str) {
        if let Some(locks) = &self.locks {
            locks.release_idle(credential.uuid(), actor);
        }
    }

    /// Operations `actor` holds on `name`; empty when there is no entry
    pub async fn get_allowed_operations(
        &self,
        name: &str,
        actor: &str,
    ) -> AclResult<Vec<AccessControlOperation>> {
        Ok(self
            .find_entry(name, actor)
            .await?
            .map(|entry| entry.operations())
            .unwrap_or_default())
    }

    /// Remove the entry for `actor`; removing an absent entry is a no-op
    pub async fn delete_access_control_entry(&self, name: &str, actor: &str) -> AclResult<()> {
        let Some(credential) = self.names.find_by_name(name).await? else {
            debug!(credential = %name, actor = %actor, "Delete on unknown credential");
            return Ok(());
        };

        let guard = self.lock_pair(&credential, actor).await;
        let deleted = self
            .entries
            .delete_by_credential_and_actor(credential.uuid(), actor)
            .await;
        drop(guard);
        self.release_pair(&credential, actor);
        deleted?;

        info!(credential = %credential, actor = %actor, "Access entry deleted");
        Ok(())
    }

    /// Whether `actor` holds `operation` on `name`
    ///
    /// Reads committed state on every call. An unknown credential or a
    /// missing entry both mean `false`.
    pub async fn has_permission(
        &self,
        actor: &str,
        name: &str,
        operation: AccessControlOperation,
    ) -> AclResult<bool> {
        let allowed = self
            .find_entry(name, actor)
            .await?
            .is_some_and(|entry| entry.allows(operation));
        debug!(
            credential = %name,
            actor = %actor,
            operation = %operation,
            allowed,
            "Permission evaluated"
        );
        Ok(allowed)
    }

    /// `read` capability
    pub async fn has_read_permission(&self, actor: &str, name: &str) -> AclResult<bool> {
        self.has_permission(actor, name, AccessControlOperation::Read)
            .await
    }

    /// `write` capability
    pub async fn has_credential_write_permission(&self, actor: &str, name: &str) -> AclResult<bool> {
        self.has_permission(actor, name, AccessControlOperation::Write)
            .await
    }

    /// `delete` capability
    pub async fn has_credential_delete_permission(
        &self,
        actor: &str,
        name: &str,
    ) -> AclResult<bool> {
        self.has_permission(actor, name, AccessControlOperation::Delete)
            .await
    }

    /// `read_acl` capability
    pub async fn has_read_acl_permission(&self, actor: &str, name: &str) -> AclResult<bool> {
        self.has_permission(actor, name, AccessControlOperation::ReadAcl)
            .await
    }

    /// `write_acl` capability
    pub async fn has_acl_write_permission(&self, actor: &str, name: &str) -> AclResult<bool> {
        self.has_permission(actor, name, AccessControlOperation::WriteAcl)
            .await
    }

    async fn find_entry(&self, name: &str, actor: &str) -> AclResult<Option<AccessEntry>> {
        let Some(credential) = self.names.find_by_name(name).await? else {
            return Ok(None);
        };
        Ok(self
            .entries
            .find_by_credential_and_actor(credential.uuid(), actor)
            .await?)
    }
}
