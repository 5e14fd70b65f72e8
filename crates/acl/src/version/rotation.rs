//! Encryption-key rotation bookkeeping
//!
//! [`KeyRotationQueries`] answers the questions an external re-encryption
//! workflow asks while it moves versions from old keys to the active key:
//! which versions still need work, how far along it is, and whether an old
//! key is no longer referenced and may be retired.

use crate::core::{AclResult, CredentialVersion, EncryptionKeyId, PageRequest, VersionSlice};
use crate::traits::CredentialVersionStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Snapshot of re-encryption progress toward one active key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationProgress {
    /// Key new material is encrypted under
    pub active_key: EncryptionKeyId,
    /// Version count per key in use
    pub by_key: BTreeMap<EncryptionKeyId, u64>,
    /// Total number of versions
    pub total: u64,
    /// Versions still encrypted under some other key
    pub remaining: u64,
}

impl RotationProgress {
    /// Versions already under the active key
    pub fn on_active_key(&self) -> u64 {
        self.by_key.get(&self.active_key).copied().unwrap_or(0)
    }

    /// No version references any key but the active one
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

/// Queries used by the key-rotation workflow
#[derive(Clone)]
pub struct KeyRotationQueries {
    versions: Arc<dyn CredentialVersionStore>,
    batch_size: usize,
}

impl KeyRotationQueries {
    /// Create queries over a version store, paging in `batch_size` chunks
    pub fn new(versions: Arc<dyn CredentialVersionStore>, batch_size: usize) -> Self {
        Self {
            versions,
            batch_size,
        }
    }

    /// Configured page size
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// A key may be retired once no version is encrypted under it
    pub async fn can_retire_key(&self, key: EncryptionKeyId) -> AclResult<bool> {
        let referencing = self.versions.count_encrypted_with_any_of(&[key]).await?;
        debug!(encryption_key = %key, referencing, "Checked key retirement");
        Ok(referencing == 0)
    }

    /// Current progress toward `active_key`
    pub async fn progress(&self, active_key: EncryptionKeyId) -> AclResult<RotationProgress> {
        let by_key = self.versions.count_grouped_by_encryption_key().await?;
        let remaining = self.versions.count_not_encrypted_with_key(active_key).await?;
        let total: u64 = by_key.values().sum();

        info!(
            active_key = %active_key,
            total,
            remaining,
            keys_in_use = by_key.len(),
            "Key rotation progress"
        );

        Ok(RotationProgress {
            active_key,
            by_key,
            total,
            remaining,
        })
    }

    /// First page of versions still under one of `stale_keys`
    pub async fn first_batch(&self, stale_keys: &[EncryptionKeyId]) -> AclResult<VersionSlice> {
        self.next_batch(stale_keys, PageRequest::first(self.batch_size))
            .await
    }

    /// A given page of versions still under one of `stale_keys`
    ///
    /// Re-encrypted versions drop out of the result set, so a workflow that
    /// rewrites each page in place should keep requesting page 0 until it
    /// comes back empty.
    pub async fn next_batch(
        &self,
        stale_keys: &[EncryptionKeyId],
        page: PageRequest,
    ) -> AclResult<VersionSlice> {
        Ok(self
            .versions
            .find_encrypted_with_any_of(stale_keys, page)
            .await?)
    }

    /// Active (non-transitional) certificate version
    pub async fn active_certificate_version(
        &self,
        credential_uuid: Uuid,
    ) -> AclResult<Option<CredentialVersion>> {
        Ok(self
            .versions
            .find_latest_non_transitional_certificate_version(credential_uuid)
            .await?)
    }

    /// Transitional certificate version, if a rotation window is open
    pub async fn transitional_certificate_version(
        &self,
        credential_uuid: Uuid,
    ) -> AclResult<Option<CredentialVersion>> {
        Ok(self
            .versions
            .find_transitional_certificate_version(credential_uuid)
            .await?)
    }

    /// Latest version of any type
    pub async fn latest_version(&self, credential_uuid: Uuid) -> AclResult<Option<CredentialVersion>> {
        Ok(self.versions.find_latest(credential_uuid).await?)
    }

    /// Full history, newest first
    pub async fn history(
        &self,
        credential_uuid: Uuid,
        type_filter: Option<&str>,
    ) -> AclResult<Vec<CredentialVersion>> {
        Ok(self
            .versions
            .find_all_by_credential(credential_uuid, type_filter)
            .await?)
    }
}
