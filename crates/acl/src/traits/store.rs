//! Repository traits consumed by the access-control core
//!
//! Each entity gets one explicit repository; every cross-entity read is an
//! explicit call on one of these traits.

use crate::core::{
    AccessEntry, CredentialName, CredentialVersion, EncryptionKeyId, PageRequest, StorageResult,
    VersionSlice,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Resolves credential names to identities
#[async_trait]
pub trait CredentialNameStore: Send + Sync {
    /// Find the identity registered under `name`
    async fn find_by_name(&self, name: &str) -> StorageResult<Option<CredentialName>>;
}

/// Persistence of per-actor permission grants
///
/// Implementations must keep at most one entry per (credential, actor):
/// `save` merges into the stored entry for the pair, it never adds a second one.
#[async_trait]
pub trait AccessEntryStore: Send + Sync {
    /// All entries of a credential
    async fn find_all_by_credential(&self, credential_uuid: Uuid) -> StorageResult<Vec<AccessEntry>>;

    /// Entry of one actor on a credential
    async fn find_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<Option<AccessEntry>>;

    /// OR the entry's flags into the stored entry for
    /// `(entry.credential_uuid(), entry.actor())`, inserting it when absent
    ///
    /// The merge must be atomic per pair. Callers pass only the flags being
    /// granted, never a copy read earlier, so a concurrent delete is not undone
    /// by re-inserting stale flags.
    async fn save(&self, entry: &AccessEntry) -> StorageResult<()>;

    /// Remove the entry of one actor; a missing entry is not an error
    async fn delete_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<()>;
}

/// Read model over credential versions used by key rotation
///
/// "Latest" always means greatest `created_at`, ties broken by greatest
/// `sequence` (see [`crate::version::select`]).
#[async_trait]
pub trait CredentialVersionStore: Send + Sync {
    /// Store a version, assigning its insertion sequence; returns the stored copy
    async fn save(&self, version: CredentialVersion) -> StorageResult<CredentialVersion>;

    /// Version by id
    async fn find_by_uuid(&self, uuid: Uuid) -> StorageResult<Option<CredentialVersion>>;

    /// Latest certificate version with `transitional = false`
    async fn find_latest_non_transitional_certificate_version(
        &self,
        credential_uuid: Uuid,
    ) -> StorageResult<Option<CredentialVersion>>;

    /// Latest certificate version with `transitional = true`
    async fn find_transitional_certificate_version(
        &self,
        credential_uuid: Uuid,
    ) -> StorageResult<Option<CredentialVersion>>;

    /// Number of versions not encrypted under `key`
    async fn count_not_encrypted_with_key(&self, key: EncryptionKeyId) -> StorageResult<u64>;

    /// Number of versions encrypted under any of `keys`
    async fn count_encrypted_with_any_of(&self, keys: &[EncryptionKeyId]) -> StorageResult<u64>;

    /// Version count per encryption key currently in use
    async fn count_grouped_by_encryption_key(&self) -> StorageResult<BTreeMap<EncryptionKeyId, u64>>;

    /// One page of versions encrypted under any of `keys`, in a stable order
    async fn find_encrypted_with_any_of(
        &self,
        keys: &[EncryptionKeyId],
        page: PageRequest,
    ) -> StorageResult<VersionSlice>;

    /// Latest version of a credential
    async fn find_latest(&self, credential_uuid: Uuid) -> StorageResult<Option<CredentialVersion>>;

    /// All versions of a credential, newest first, optionally of one type
    async fn find_all_by_credential(
        &self,
        credential_uuid: Uuid,
        type_filter: Option<&str>,
    ) -> StorageResult<Vec<CredentialVersion>>;
}
