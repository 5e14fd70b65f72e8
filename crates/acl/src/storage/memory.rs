//! In-memory stores
//!
//! DashMap-backed implementations of the repository traits. Each DashMap
//! shard lock makes single-row reads and writes atomic, which is all the
//! engine relies on.

use crate::core::{
    AccessEntry, CredentialName, CredentialVersion, EncryptionKeyId, PageRequest, StorageResult,
    VersionSlice,
};
use crate::traits::{AccessEntryStore, CredentialNameStore, CredentialVersionStore};
use crate::version::select;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// In-memory credential name registry
#[derive(Debug, Default)]
pub struct MemoryCredentialNameStore {
    names: DashMap<String, CredentialName>,
}

impl MemoryCredentialNameStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, or return the identity it already has
    pub fn create(&self, name: &str) -> CredentialName {
        self.names
            .entry(name.to_string())
            .or_insert_with(|| CredentialName::new(name))
            .clone()
    }

    /// Remove a name; returns the identity it had
    pub fn remove(&self, name: &str) -> Option<CredentialName> {
        self.names.remove(name).map(|(_, identity)| identity)
    }

    /// Get number of registered names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[async_trait]
impl CredentialNameStore for MemoryCredentialNameStore {
    async fn find_by_name(&self, name: &str) -> StorageResult<Option<CredentialName>> {
        Ok(self.names.get(name).map(|entry| entry.value().clone()))
    }
}

/// In-memory permission grants, unique per (credential, actor)
///
/// Entries are listed in the order their pair was first saved.
#[derive(Debug, Default)]
pub struct MemoryAccessEntryStore {
    entries: DashMap<(Uuid, String), (u64, AccessEntry)>,
    next_sequence: AtomicU64,
}

impl MemoryAccessEntryStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[async_trait]
impl AccessEntryStore for MemoryAccessEntryStore {
    async fn find_all_by_credential(&self, credential_uuid: Uuid) -> StorageResult<Vec<AccessEntry>> {
        let mut found: Vec<(u64, AccessEntry)> = self
            .entries
            .iter()
            .filter(|entry| entry.key().0 == credential_uuid)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|(sequence, _)| *sequence);
        Ok(found.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn find_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<Option<AccessEntry>> {
        Ok(self
            .entries
            .get(&(credential_uuid, actor.to_string()))
            .map(|entry| entry.value().1.clone()))
    }

    async fn save(&self, entry: &AccessEntry) -> StorageResult<()> {
        let key = (entry.credential_uuid(), entry.actor().to_string());
        self.entries
            .entry(key)
            .and_modify(|(_, stored)| stored.merge_flags(entry.flags()))
            .or_insert_with(|| {
                let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
                (sequence, entry.clone())
            });
        Ok(())
    }

    async fn delete_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<()> {
        self.entries.remove(&(credential_uuid, actor.to_string()));
        Ok(())
    }
}

/// In-memory version history
#[derive(Debug, Default)]
pub struct MemoryCredentialVersionStore {
    versions: DashMap<Uuid, CredentialVersion>,
    next_sequence: AtomicU64,
}

impl MemoryCredentialVersionStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of stored versions
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    fn snapshot<F>(&self, mut keep: F) -> Vec<CredentialVersion>
    where
        F: FnMut(&CredentialVersion) -> bool,
    {
        self.versions
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn count<F>(&self, mut keep: F) -> u64
    where
        F: FnMut(&CredentialVersion) -> bool,
    {
        self.versions.iter().filter(|entry| keep(entry.value())).count() as u64
    }
}

#[async_trait]
impl CredentialVersionStore for MemoryCredentialVersionStore {
    async fn save(&self, mut version: CredentialVersion) -> StorageResult<CredentialVersion> {
        // Re-saving an existing version (e.g. after re-encryption) keeps its
        // place in the insertion order.
        version.sequence = match self.versions.get(&version.uuid) {
            Some(existing) => existing.sequence,
            None => self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.versions.insert(version.uuid, version.clone());
        Ok(version)
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> StorageResult<Option<CredentialVersion>> {
        Ok(self.versions.get(&uuid).map(|entry| entry.value().clone()))
    }

    async fn find_latest_non_transitional_certificate_version(
        &self,
        credential_uuid: Uuid,
    ) -> StorageResult<Option<CredentialVersion>> {
        let history = self.snapshot(|v| v.credential_uuid == credential_uuid);
        Ok(select::latest_certificate(&history, false).cloned())
    }

    async fn find_transitional_certificate_version(
        &self,
        credential_uuid: Uuid,
    ) -> StorageResult<Option<CredentialVersion>> {
        let history = self.snapshot(|v| v.credential_uuid == credential_uuid);
        Ok(select::latest_certificate(&history, true).cloned())
    }

    async fn count_not_encrypted_with_key(&self, key: EncryptionKeyId) -> StorageResult<u64> {
        Ok(self.count(|v| v.encryption_key != key))
    }

    async fn count_encrypted_with_any_of(&self, keys: &[EncryptionKeyId]) -> StorageResult<u64> {
        Ok(self.count(|v| keys.contains(&v.encryption_key)))
    }

    async fn count_grouped_by_encryption_key(&self) -> StorageResult<BTreeMap<EncryptionKeyId, u64>> {
        let all = self.snapshot(|_| true);
        Ok(select::count_by_key(&all))
    }

    async fn find_encrypted_with_any_of(
        &self,
        keys: &[EncryptionKeyId],
        page: PageRequest,
    ) -> StorageResult<VersionSlice> {
        let matching = self.snapshot(|v| keys.contains(&v.encryption_key));
        Ok(select::page_by_sequence(matching, page))
    }

    async fn find_latest(&self, credential_uuid: Uuid) -> StorageResult<Option<CredentialVersion>> {
        let history = self.snapshot(|v| v.credential_uuid == credential_uuid);
        Ok(select::latest_matching(&history, |_| true).cloned())
    }

    async fn find_all_by_credential(
        &self,
        credential_uuid: Uuid,
        type_filter: Option<&str>,
    ) -> StorageResult<Vec<CredentialVersion>> {
        let mut history = self.snapshot(|v| {
            v.credential_uuid == credential_uuid
                && type_filter.is_none_or(|kind| v.kind.type_name() == kind)
        });
        select::sort_newest_first(&mut history);
        Ok(history)
    }
}
