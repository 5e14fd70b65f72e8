//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use credgate_acl::core::{AccessEntry, StorageError, StorageResult};
use credgate_acl::prelude::*;
use credgate_acl::MemoryStores;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;
use uuid::Uuid;

/// In-memory wiring with default configuration
pub fn setup() -> (AccessControl, MemoryStores) {
    AccessControl::in_memory(AclConfig::default()).unwrap()
}

/// Grant operations directly through the engine, bypassing authorization
pub async fn grant(
    acl: &AccessControl,
    credential: &CredentialName,
    actor: &str,
    operations: Vec<AccessControlOperation>,
) {
    acl.data()
        .save_access_control_entries(credential, &[AccessControlEntry::new(actor, operations)])
        .await
        .unwrap();
}

/// Access entry store whose `save` fails once a budget of saves is spent
pub struct FailingEntryStore {
    inner: MemoryAccessEntryStore,
    saves_before_failure: usize,
    saves: AtomicUsize,
}

impl FailingEntryStore {
    /// Allow `saves_before_failure` successful saves, then fail every save
    pub fn new(saves_before_failure: usize) -> Self {
        Self {
            inner: MemoryAccessEntryStore::new(),
            saves_before_failure,
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of save attempts seen so far
    pub fn attempts(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessEntryStore for FailingEntryStore {
    async fn find_all_by_credential(&self, credential_uuid: Uuid) -> StorageResult<Vec<AccessEntry>> {
        self.inner.find_all_by_credential(credential_uuid).await
    }

    async fn find_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<Option<AccessEntry>> {
        self.inner
            .find_by_credential_and_actor(credential_uuid, actor)
            .await
    }

    async fn save(&self, entry: &AccessEntry) -> StorageResult<()> {
        let attempt = self.saves.fetch_add(1, Ordering::SeqCst);
        if attempt >= self.saves_before_failure {
            return Err(StorageError::backend("save", "injected failure"));
        }
        self.inner.save(entry).await
    }

    async fn delete_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<()> {
        self.inner
            .delete_by_credential_and_actor(credential_uuid, actor)
            .await
    }
}

/// Wiring over a failing entry store; returns the name store for setup
pub fn setup_failing(
    saves_before_failure: usize,
) -> (AccessControl, Arc<MemoryCredentialNameStore>, Arc<FailingEntryStore>) {
    let names = Arc::new(MemoryCredentialNameStore::new());
    let entries = Arc::new(FailingEntryStore::new(saves_before_failure));
    let acl = AccessControl::builder()
        .with_names(names.clone())
        .with_entries(entries.clone())
        .with_versions(Arc::new(MemoryCredentialVersionStore::new()))
        .build()
        .unwrap();
    (acl, names, entries)
}

/// Access entry store that can hold the next `save` until released
#[derive(Default)]
pub struct PausingEntryStore {
    /// Backing store
    pub inner: MemoryAccessEntryStore,
    armed: AtomicBool,
    entered: Notify,
    resume: Notify,
}

impl PausingEntryStore {
    /// Make the next `save` wait for [`Self::resume`]
    pub fn pause_next_save(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Wait until a paused `save` has started
    pub async fn wait_until_paused(&self) {
        self.entered.notified().await;
    }

    /// Let the paused `save` continue
    pub fn resume(&self) {
        self.resume.notify_one();
    }
}

#[async_trait]
impl AccessEntryStore for PausingEntryStore {
    async fn find_all_by_credential(&self, credential_uuid: Uuid) -> StorageResult<Vec<AccessEntry>> {
        self.inner.find_all_by_credential(credential_uuid).await
    }

    async fn find_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<Option<AccessEntry>> {
        self.inner
            .find_by_credential_and_actor(credential_uuid, actor)
            .await
    }

    async fn save(&self, entry: &AccessEntry) -> StorageResult<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.resume.notified().await;
        }
        self.inner.save(entry).await
    }

    async fn delete_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<()> {
        self.inner
            .delete_by_credential_and_actor(credential_uuid, actor)
            .await
    }
}

/// Wiring over a pausing entry store
pub fn setup_pausing(
    config: AclConfig,
) -> (AccessControl, Arc<MemoryCredentialNameStore>, Arc<PausingEntryStore>) {
    let names = Arc::new(MemoryCredentialNameStore::new());
    let entries = Arc::new(PausingEntryStore::default());
    let acl = AccessControl::builder()
        .with_names(names.clone())
        .with_entries(entries.clone())
        .with_versions(Arc::new(MemoryCredentialVersionStore::new()))
        .with_config(config)
        .build()
        .unwrap();
    (acl, names, entries)
}
