//! Integration tests for the ACL engine
//!
//! Covers grant accumulation, deny-by-default, deletion, isolation between
//! actors and credentials, partial batch failure, concurrent grants and
//! grants racing deletes.

mod common;

use common::{grant, setup, setup_failing, setup_pausing};
use credgate_acl::AccessControlOperation::*;
use credgate_acl::MemoryStores;
use credgate_acl::prelude::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn test_round_trip_alice_db_password() {
    // GIVEN: A registered credential and no entries
    let (acl, stores) = setup();
    let credential = stores.names.create("/db/password");

    // WHEN: alice is granted read and write_acl
    grant(&acl, &credential, "alice", vec![Read, WriteAcl]).await;

    // THEN: The ACL lists exactly that entry
    let list = acl.data().get_access_control_list(&credential).await.unwrap();
    assert_eq!(list, vec![AccessControlEntry::new("alice", vec![Read, WriteAcl])]);

    // AND: Capability checks agree
    let data = acl.data();
    assert!(data.has_read_permission("alice", "/db/password").await.unwrap());
    assert!(data.has_acl_write_permission("alice", "/db/password").await.unwrap());
    assert!(!data.has_credential_write_permission("alice", "/db/password").await.unwrap());
    assert!(!data.has_credential_delete_permission("alice", "/db/password").await.unwrap());
    assert!(!data.has_read_acl_permission("alice", "/db/password").await.unwrap());
}

#[tokio::test]
async fn test_upsert_is_monotone() {
    let (acl, stores) = setup();
    let credential = stores.names.create("/db/password");

    grant(&acl, &credential, "alice", vec![Read, Write, Delete]).await;
    // A later save naming fewer operations does not revoke anything
    grant(&acl, &credential, "alice", vec![Read]).await;
    grant(&acl, &credential, "alice", vec![ReadAcl]).await;

    let ops = acl
        .data()
        .get_allowed_operations("/db/password", "alice")
        .await
        .unwrap();
    assert_eq!(ops, vec![Read, Write, Delete, ReadAcl]);
    assert_eq!(stores.entries.len(), 1);
}

#[tokio::test]
async fn test_absence_implies_deny() {
    let (acl, stores) = setup();
    stores.names.create("/db/password");

    for op in AccessControlOperation::ALL {
        assert!(
            !acl.data()
                .has_permission("alice", "/db/password", op)
                .await
                .unwrap(),
            "{op} granted without an entry"
        );
    }
    assert!(
        acl.data()
            .get_allowed_operations("/db/password", "alice")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    // GIVEN: alice holds read
    let (acl, stores) = setup();
    let credential = stores.names.create("/db/password");
    grant(&acl, &credential, "alice", vec![Read]).await;

    // WHEN: The entry is deleted twice
    acl.data()
        .delete_access_control_entry("/db/password", "alice")
        .await
        .unwrap();
    acl.data()
        .delete_access_control_entry("/db/password", "alice")
        .await
        .unwrap();

    // THEN: alice holds nothing and the list is empty
    assert!(!acl.data().has_read_permission("alice", "/db/password").await.unwrap());
    assert!(acl.data().get_access_control_list(&credential).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_then_regrant_starts_from_zero() {
    let (acl, stores) = setup();
    let credential = stores.names.create("/db/password");
    grant(&acl, &credential, "alice", vec![Read, Write]).await;

    acl.data()
        .delete_access_control_entry("/db/password", "alice")
        .await
        .unwrap();
    grant(&acl, &credential, "alice", vec![Delete]).await;

    let ops = acl
        .data()
        .get_allowed_operations("/db/password", "alice")
        .await
        .unwrap();
    assert_eq!(ops, vec![Delete]);
}

#[tokio::test]
async fn test_actors_and_credentials_do_not_interfere() {
    let (acl, stores) = setup();
    let db = stores.names.create("/db/password");
    let api = stores.names.create("/api/token");

    grant(&acl, &db, "alice", vec![Read]).await;
    grant(&acl, &db, "bob", vec![Write]).await;
    grant(&acl, &api, "alice", vec![Delete]).await;

    let data = acl.data();
    assert_eq!(data.get_allowed_operations("/db/password", "alice").await.unwrap(), vec![Read]);
    assert_eq!(data.get_allowed_operations("/db/password", "bob").await.unwrap(), vec![Write]);
    assert_eq!(data.get_allowed_operations("/api/token", "alice").await.unwrap(), vec![Delete]);
    assert!(data.get_allowed_operations("/api/token", "bob").await.unwrap().is_empty());

    // Deleting bob on one credential leaves alice and the other credential alone
    data.delete_access_control_entry("/db/password", "bob")
        .await
        .unwrap();
    assert_eq!(data.get_allowed_operations("/db/password", "alice").await.unwrap(), vec![Read]);
    assert_eq!(data.get_access_control_list(&api).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_keeps_first_grant_order() {
    let (acl, stores) = setup();
    let credential = stores.names.create("/db/password");

    acl.data()
        .save_access_control_entries(
            &credential,
            &[
                AccessControlEntry::new("carol", vec![Read]),
                AccessControlEntry::new("alice", vec![Write]),
                AccessControlEntry::new("bob", vec![Delete]),
            ],
        )
        .await
        .unwrap();

    let actors: Vec<String> = acl
        .data()
        .get_access_control_list(&credential)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.actor)
        .collect();
    assert_eq!(actors, vec!["carol", "alice", "bob"]);
}

#[tokio::test]
async fn test_mid_batch_failure_keeps_earlier_items() {
    // GIVEN: A store that accepts two saves, then fails
    let (acl, names, entries) = setup_failing(2);
    let credential = names.create("/db/password");

    // WHEN: A batch of three grants is saved
    let err = acl
        .data()
        .save_access_control_entries(
            &credential,
            &[
                AccessControlEntry::new("alice", vec![Read]),
                AccessControlEntry::new("bob", vec![Write]),
                AccessControlEntry::new("carol", vec![Delete]),
            ],
        )
        .await
        .unwrap_err();

    // THEN: The storage error propagates and nothing is rolled back
    assert!(matches!(err, AclError::Storage { .. }));
    assert_eq!(entries.attempts(), 3);

    let list = acl.data().get_access_control_list(&credential).await.unwrap();
    assert_eq!(
        list,
        vec![
            AccessControlEntry::new("alice", vec![Read]),
            AccessControlEntry::new("bob", vec![Write]),
        ]
    );
}

async fn grant_every_operation_concurrently(acl: AccessControl, stores: MemoryStores) {
    // GIVEN: One credential and many tasks granting alice different operations
    let credential = stores.names.create("/db/password");
    let acl = Arc::new(acl);

    let mut tasks = Vec::new();
    for round in 0..20 {
        for op in AccessControlOperation::ALL {
            let acl = Arc::clone(&acl);
            let credential = credential.clone();
            tasks.push(tokio::spawn(async move {
                acl.data()
                    .save_access_control_entries(
                        &credential,
                        &[AccessControlEntry::new("alice", vec![op])],
                    )
                    .await
                    .map(|()| round)
            }));
        }
    }

    // WHEN: All tasks finish
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // THEN: Every operation survived the interleaving
    let ops = acl
        .data()
        .get_allowed_operations("/db/password", "alice")
        .await
        .unwrap();
    assert_eq!(ops, AccessControlOperation::ALL.to_vec());
    assert_eq!(stores.entries.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_grants_are_not_lost() {
    let (acl, stores) = setup();
    grant_every_operation_concurrently(acl, stores).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_grants_are_not_lost_without_entry_locks() {
    let config = AclConfig {
        serialize_upserts: false,
        ..AclConfig::default()
    };
    let (acl, stores) = AccessControl::in_memory(config).unwrap();
    grant_every_operation_concurrently(acl, stores).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_waits_for_in_flight_grant() {
    // GIVEN: bob holds write_acl and a grant of read is stuck inside the store
    let (acl, names, entries) = setup_pausing(AclConfig::default());
    let credential = names.create("/db/password");
    grant(&acl, &credential, "bob", vec![WriteAcl]).await;

    entries.pause_next_save();
    let acl = Arc::new(acl);
    let granting = {
        let acl = Arc::clone(&acl);
        let credential = credential.clone();
        tokio::spawn(async move {
            acl.data()
                .save_access_control_entries(
                    &credential,
                    &[AccessControlEntry::new("bob", vec![Read])],
                )
                .await
        })
    };
    entries.wait_until_paused().await;

    // WHEN: bob's entry is deleted while the grant is in flight
    let deleting = {
        let acl = Arc::clone(&acl);
        tokio::spawn(async move {
            acl.data()
                .delete_access_control_entry("/db/password", "bob")
                .await
        })
    };
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!deleting.is_finished());

    entries.resume();
    granting.await.unwrap().unwrap();
    deleting.await.unwrap().unwrap();

    // THEN: The delete ran after the grant and removed the whole entry
    let ops = acl
        .data()
        .get_allowed_operations("/db/password", "bob")
        .await
        .unwrap();
    assert!(ops.is_empty());
    assert!(entries.inner.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_grant_racing_delete_does_not_restore_revoked_flags() {
    // GIVEN: Entry locks are off, bob holds write_acl and a grant of read is
    // stuck inside the store
    let config = AclConfig {
        serialize_upserts: false,
        ..AclConfig::default()
    };
    let (acl, names, entries) = setup_pausing(config);
    let credential = names.create("/db/password");
    grant(&acl, &credential, "bob", vec![WriteAcl]).await;

    entries.pause_next_save();
    let acl = Arc::new(acl);
    let granting = {
        let acl = Arc::clone(&acl);
        let credential = credential.clone();
        tokio::spawn(async move {
            acl.data()
                .save_access_control_entries(
                    &credential,
                    &[AccessControlEntry::new("bob", vec![Read])],
                )
                .await
        })
    };
    entries.wait_until_paused().await;

    // WHEN: bob's entry is deleted before the grant reaches the store
    acl.data()
        .delete_access_control_entry("/db/password", "bob")
        .await
        .unwrap();
    entries.resume();
    granting.await.unwrap().unwrap();

    // THEN: Only the new grant is stored; write_acl stays revoked
    let ops = acl
        .data()
        .get_allowed_operations("/db/password", "bob")
        .await
        .unwrap();
    assert_eq!(ops, vec![Read]);
}
