//! PostgreSQL-backed stores
//!
//! This module is only available with the `storage-postgres` feature.
//!
//! One [`PostgresStore`] implements all three repository traits over the
//! tables created by `migrations/0001_access_control.sql`. Access-entry
//! upserts OR the capability columns inside a single `INSERT .. ON
//! CONFLICT`, so concurrent grants for one pair cannot lose each other. The
//! engine binds only the flags being granted, so a row deleted in between is
//! re-created with those flags alone.

#![cfg(feature = "storage-postgres")]

use crate::core::{
    AccessEntry, CredentialKind, CredentialName, CredentialVersion, EncryptionKeyId, PageRequest,
    PermissionFlags, StorageError, StorageResult, VersionSlice,
};
use crate::traits::{AccessEntryStore, CredentialNameStore, CredentialVersionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

const SCHEMA_TEMPLATE: &str = include_str!("../../migrations/0001_access_control.sql");

const VERSION_COLUMNS: &str =
    "uuid, credential_uuid, version_created_at, encryption_key_uuid, type, transitional, sequence";

/// Configuration for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Schema holding the access-control tables
    pub schema: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
        }
    }
}

/// PostgreSQL implementation of the name, access-entry and version stores
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Create new store
    pub fn new(pool: PgPool, config: PostgresConfig) -> Arc<Self> {
        Arc::new(Self { pool, config })
    }

    /// Create with defaults
    pub fn with_pool(pool: PgPool) -> Arc<Self> {
        Self::new(pool, PostgresConfig::default())
    }

    /// Create the tables and indexes if they do not exist yet
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        let ddl = SCHEMA_TEMPLATE.replace("{schema}", &self.config.schema);
        sqlx::raw_sql(&ddl)
            .execute(&self.pool)
            .await
            .map_err(backend("ensure_schema"))?;
        Ok(())
    }

    fn table(&self, name: &str) -> String {
        format!("{}.{}", self.config.schema, name)
    }

    async fn fetch_versions(
        &self,
        operation: &'static str,
        filter: &str,
        limit: &str,
        credential_uuid: Uuid,
    ) -> StorageResult<Vec<CredentialVersion>> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM {} WHERE credential_uuid = $1 {filter} \
             ORDER BY version_created_at DESC, sequence DESC {limit}",
            self.table("credential_version")
        );
        let rows = sqlx::query(&query)
            .bind(credential_uuid)
            .fetch_all(&self.pool)
            .await
            .map_err(backend(operation))?;
        rows.iter().map(version_from_row).collect()
    }

    async fn fetch_count(&self, operation: &'static str, query: &str, keys: Vec<Uuid>) -> StorageResult<u64> {
        let row = sqlx::query(query)
            .bind(keys)
            .fetch_one(&self.pool)
            .await
            .map_err(backend(operation))?;
        let count: i64 = row.try_get("count").map_err(backend(operation))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn backend(operation: &'static str) -> impl Fn(sqlx::Error) -> StorageError {
    move |e| {
        let unique_violation = e
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == "23505");
        if unique_violation {
            StorageError::Conflict {
                reason: e.to_string(),
            }
        } else {
            StorageError::backend(operation, e.to_string())
        }
    }
}

fn entry_from_row(row: &PgRow) -> StorageResult<AccessEntry> {
    let decode = backend("decode_access_entry");
    let column = |name: &str| -> StorageResult<bool> { row.try_get(name).map_err(&decode) };

    let mut flags = PermissionFlags::empty();
    flags.set(PermissionFlags::READ, column("read_permission")?);
    flags.set(PermissionFlags::WRITE, column("write_permission")?);
    flags.set(PermissionFlags::DELETE, column("delete_permission")?);
    flags.set(PermissionFlags::READ_ACL, column("read_acl_permission")?);
    flags.set(PermissionFlags::WRITE_ACL, column("write_acl_permission")?);

    let credential_uuid: Uuid = row.try_get("credential_name_uuid").map_err(&decode)?;
    let actor: String = row.try_get("actor").map_err(&decode)?;
    Ok(AccessEntry::with_flags(credential_uuid, actor, flags))
}

fn version_from_row(row: &PgRow) -> StorageResult<CredentialVersion> {
    let decode = backend("decode_credential_version");
    let type_name: String = row.try_get("type").map_err(&decode)?;
    let transitional: Option<bool> = row.try_get("transitional").map_err(&decode)?;
    let kind = CredentialKind::from_type_name(&type_name, transitional).ok_or_else(|| {
        StorageError::backend(
            "decode_credential_version",
            format!("unknown credential type '{type_name}'"),
        )
    })?;
    let encryption_key: Uuid = row.try_get("encryption_key_uuid").map_err(&decode)?;
    let created_at: DateTime<Utc> = row.try_get("version_created_at").map_err(&decode)?;
    let sequence: i64 = row.try_get("sequence").map_err(&decode)?;

    Ok(CredentialVersion {
        uuid: row.try_get("uuid").map_err(&decode)?,
        credential_uuid: row.try_get("credential_uuid").map_err(&decode)?,
        created_at,
        encryption_key: EncryptionKeyId::from(encryption_key),
        kind,
        sequence: u64::try_from(sequence).unwrap_or(0),
    })
}

fn key_uuids(keys: &[EncryptionKeyId]) -> Vec<Uuid> {
    keys.iter().map(EncryptionKeyId::as_uuid).collect()
}

#[async_trait]
impl CredentialNameStore for PostgresStore {
    async fn find_by_name(&self, name: &str) -> StorageResult<Option<CredentialName>> {
        let query = format!(
            "SELECT uuid, name FROM {} WHERE name = $1",
            self.table("credential_name")
        );
        let row = sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend("find_by_name"))?;

        row.map(|row| -> StorageResult<CredentialName> {
            let uuid: Uuid = row.try_get("uuid").map_err(backend("find_by_name"))?;
            let name: String = row.try_get("name").map_err(backend("find_by_name"))?;
            Ok(CredentialName::with_uuid(uuid, name))
        })
        .transpose()
    }
}

#[async_trait]
impl AccessEntryStore for PostgresStore {
    async fn find_all_by_credential(&self, credential_uuid: Uuid) -> StorageResult<Vec<AccessEntry>> {
        let query = format!(
            "SELECT * FROM {} WHERE credential_name_uuid = $1 ORDER BY id",
            self.table("access_entry")
        );
        let rows = sqlx::query(&query)
            .bind(credential_uuid)
            .fetch_all(&self.pool)
            .await
            .map_err(backend("find_all_by_credential"))?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn find_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<Option<AccessEntry>> {
        let query = format!(
            "SELECT * FROM {} WHERE credential_name_uuid = $1 AND actor = $2",
            self.table("access_entry")
        );
        let row = sqlx::query(&query)
            .bind(credential_uuid)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend("find_by_credential_and_actor"))?;
        row.as_ref().map(entry_from_row).transpose()
    }

    async fn save(&self, entry: &AccessEntry) -> StorageResult<()> {
        let query = format!(
            "INSERT INTO {} AS e (credential_name_uuid, actor, read_permission, write_permission, \
             delete_permission, read_acl_permission, write_acl_permission) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (credential_name_uuid, actor) DO UPDATE SET \
             read_permission = e.read_permission OR EXCLUDED.read_permission, \
             write_permission = e.write_permission OR EXCLUDED.write_permission, \
             delete_permission = e.delete_permission OR EXCLUDED.delete_permission, \
             read_acl_permission = e.read_acl_permission OR EXCLUDED.read_acl_permission, \
             write_acl_permission = e.write_acl_permission OR EXCLUDED.write_acl_permission",
            self.table("access_entry")
        );
        let flags = entry.flags();
        sqlx::query(&query)
            .bind(entry.credential_uuid())
            .bind(entry.actor())
            .bind(flags.contains(PermissionFlags::READ))
            .bind(flags.contains(PermissionFlags::WRITE))
            .bind(flags.contains(PermissionFlags::DELETE))
            .bind(flags.contains(PermissionFlags::READ_ACL))
            .bind(flags.contains(PermissionFlags::WRITE_ACL))
            .execute(&self.pool)
            .await
            .map_err(backend("save_access_entry"))?;
        Ok(())
    }

    async fn delete_by_credential_and_actor(
        &self,
        credential_uuid: Uuid,
        actor: &str,
    ) -> StorageResult<()> {
        let query = format!(
            "DELETE FROM {} WHERE credential_name_uuid = $1 AND actor = $2",
            self.table("access_entry")
        );
        sqlx::query(&query)
            .bind(credential_uuid)
            .bind(actor)
            .execute(&self.pool)
            .await
            .map_err(backend("delete_access_entry"))?;
        Ok(())
    }
}

#[async_trait]
impl CredentialVersionStore for PostgresStore {
    async fn save(&self, version: CredentialVersion) -> StorageResult<CredentialVersion> {
        let query = format!(
            "INSERT INTO {} (uuid, credential_uuid, version_created_at, encryption_key_uuid, type, transitional) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (uuid) DO UPDATE SET \
             encryption_key_uuid = EXCLUDED.encryption_key_uuid, \
             transitional = EXCLUDED.transitional \
             RETURNING {VERSION_COLUMNS}",
            self.table("credential_version")
        );
        let row = sqlx::query(&query)
            .bind(version.uuid)
            .bind(version.credential_uuid)
            .bind(version.created_at)
            .bind(version.encryption_key.as_uuid())
            .bind(version.kind.type_name())
            .bind(version.kind.transitional())
            .fetch_one(&self.pool)
            .await
            .map_err(backend("save_credential_version"))?;
        version_from_row(&row)
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> StorageResult<Option<CredentialVersion>> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM {} WHERE uuid = $1",
            self.table("credential_version")
        );
        let row = sqlx::query(&query)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend("find_by_uuid"))?;
        row.as_ref().map(version_from_row).transpose()
    }

    async fn find_latest_non_transitional_certificate_version(
        &self,
        credential_uuid: Uuid,
    ) -> StorageResult<Option<CredentialVersion>> {
        let versions = self
            .fetch_versions(
                "find_latest_non_transitional_certificate_version",
                "AND type = 'certificate' AND transitional = false",
                "LIMIT 1",
                credential_uuid,
            )
            .await?;
        Ok(versions.into_iter().next())
    }

    async fn find_transitional_certificate_version(
        &self,
        credential_uuid: Uuid,
    ) -> StorageResult<Option<CredentialVersion>> {
        let versions = self
            .fetch_versions(
                "find_transitional_certificate_version",
                "AND type = 'certificate' AND transitional = true",
                "LIMIT 1",
                credential_uuid,
            )
            .await?;
        Ok(versions.into_iter().next())
    }

    async fn count_not_encrypted_with_key(&self, key: EncryptionKeyId) -> StorageResult<u64> {
        let query = format!(
            "SELECT COUNT(*) AS count FROM {} WHERE NOT (encryption_key_uuid = ANY($1))",
            self.table("credential_version")
        );
        self.fetch_count("count_not_encrypted_with_key", &query, vec![key.as_uuid()])
            .await
    }

    async fn count_encrypted_with_any_of(&self, keys: &[EncryptionKeyId]) -> StorageResult<u64> {
        let query = format!(
            "SELECT COUNT(*) AS count FROM {} WHERE encryption_key_uuid = ANY($1)",
            self.table("credential_version")
        );
        self.fetch_count("count_encrypted_with_any_of", &query, key_uuids(keys))
            .await
    }

    async fn count_grouped_by_encryption_key(&self) -> StorageResult<BTreeMap<EncryptionKeyId, u64>> {
        let query = format!(
            "SELECT encryption_key_uuid, COUNT(*) AS count FROM {} GROUP BY encryption_key_uuid",
            self.table("credential_version")
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(backend("count_grouped_by_encryption_key"))?;

        let mut counts = BTreeMap::new();
        for row in &rows {
            let key: Uuid = row
                .try_get("encryption_key_uuid")
                .map_err(backend("count_grouped_by_encryption_key"))?;
            let count: i64 = row
                .try_get("count")
                .map_err(backend("count_grouped_by_encryption_key"))?;
            counts.insert(EncryptionKeyId::from(key), u64::try_from(count).unwrap_or(0));
        }
        Ok(counts)
    }

    async fn find_encrypted_with_any_of(
        &self,
        keys: &[EncryptionKeyId],
        page: PageRequest,
    ) -> StorageResult<VersionSlice> {
        // One extra row tells whether a following page exists
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM {} WHERE encryption_key_uuid = ANY($1) \
             ORDER BY sequence LIMIT $2 OFFSET $3",
            self.table("credential_version")
        );
        let limit = i64::try_from(page.size.saturating_add(1)).unwrap_or(i64::MAX);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let rows = sqlx::query(&query)
            .bind(key_uuids(keys))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(backend("find_encrypted_with_any_of"))?;

        let mut content = rows
            .iter()
            .map(version_from_row)
            .collect::<StorageResult<Vec<_>>>()?;
        let has_next = content.len() > page.size;
        content.truncate(page.size);

        Ok(VersionSlice {
            content,
            page,
            has_next,
        })
    }

    async fn find_latest(&self, credential_uuid: Uuid) -> StorageResult<Option<CredentialVersion>> {
        let versions = self
            .fetch_versions("find_latest", "", "LIMIT 1", credential_uuid)
            .await?;
        Ok(versions.into_iter().next())
    }

    async fn find_all_by_credential(
        &self,
        credential_uuid: Uuid,
        type_filter: Option<&str>,
    ) -> StorageResult<Vec<CredentialVersion>> {
        let versions = self
            .fetch_versions("find_all_by_credential", "", "", credential_uuid)
            .await?;
        Ok(match type_filter {
            Some(kind) => versions
                .into_iter()
                .filter(|v| v.kind.type_name() == kind)
                .collect(),
            None => versions,
        })
    }
}
