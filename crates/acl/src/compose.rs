//! Composition root
//!
//! [`AccessControlBuilder`] wires stores into the engine, permission service,
//! handler and rotation queries. Every component takes its collaborators as
//! `Arc<dyn Trait>`; there is no container or global state.
//!
//! ```
//! use credgate_acl::{AccessControl, AclConfig, CallerContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (acl, stores) = AccessControl::in_memory(AclConfig::default())?;
//! stores.names.create("/db/password");
//!
//! let caller = CallerContext::new("alice");
//! let err = acl
//!     .handler()
//!     .get_access_control_list(&caller, "/db/password")
//!     .await
//!     .unwrap_err();
//! assert!(err.is_not_found());
//! # Ok(())
//! # }
//! ```

use crate::config::AclConfig;
use crate::core::ConfigError;
use crate::service::{AccessControlDataService, AccessControlHandler, PermissionService};
use crate::storage::{MemoryAccessEntryStore, MemoryCredentialNameStore, MemoryCredentialVersionStore};
use crate::traits::{AccessEntryStore, CredentialNameStore, CredentialVersionStore};
use crate::version::KeyRotationQueries;
use std::sync::Arc;
use tracing::info;

/// Fully wired access-control components
#[derive(Clone)]
pub struct AccessControl {
    data: AccessControlDataService,
    permissions: PermissionService,
    handler: AccessControlHandler,
    rotation: KeyRotationQueries,
    config: AclConfig,
}

/// Handles to the stores behind [`AccessControl::in_memory`]
#[derive(Clone)]
pub struct MemoryStores {
    /// Name registry; use `create` to register credentials
    pub names: Arc<MemoryCredentialNameStore>,
    /// Access entries
    pub entries: Arc<MemoryAccessEntryStore>,
    /// Version history
    pub versions: Arc<MemoryCredentialVersionStore>,
}

impl AccessControl {
    /// Create builder
    pub fn builder() -> AccessControlBuilder {
        AccessControlBuilder::new()
    }

    /// Wire everything over fresh in-memory stores
    pub fn in_memory(config: AclConfig) -> Result<(Self, MemoryStores), ConfigError> {
        let stores = MemoryStores {
            names: Arc::new(MemoryCredentialNameStore::new()),
            entries: Arc::new(MemoryAccessEntryStore::new()),
            versions: Arc::new(MemoryCredentialVersionStore::new()),
        };
        let access_control = Self::builder()
            .with_names(stores.names.clone())
            .with_entries(stores.entries.clone())
            .with_versions(stores.versions.clone())
            .with_config(config)
            .build()?;
        Ok((access_control, stores))
    }

    /// ACL engine
    pub fn data(&self) -> &AccessControlDataService {
        &self.data
    }

    /// Caller capability checks
    pub fn permissions(&self) -> &PermissionService {
        &self.permissions
    }

    /// ACL request handler
    pub fn handler(&self) -> &AccessControlHandler {
        &self.handler
    }

    /// Key rotation queries
    pub fn rotation(&self) -> &KeyRotationQueries {
        &self.rotation
    }

    /// Configuration the components were built with
    pub fn config(&self) -> &AclConfig {
        &self.config
    }
}

/// Builder for [`AccessControl`]
#[derive(Default)]
pub struct AccessControlBuilder {
    names: Option<Arc<dyn CredentialNameStore>>,
    entries: Option<Arc<dyn AccessEntryStore>>,
    versions: Option<Arc<dyn CredentialVersionStore>>,
    config: Option<AclConfig>,
}

impl AccessControlBuilder {
    /// Create empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the credential name store (required)
    pub fn with_names(mut self, names: Arc<dyn CredentialNameStore>) -> Self {
        self.names = Some(names);
        self
    }

    /// Set the access entry store (required)
    pub fn with_entries(mut self, entries: Arc<dyn AccessEntryStore>) -> Self {
        self.entries = Some(entries);
        self
    }

    /// Set the version store (required)
    pub fn with_versions(mut self, versions: Arc<dyn CredentialVersionStore>) -> Self {
        self.versions = Some(versions);
        self
    }

    /// Set configuration (optional, defaults apply otherwise)
    pub fn with_config(mut self, config: AclConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate configuration and wire the components
    ///
    /// # Errors
    ///
    /// - `MissingRequired` if a store was not set
    /// - `InvalidValue` if the configuration does not validate
    pub fn build(self) -> Result<AccessControl, ConfigError> {
        let names = self.names.ok_or_else(|| missing("names"))?;
        let entries = self.entries.ok_or_else(|| missing("entries"))?;
        let versions = self.versions.ok_or_else(|| missing("versions"))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let data = if config.serialize_upserts {
            AccessControlDataService::new(Arc::clone(&names), entries)
        } else {
            AccessControlDataService::without_entry_locks(Arc::clone(&names), entries)
        };
        let permissions = PermissionService::new(data.clone());
        let handler = AccessControlHandler::new(permissions.clone(), data.clone(), names);
        let rotation = KeyRotationQueries::new(versions, config.rotation_batch_size);

        info!(
            serialize_upserts = config.serialize_upserts,
            rotation_batch_size = config.rotation_batch_size,
            "Access control initialized"
        );

        Ok(AccessControl {
            data,
            permissions,
            handler,
            rotation,
            config,
        })
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingRequired {
        field: field.to_string(),
    }
}
