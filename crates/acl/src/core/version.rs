//! Versioned credential material
//!
//! Every stored revision of a credential's secret is a [`CredentialVersion`].
//! Only the bookkeeping fields needed for key rotation and certificate
//! selection live here; the encrypted payload belongs to the store.

use crate::core::EncryptionKeyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of versions fetched per page by the rotation workflow
pub const ROTATION_BATCH_SIZE: usize = 50;

/// Credential type of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialKind {
    /// Opaque string value
    Value,
    /// Generated password
    Password,
    /// Username and password pair
    User,
    /// Arbitrary JSON document
    Json,
    /// SSH key pair
    Ssh,
    /// RSA key pair
    Rsa,
    /// X.509 certificate
    Certificate {
        /// Held alongside the active version during a rotation window
        transitional: bool,
    },
}

impl CredentialKind {
    /// Stable type name, used for type-filtered history queries
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Password => "password",
            Self::User => "user",
            Self::Json => "json",
            Self::Ssh => "ssh",
            Self::Rsa => "rsa",
            Self::Certificate { .. } => "certificate",
        }
    }

    /// Rebuild a kind from its stored type name and transitional column
    pub fn from_type_name(name: &str, transitional: Option<bool>) -> Option<Self> {
        Some(match name {
            "value" => Self::Value,
            "password" => Self::Password,
            "user" => Self::User,
            "json" => Self::Json,
            "ssh" => Self::Ssh,
            "rsa" => Self::Rsa,
            "certificate" => Self::Certificate {
                transitional: transitional.unwrap_or(false),
            },
            _ => return None,
        })
    }

    /// `Some(transitional)` for certificates, `None` otherwise
    pub fn transitional(&self) -> Option<bool> {
        match self {
            Self::Certificate { transitional } => Some(*transitional),
            _ => None,
        }
    }
}

/// One stored revision of a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialVersion {
    /// Unique id of this version
    pub uuid: Uuid,
    /// Credential this version belongs to
    pub credential_uuid: Uuid,
    /// Creation time of the version
    pub created_at: DateTime<Utc>,
    /// Key the version's value is encrypted under
    pub encryption_key: EncryptionKeyId,
    /// Credential type
    pub kind: CredentialKind,
    /// Insertion sequence assigned by the store; breaks `created_at` ties
    #[serde(default)]
    pub sequence: u64,
}

impl CredentialVersion {
    /// New version created now; `sequence` is assigned on save
    pub fn new(credential_uuid: Uuid, encryption_key: EncryptionKeyId, kind: CredentialKind) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            credential_uuid,
            created_at: Utc::now(),
            encryption_key,
            kind,
            sequence: 0,
        }
    }

    /// Set the creation time (builder pattern)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Whether this is a certificate version with the given transitional flag
    pub fn is_certificate_with(&self, transitional: bool) -> bool {
        self.kind.transitional() == Some(transitional)
    }
}

/// Zero-based page of a paged query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page index
    pub page: usize,
    /// Items per page
    pub size: usize,
}

impl PageRequest {
    /// Create a page request
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// First page of the given size
    pub fn first(size: usize) -> Self {
        Self::new(0, size)
    }

    /// Request for the following page
    pub fn next(&self) -> Self {
        Self::new(self.page + 1, self.size)
    }

    /// Number of items skipped before this page
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// One page of versions and whether more follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSlice {
    /// Versions on this page
    pub content: Vec<CredentialVersion>,
    /// The request that produced this page
    pub page: PageRequest,
    /// Whether a following page has content
    pub has_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_type_names() {
        assert_eq!(CredentialKind::Password.type_name(), "password");
        assert_eq!(
            CredentialKind::Certificate { transitional: true }.type_name(),
            "certificate"
        );
    }

    #[test]
    fn test_kind_from_type_name() {
        assert_eq!(
            CredentialKind::from_type_name("certificate", Some(true)),
            Some(CredentialKind::Certificate { transitional: true })
        );
        assert_eq!(
            CredentialKind::from_type_name("ssh", None),
            Some(CredentialKind::Ssh)
        );
        assert_eq!(CredentialKind::from_type_name("unknown", None), None);
    }

    #[test]
    fn test_transitional_only_for_certificates() {
        assert_eq!(CredentialKind::Value.transitional(), None);
        assert_eq!(
            CredentialKind::Certificate { transitional: false }.transitional(),
            Some(false)
        );
    }

    #[test]
    fn test_is_certificate_with() {
        let cert = CredentialVersion::new(
            Uuid::new_v4(),
            EncryptionKeyId::new(),
            CredentialKind::Certificate { transitional: true },
        );
        assert!(cert.is_certificate_with(true));
        assert!(!cert.is_certificate_with(false));

        let password = CredentialVersion::new(
            Uuid::new_v4(),
            EncryptionKeyId::new(),
            CredentialKind::Password,
        );
        assert!(!password.is_certificate_with(true));
        assert!(!password.is_certificate_with(false));
    }

    #[test]
    fn test_page_request_offsets() {
        let first = PageRequest::first(ROTATION_BATCH_SIZE);
        assert_eq!(first.offset(), 0);
        assert_eq!(first.next().offset(), 50);
        assert_eq!(first.next().next(), PageRequest::new(2, 50));
    }

    #[test]
    fn test_kind_serde_shape() {
        let json = serde_json::to_value(CredentialKind::Certificate { transitional: true }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "certificate", "transitional": true})
        );
    }
}
