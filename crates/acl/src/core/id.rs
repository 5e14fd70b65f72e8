//! Identifiers shared across the access-control model
//!
//! [`CredentialName`] is the resolved identity of a credential. It is owned
//! by the name store; access entries and versions refer to it by uuid only.

use crate::core::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for actor identifiers (prevents DoS attacks)
const MAX_ACTOR_LENGTH: usize = 255;

/// Resolved credential identity
///
/// # Examples
///
/// ```
/// use credgate_acl::core::CredentialName;
///
/// let name = CredentialName::new("/db/password");
/// assert_eq!(name.name(), "/db/password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialName {
    uuid: Uuid,
    name: String,
}

impl CredentialName {
    /// Create an identity with a fresh uuid
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_uuid(Uuid::new_v4(), name)
    }

    /// Rebuild an identity loaded from storage
    pub fn with_uuid(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
        }
    }

    /// Stable unique identifier
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CredentialName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Identifier of an encryption key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptionKeyId(Uuid);

impl EncryptionKeyId {
    /// Generate a new random key id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying uuid
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EncryptionKeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EncryptionKeyId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for EncryptionKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate an actor identifier
///
/// Actors are opaque, so only the shape is checked: non-empty, at most 255
/// bytes, no control characters.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyActor`] or
/// [`ValidationError::InvalidActor`].
pub fn validate_actor(actor: &str) -> Result<(), ValidationError> {
    if actor.is_empty() {
        return Err(ValidationError::EmptyActor);
    }

    if actor.len() > MAX_ACTOR_LENGTH {
        return Err(ValidationError::InvalidActor {
            actor: actor.to_string(),
            reason: format!("exceeds maximum length of {MAX_ACTOR_LENGTH} characters"),
        });
    }

    if actor.chars().any(char::is_control) {
        return Err(ValidationError::InvalidActor {
            actor: actor.to_string(),
            reason: "contains control characters".to_string(),
        });
    }

    Ok(())
}
