//! Classified resources protected by clearance checks.

use serde::{Deserialize, Serialize};

use super::label::SecurityLabel;
use super::user::UserId;

/// Target type used for stored files.
pub const FILE_TARGET: &str = "file";

/// A resource carrying a classification label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedResource {
    /// Kind of resource (e.g. `file`), used as the audit target type.
    pub target_type: String,

    /// Identifier within the target type.
    pub id: String,

    /// Minimum clearance required to access the resource.
    #[serde(default)]
    pub classification: SecurityLabel,

    /// Display name (original filename for files).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Owning user, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
}

impl ProtectedResource {
    /// Creates a resource with the given classification.
    #[must_use]
    pub fn new(
        target_type: impl Into<String>,
        id: impl Into<String>,
        classification: impl Into<SecurityLabel>,
    ) -> Self {
        Self {
            target_type: target_type.into(),
            id: id.into(),
            classification: classification.into(),
            name: None,
            owner_id: None,
        }
    }

    /// Creates a file resource.
    #[must_use]
    pub fn file(id: impl Into<String>, classification: impl Into<SecurityLabel>) -> Self {
        Self::new(FILE_TARGET, id, classification)
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<UserId>) -> Self {
        self.owner_id = Some(owner.into());
        self
    }
}
