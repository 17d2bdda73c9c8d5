//! Subject (user) records.
//!
//! Users are owned by the directory store. This crate only reads them;
//! role membership changes go through [`crate::storage::RoleAssignment`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::label::SecurityLabel;

/// Default datetime value for deserialization when field is missing.
fn default_datetime() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

fn default_active() -> bool {
    true
}

// =============================================================================
// User Id
// =============================================================================

/// Opaque user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// =============================================================================
// User Type
// =============================================================================

/// A subject known to the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,

    /// Login name, used for display and logging only.
    pub username: String,

    /// Whether the account is active.
    ///
    /// Inactive users have no valid session regardless of roles or clearance.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Highest classification this user may access.
    #[serde(default)]
    pub clearance: SecurityLabel,

    /// Names of the roles assigned to the user.
    #[serde(default)]
    pub roles: BTreeSet<String>,

    /// When the user was created.
    #[serde(default = "default_datetime", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Creates an active user with `public` clearance and no roles.
    #[must_use]
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            active: true,
            clearance: SecurityLabel::default(),
            roles: BTreeSet::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Creates a new user builder.
    #[must_use]
    pub fn builder(id: impl Into<UserId>, username: impl Into<String>) -> UserBuilder {
        UserBuilder {
            user: Self::new(id, username),
        }
    }

    /// Returns `true` if the user account is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` if the user has a specific role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

// =============================================================================
// User Builder
// =============================================================================

/// Builder for creating `User` instances.
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    /// Sets the clearance label.
    #[must_use]
    pub fn clearance(mut self, clearance: impl Into<SecurityLabel>) -> Self {
        self.user.clearance = clearance.into();
        self
    }

    /// Adds a role.
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.user.roles.insert(role.into());
        self
    }

    /// Sets whether the account is active.
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.user.active = active;
        self
    }

    /// Builds the user.
    #[must_use]
    pub fn build(self) -> User {
        self.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClearanceLevel;

    #[test]
    fn test_user_new_defaults() {
        let user = User::new("u1", "alice");
        assert_eq!(user.id.as_str(), "u1");
        assert!(user.is_active());
        assert_eq!(user.clearance.level(), ClearanceLevel::Public);
        assert!(user.roles.is_empty());
    }

    #[test]
    fn test_user_builder() {
        let user = User::builder("u2", "bob")
            .clearance(ClearanceLevel::Restricted)
            .role("staff")
            .role("student")
            .active(false)
            .build();

        assert!(user.has_role("staff"));
        assert!(user.has_role("student"));
        assert!(!user.has_role("admin"));
        assert!(!user.is_active());
        assert_eq!(user.clearance.as_str(), "restricted");
    }

    #[test]
    fn test_user_deserializes_without_optional_fields() {
        let user: User =
            serde_json::from_str(r#"{"id":"7","username":"carol"}"#).unwrap();
        assert_eq!(user.id, UserId::new("7"));
        assert!(user.is_active());
        assert_eq!(user.clearance.as_str(), "public");
        assert!(user.roles.is_empty());
    }
}
