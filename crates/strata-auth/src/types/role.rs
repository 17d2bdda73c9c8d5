//! Roles, permissions and the built-in catalog.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// =============================================================================
// Permission
// =============================================================================

/// A named capability that can be granted to roles.
///
/// Permission names live in a flat namespace (`file.upload`,
/// `admin.manage_roles`); there is no hierarchy or wildcard matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Permission name, e.g. `file.download`.
    pub name: String,

    /// Description of what the permission allows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Permission {
    /// Create a new permission with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// =============================================================================
// Role Type
// =============================================================================

/// A role groups permissions together and can be assigned to users.
///
/// Users inherit the union of the permissions of all their roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role name (e.g., "admin", "staff", "student").
    pub name: String,

    /// Human-readable description of the role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permissions granted by this role.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Role {
    /// Creates a role with no permissions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            permissions: BTreeSet::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds permissions to the role.
    #[must_use]
    pub fn grant<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if the role grants a specific permission.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

// =============================================================================
// Default Catalog
// =============================================================================

/// Uploads a file.
pub const FILE_UPLOAD: &str = "file.upload";
/// Downloads a file (also subject to clearance).
pub const FILE_DOWNLOAD: &str = "file.download";
/// Shares a file with another user.
pub const FILE_SHARE: &str = "file.share";
/// Deletes an owned file.
pub const FILE_DELETE: &str = "file.delete";
/// Reads the audit trail.
pub const ADMIN_VIEW_LOGS: &str = "admin.view_logs";
/// Assigns and revokes roles.
pub const ADMIN_MANAGE_ROLES: &str = "admin.manage_roles";
/// Manages user accounts.
pub const ADMIN_MANAGE_USERS: &str = "admin.manage_users";
/// Creates and updates incidents.
pub const INCIDENT_MANAGE: &str = "incident.manage";
/// Reads incidents.
pub const INCIDENT_VIEW: &str = "incident.view";

/// Returns the default set of permissions available in the system.
#[must_use]
pub fn default_permissions() -> Vec<Permission> {
    vec![
        Permission::new(FILE_UPLOAD).with_description("Upload files"),
        Permission::new(FILE_DOWNLOAD).with_description("Download files"),
        Permission::new(FILE_SHARE).with_description("Share files with others"),
        Permission::new(FILE_DELETE).with_description("Delete own files"),
        Permission::new(ADMIN_VIEW_LOGS).with_description("View audit logs"),
        Permission::new(ADMIN_MANAGE_ROLES).with_description("Manage user roles"),
        Permission::new(ADMIN_MANAGE_USERS).with_description("Manage user accounts"),
        Permission::new(INCIDENT_MANAGE).with_description("Create and manage incidents"),
        Permission::new(INCIDENT_VIEW).with_description("View incidents"),
    ]
}

/// Returns the built-in roles.
///
/// `admin` is granted every default permission.
#[must_use]
pub fn default_roles() -> Vec<Role> {
    let all = default_permissions().into_iter().map(|p| p.name);
    vec![
        Role::new("admin")
            .with_description("System administrator with full access")
            .grant(all),
        Role::new("staff")
            .with_description("Staff member with elevated privileges")
            .grant([
                FILE_UPLOAD,
                FILE_DOWNLOAD,
                FILE_SHARE,
                FILE_DELETE,
                INCIDENT_VIEW,
            ]),
        Role::new("student")
            .with_description("Regular user with basic access")
            .grant([FILE_UPLOAD, FILE_DOWNLOAD]),
    ]
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_grant() {
        let role = Role::new("reader").grant(["file.download"]);
        assert!(role.has_permission("file.download"));
        assert!(!role.has_permission("file.upload"));
    }

    #[test]
    fn test_default_permissions() {
        let names: Vec<_> = default_permissions().into_iter().map(|p| p.name).collect();
        assert_eq!(names.len(), 9);
        assert!(names.contains(&ADMIN_MANAGE_ROLES.to_string()));
        assert!(names.contains(&INCIDENT_VIEW.to_string()));
    }

    #[test]
    fn test_admin_role_has_every_permission() {
        let roles = default_roles();
        let admin = roles.iter().find(|r| r.name == "admin").unwrap();
        for permission in default_permissions() {
            assert!(admin.has_permission(&permission.name));
        }
    }

    #[test]
    fn test_staff_role_grants() {
        let roles = default_roles();
        let staff = roles.iter().find(|r| r.name == "staff").unwrap();
        assert_eq!(staff.permissions.len(), 5);
        assert!(staff.has_permission(FILE_DELETE));
        assert!(!staff.has_permission(ADMIN_MANAGE_USERS));
    }
}
