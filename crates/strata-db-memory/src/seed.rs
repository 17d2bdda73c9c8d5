//! Seed data for bootstrapping a directory.

use serde::Deserialize;
use strata_auth::types::{ProtectedResource, Role, User, default_roles};

/// Roles, users and classified resources loaded at startup.
///
/// Deserializable so it can be embedded in application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DirectorySeed {
    pub roles: Vec<Role>,
    pub users: Vec<User>,
    pub resources: Vec<ProtectedResource>,
}

impl DirectorySeed {
    /// Seed containing the built-in `admin`, `staff` and `student` roles.
    #[must_use]
    pub fn default_catalog() -> Self {
        Self {
            roles: default_roles(),
            ..Self::default()
        }
    }

    /// Adds the built-in roles that are not already defined.
    #[must_use]
    pub fn with_default_roles(mut self) -> Self {
        for role in default_roles() {
            if !self.roles.iter().any(|r| r.name == role.name) {
                self.roles.push(role);
            }
        }
        self
    }

    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    #[must_use]
    pub fn user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    #[must_use]
    pub fn resource(mut self, resource: ProtectedResource) -> Self {
        self.resources.push(resource);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roles_not_duplicated() {
        let seed = DirectorySeed::default()
            .role(Role::new("admin"))
            .with_default_roles();
        assert_eq!(seed.roles.len(), 3);
        let admin = seed.roles.iter().find(|r| r.name == "admin").unwrap();
        assert!(admin.permissions.is_empty());
    }
}
