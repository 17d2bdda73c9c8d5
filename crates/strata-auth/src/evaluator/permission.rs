//! Role-based permission evaluation.
//!
//! A user's effective permissions are the union of the permissions granted by
//! every role assigned to them. Nothing is cached: each call reads the
//! directory, so role changes are visible on the next check.

use std::collections::BTreeSet;

use crate::AuthResult;
use crate::storage::DirectoryStore;
use crate::types::{User, UserId};

/// Answers permission queries against a directory store.
///
/// Unknown users, inactive users and users without roles hold no
/// permissions. Only a store failure produces an error.
#[derive(Clone, Copy)]
pub struct PermissionEvaluator<'a> {
    directory: &'a dyn DirectoryStore,
}

impl<'a> PermissionEvaluator<'a> {
    /// Creates an evaluator over the given directory.
    #[must_use]
    pub fn new(directory: &'a dyn DirectoryStore) -> Self {
        Self { directory }
    }

    /// Returns `true` if the user holds the permission through any role.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub async fn has_permission(&self, user_id: &UserId, permission: &str) -> AuthResult<bool> {
        let Some(user) = self.directory.find_user(user_id).await? else {
            tracing::debug!(user_id = %user_id, permission, "Unknown user holds no permissions");
            return Ok(false);
        };
        self.check(&user, permission).await
    }

    /// Checks a permission for a user record that was already loaded.
    ///
    /// The liveness flag is honoured here as well, so an inactive record
    /// never passes.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub async fn check(&self, user: &User, permission: &str) -> AuthResult<bool> {
        if !user.is_active() {
            return Ok(false);
        }
        let granted = self.directory.permissions_of(&user.id).await?;
        Ok(granted.contains(permission))
    }

    /// Returns the union of permissions over the user's roles.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub async fn permissions_of(&self, user_id: &UserId) -> AuthResult<BTreeSet<String>> {
        Ok(self.directory.permissions_of(user_id).await?)
    }

    /// Returns the names of the roles assigned to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub async fn roles_of(&self, user_id: &UserId) -> AuthResult<BTreeSet<String>> {
        Ok(self.directory.roles_of(user_id).await?)
    }
}
