//! Storage traits consumed by the evaluators, the guard and the audit logger.
//!
//! The directory (users, roles, permissions, classified resources) and the
//! audit sink are external collaborators. This module only defines the
//! queries the core needs.
//!
//! # Implementations
//!
//! - `strata-db-memory` - in-memory backend with request-scoped transactions

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::audit::{AuditEntry, AuditQuery, NewAuditEntry};
use crate::types::{ProtectedResource, User, UserId};

pub mod error;

pub use error::StoreError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Directory Store
// =============================================================================

/// Read-only point queries against the directory.
///
/// Implementations must answer from current state on every call; the
/// evaluators rely on this to pick up role changes immediately.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Find a user by id, active or not.
    ///
    /// Returns `None` if the user doesn't exist.
    async fn find_user(&self, user_id: &UserId) -> StoreResult<Option<User>>;

    /// Names of the roles assigned to the user.
    ///
    /// Returns an empty set for unknown users.
    async fn roles_of(&self, user_id: &UserId) -> StoreResult<BTreeSet<String>>;

    /// Union of the permissions granted by every role of the user.
    ///
    /// Returns an empty set for unknown users and users with no roles.
    async fn permissions_of(&self, user_id: &UserId) -> StoreResult<BTreeSet<String>>;

    /// Find a classified resource.
    ///
    /// Returns `None` if no resource of that type has the given id.
    async fn find_resource(
        &self,
        target_type: &str,
        id: &str,
    ) -> StoreResult<Option<ProtectedResource>>;
}

// =============================================================================
// Audit Sink
// =============================================================================

/// Append-only audit trail.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one entry. The sink assigns id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be durably recorded.
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry>;

    /// List entries matching the query, newest first.
    async fn list(&self, query: &AuditQuery) -> StoreResult<Vec<AuditEntry>>;
}

// =============================================================================
// Role Assignment
// =============================================================================

/// Outcome of a role assignment mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentChange {
    /// Membership changed.
    Applied,
    /// Membership was already in the requested state.
    Unchanged,
    /// The user does not exist.
    UnknownUser,
    /// The role does not exist.
    UnknownRole,
}

/// Mutations of user/role membership.
#[async_trait]
pub trait RoleAssignment: Send + Sync {
    /// Assign a role to a user.
    async fn assign_role(&self, user_id: &UserId, role: &str) -> StoreResult<AssignmentChange>;

    /// Revoke a role from a user.
    async fn revoke_role(&self, user_id: &UserId, role: &str) -> StoreResult<AssignmentChange>;
}
