//! Role administration.
//!
//! Assigning or revoking a role is an administrative action and is always
//! recorded, in the same transaction as the membership change. Callers are
//! expected to run these behind a guard requiring `admin.manage_roles`.

use crate::AuthResult;
use crate::audit::{AuditAction, AuditDetail, AuditLogger, AuditSource, NewAuditEntry};
use crate::error::AuthError;
use crate::storage::{AssignmentChange, RoleAssignment};
use crate::types::UserId;

/// Applies role membership changes and records them.
#[derive(Clone, Copy)]
pub struct RoleAdmin<'a> {
    store: &'a dyn RoleAssignment,
    audit: &'a AuditLogger,
}

impl<'a> RoleAdmin<'a> {
    /// Creates a role administrator.
    pub fn new(store: &'a dyn RoleAssignment, audit: &'a AuditLogger) -> Self {
        Self { store, audit }
    }

    /// Assigns `role` to `user_id`.
    ///
    /// Returns `true` if membership changed, `false` if the user already
    /// had the role.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user or role, or a storage error if
    /// the change or its audit entry could not be written.
    pub async fn assign(
        &self,
        actor: &UserId,
        user_id: &UserId,
        role: &str,
        source: AuditSource,
    ) -> AuthResult<bool> {
        let change = self.store.assign_role(user_id, role).await?;
        self.finish(AuditAction::RoleAssign, change, actor, user_id, role, source)
            .await
    }

    /// Revokes `role` from `user_id`.
    ///
    /// Returns `true` if membership changed, `false` if the user did not
    /// have the role.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user or role, or a storage error if
    /// the change or its audit entry could not be written.
    pub async fn revoke(
        &self,
        actor: &UserId,
        user_id: &UserId,
        role: &str,
        source: AuditSource,
    ) -> AuthResult<bool> {
        let change = self.store.revoke_role(user_id, role).await?;
        self.finish(AuditAction::RoleRevoke, change, actor, user_id, role, source)
            .await
    }

    async fn finish(
        &self,
        action: AuditAction,
        change: AssignmentChange,
        actor: &UserId,
        user_id: &UserId,
        role: &str,
        source: AuditSource,
    ) -> AuthResult<bool> {
        match change {
            AssignmentChange::UnknownUser => Err(AuthError::not_found("user", user_id.as_str())),
            AssignmentChange::UnknownRole => Err(AuthError::not_found("role", role)),
            AssignmentChange::Unchanged => {
                tracing::debug!(
                    user_id = %user_id,
                    role,
                    action = %action,
                    "Role membership unchanged"
                );
                Ok(false)
            }
            AssignmentChange::Applied => {
                let entry = NewAuditEntry::success(action)
                    .actor(actor)
                    .target("user", Some(user_id.to_string()))
                    .detail(AuditDetail::RoleChange {
                        user_id: user_id.clone(),
                        role: role.to_string(),
                    })
                    .source(source);
                self.audit.record(entry).await?;
                tracing::info!(
                    actor = %actor,
                    user_id = %user_id,
                    role,
                    action = %action,
                    "Role membership changed"
                );
                Ok(true)
            }
        }
    }
}
