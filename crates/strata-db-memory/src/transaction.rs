//! Request-scoped transactions over [`MemoryDirectory`].
//!
//! Writes (role membership changes and audit entries) are staged and become
//! visible to other readers only on [`MemoryTransaction::commit`]. Reads
//! inside the transaction see its own staged writes. Dropping a transaction
//! that was never committed discards everything it staged.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use strata_auth::audit::{AuditEntry, AuditQuery, NewAuditEntry};
use strata_auth::storage::{
    AssignmentChange, AuditSink, DirectoryStore, RoleAssignment, StoreError, StoreResult,
};
use strata_auth::types::{ProtectedResource, User, UserId};
use tokio::sync::Mutex;

use crate::storage::{DirectoryState, MemoryDirectory};

/// Writes buffered until commit.
#[derive(Debug, Default)]
struct Staged {
    /// `(user, role, assign)` in the order they were applied.
    memberships: Vec<(UserId, String, bool)>,
    audit: Vec<AuditEntry>,
}

impl Staged {
    fn is_empty(&self) -> bool {
        self.memberships.is_empty() && self.audit.is_empty()
    }

    /// Committed user with this transaction's membership changes applied.
    fn overlay_user(&self, state: &DirectoryState, user_id: &UserId) -> Option<User> {
        let mut user = state.users.get(user_id).cloned()?;
        for (_, role, assign) in self.memberships.iter().filter(|(id, _, _)| id == user_id) {
            if *assign {
                user.roles.insert(role.clone());
            } else {
                user.roles.remove(role);
            }
        }
        Some(user)
    }
}

/// A unit of work against a [`MemoryDirectory`].
///
/// Implements the same storage traits as the directory so it can back a
/// request's guard services directly.
#[derive(Debug)]
pub struct MemoryTransaction {
    directory: MemoryDirectory,
    /// `None` once committed or rolled back.
    staged: Mutex<Option<Staged>>,
}

impl MemoryTransaction {
    pub(crate) fn new(directory: MemoryDirectory) -> Self {
        Self {
            directory,
            staged: Mutex::new(Some(Staged::default())),
        }
    }

    /// Applies every staged write atomically.
    ///
    /// Staged membership changes are replayed against the committed state
    /// first. If any of them no longer changes anything (another transaction
    /// got there first), nothing is applied and the audit entries are
    /// discarded with the rest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the transaction already completed
    /// or a staged membership change is stale.
    pub async fn commit(&self) -> StoreResult<()> {
        let staged = self.staged.lock().await.take().ok_or_else(completed)?;
        let mut state = self.directory.state.write().await;
        let updated = replay_memberships(&state, &staged.memberships)?;
        state.users.extend(updated);
        let audit_entries = staged.audit.len();
        state.audit.extend(staged.audit);
        tracing::debug!(
            memberships = staged.memberships.len(),
            audit_entries,
            "Transaction committed"
        );
        Ok(())
    }

    /// Discards every staged write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the transaction already completed.
    pub async fn rollback(&self) -> StoreResult<()> {
        let staged = self.staged.lock().await.take().ok_or_else(completed)?;
        tracing::debug!(
            memberships = staged.memberships.len(),
            audit_entries = staged.audit.len(),
            "Transaction rolled back"
        );
        Ok(())
    }

    async fn membership(
        &self,
        user_id: &UserId,
        role: &str,
        assign: bool,
    ) -> StoreResult<AssignmentChange> {
        let mut guard = self.staged.lock().await;
        let staged = guard.as_mut().ok_or_else(completed)?;
        let state = self.directory.state.read().await;

        if !state.roles.contains_key(role) {
            return Ok(AssignmentChange::UnknownRole);
        }
        let Some(user) = staged.overlay_user(&state, user_id) else {
            return Ok(AssignmentChange::UnknownUser);
        };
        if user.has_role(role) == assign {
            return Ok(AssignmentChange::Unchanged);
        }
        staged
            .memberships
            .push((user_id.clone(), role.to_string(), assign));
        Ok(AssignmentChange::Applied)
    }
}

fn completed() -> StoreError {
    StoreError::conflict("transaction already completed")
}

/// Users touched by `memberships`, with every change applied.
///
/// Fails unless each change still takes effect on the committed state.
fn replay_memberships(
    state: &DirectoryState,
    memberships: &[(UserId, String, bool)],
) -> StoreResult<HashMap<UserId, User>> {
    let mut scratch: HashMap<UserId, User> = HashMap::new();
    for (user_id, role, assign) in memberships {
        if !state.roles.contains_key(role) {
            return Err(StoreError::conflict(format!("role '{role}' no longer exists")));
        }
        let user = match scratch.entry(user_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => match state.users.get(user_id) {
                Some(user) => entry.insert(user.clone()),
                None => {
                    return Err(StoreError::conflict(format!(
                        "user '{user_id}' no longer exists"
                    )));
                }
            },
        };
        let changed = if *assign {
            user.roles.insert(role.clone())
        } else {
            user.roles.remove(role)
        };
        if !changed {
            return Err(StoreError::conflict(format!(
                "membership of '{user_id}' in '{role}' was changed concurrently"
            )));
        }
    }
    Ok(scratch)
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if let Some(staged) = self.staged.get_mut().take()
            && !staged.is_empty()
        {
            tracing::debug!(
                memberships = staged.memberships.len(),
                audit_entries = staged.audit.len(),
                "Uncommitted transaction dropped, rolling back"
            );
        }
    }
}

#[async_trait]
impl DirectoryStore for MemoryTransaction {
    async fn find_user(&self, user_id: &UserId) -> StoreResult<Option<User>> {
        let guard = self.staged.lock().await;
        let staged = guard.as_ref().ok_or_else(completed)?;
        let state = self.directory.state.read().await;
        Ok(staged.overlay_user(&state, user_id))
    }

    async fn roles_of(&self, user_id: &UserId) -> StoreResult<BTreeSet<String>> {
        let guard = self.staged.lock().await;
        let staged = guard.as_ref().ok_or_else(completed)?;
        let state = self.directory.state.read().await;
        Ok(staged
            .overlay_user(&state, user_id)
            .map(|user| state.roles_of(&user))
            .unwrap_or_default())
    }

    async fn permissions_of(&self, user_id: &UserId) -> StoreResult<BTreeSet<String>> {
        let guard = self.staged.lock().await;
        let staged = guard.as_ref().ok_or_else(completed)?;
        let state = self.directory.state.read().await;
        Ok(staged
            .overlay_user(&state, user_id)
            .map(|user| state.permissions_for(&state.roles_of(&user)))
            .unwrap_or_default())
    }

    async fn find_resource(
        &self,
        target_type: &str,
        id: &str,
    ) -> StoreResult<Option<ProtectedResource>> {
        self.directory.find_resource(target_type, id).await
    }
}

#[async_trait]
impl AuditSink for MemoryTransaction {
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry> {
        let mut guard = self.staged.lock().await;
        let staged = guard.as_mut().ok_or_else(completed)?;
        let stored = self.directory.stamp(entry)?;
        staged.audit.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, query: &AuditQuery) -> StoreResult<Vec<AuditEntry>> {
        let guard = self.staged.lock().await;
        let staged = guard.as_ref().ok_or_else(completed)?;
        let state = self.directory.state.read().await;
        Ok(DirectoryState::select_audit(
            state.audit.iter().chain(staged.audit.iter()),
            query,
        ))
    }
}

#[async_trait]
impl RoleAssignment for MemoryTransaction {
    async fn assign_role(&self, user_id: &UserId, role: &str) -> StoreResult<AssignmentChange> {
        self.membership(user_id, role, true).await
    }

    async fn revoke_role(&self, user_id: &UserId, role: &str) -> StoreResult<AssignmentChange> {
        self.membership(user_id, role, false).await
    }
}
