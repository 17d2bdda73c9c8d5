use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use strata_auth::audit::{AuditEntry, AuditQuery, NewAuditEntry};
use strata_auth::storage::{
    AssignmentChange, AuditSink, DirectoryStore, RoleAssignment, StoreError, StoreResult,
};
use strata_auth::types::{ProtectedResource, Role, User, UserId};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::seed::DirectorySeed;
use crate::transaction::MemoryTransaction;

pub(crate) type ResourceKey = (String, String);

/// Committed directory state.
#[derive(Debug, Default)]
pub(crate) struct DirectoryState {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) roles: HashMap<String, Role>,
    pub(crate) resources: HashMap<ResourceKey, ProtectedResource>,
    /// Append-only, in commit order. Ids follow append order, so entries
    /// from interleaved transactions may sit out of id order.
    pub(crate) audit: Vec<AuditEntry>,
}

impl DirectoryState {
    /// Roles of the user that exist in the role table.
    pub(crate) fn roles_of(&self, user: &User) -> BTreeSet<String> {
        user.roles
            .iter()
            .filter(|name| self.roles.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Union of permissions over the given role names.
    pub(crate) fn permissions_for(&self, roles: &BTreeSet<String>) -> BTreeSet<String> {
        roles
            .iter()
            .filter_map(|name| self.roles.get(name))
            .flat_map(|role| role.permissions.iter().cloned())
            .collect()
    }

    /// Applies a membership change to committed state.
    pub(crate) fn apply_membership(
        &mut self,
        user_id: &UserId,
        role: &str,
        assign: bool,
    ) -> AssignmentChange {
        if !self.roles.contains_key(role) {
            return AssignmentChange::UnknownRole;
        }
        let Some(user) = self.users.get_mut(user_id) else {
            return AssignmentChange::UnknownUser;
        };
        let changed = if assign {
            user.roles.insert(role.to_string())
        } else {
            user.roles.remove(role)
        };
        if changed {
            AssignmentChange::Applied
        } else {
            AssignmentChange::Unchanged
        }
    }

    /// Newest-first (by id) listing of `entries` matching `query`.
    pub(crate) fn select_audit<'a>(
        entries: impl Iterator<Item = &'a AuditEntry>,
        query: &AuditQuery,
    ) -> Vec<AuditEntry> {
        let mut matching: Vec<&AuditEntry> =
            entries.filter(|entry| query.matches(entry)).collect();
        matching.sort_unstable_by(|a, b| b.id.cmp(&a.id));
        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }
        matching.into_iter().cloned().collect()
    }
}

/// In-memory directory store and audit sink.
///
/// Cloning is cheap and every clone shares the same state. Calls made
/// directly on `MemoryDirectory` commit immediately; use
/// [`MemoryDirectory::begin`] for request-scoped transactions.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    pub(crate) state: Arc<RwLock<DirectoryState>>,
    pub(crate) next_audit_id: Arc<AtomicU64>,
    pub(crate) audit_unavailable: Arc<AtomicBool>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::from_state(DirectoryState::default())
    }

    /// Creates a directory holding only the built-in roles.
    pub fn with_default_catalog() -> Self {
        Self::from_seed(DirectorySeed::default_catalog())
    }

    /// Creates a directory from seed data.
    pub fn from_seed(seed: DirectorySeed) -> Self {
        let mut state = DirectoryState::default();
        for role in seed.roles {
            state.roles.insert(role.name.clone(), role);
        }
        for user in seed.users {
            state.users.insert(user.id.clone(), user);
        }
        for resource in seed.resources {
            state.resources.insert(
                (resource.target_type.clone(), resource.id.clone()),
                resource,
            );
        }
        Self::from_state(state)
    }

    fn from_state(state: DirectoryState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            next_audit_id: Arc::new(AtomicU64::new(1)),
            audit_unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts a request-scoped transaction.
    pub fn begin(&self) -> Arc<MemoryTransaction> {
        Arc::new(MemoryTransaction::new(self.clone()))
    }

    /// Inserts or replaces a user.
    pub async fn upsert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id.clone(), user);
    }

    /// Inserts or replaces a role.
    pub async fn upsert_role(&self, role: Role) {
        self.state.write().await.roles.insert(role.name.clone(), role);
    }

    /// Inserts or replaces a classified resource.
    pub async fn upsert_resource(&self, resource: ProtectedResource) {
        self.state.write().await.resources.insert(
            (resource.target_type.clone(), resource.id.clone()),
            resource,
        );
    }

    /// Sets the active flag of a user. Returns `false` for unknown users.
    pub async fn set_active(&self, user_id: &UserId, active: bool) -> bool {
        match self.state.write().await.users.get_mut(user_id) {
            Some(user) => {
                user.active = active;
                true
            }
            None => false,
        }
    }

    /// Makes every audit write fail with [`StoreError::Unavailable`].
    ///
    /// Simulates an unreachable audit sink.
    pub fn set_audit_unavailable(&self, unavailable: bool) {
        self.audit_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of committed audit entries.
    pub async fn audit_len(&self) -> usize {
        self.state.read().await.audit.len()
    }

    /// Stamps a new entry, or fails if the sink is marked unavailable.
    pub(crate) fn stamp(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry> {
        if self.audit_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("audit sink is unavailable"));
        }
        let id = self.next_audit_id.fetch_add(1, Ordering::SeqCst);
        Ok(AuditEntry::stamp(id, OffsetDateTime::now_utc(), entry))
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn find_user(&self, user_id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn roles_of(&self, user_id: &UserId) -> StoreResult<BTreeSet<String>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .get(user_id)
            .map(|user| state.roles_of(user))
            .unwrap_or_default())
    }

    async fn permissions_of(&self, user_id: &UserId) -> StoreResult<BTreeSet<String>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .get(user_id)
            .map(|user| state.permissions_for(&state.roles_of(user)))
            .unwrap_or_default())
    }

    async fn find_resource(
        &self,
        target_type: &str,
        id: &str,
    ) -> StoreResult<Option<ProtectedResource>> {
        let key = (target_type.to_string(), id.to_string());
        Ok(self.state.read().await.resources.get(&key).cloned())
    }
}

#[async_trait]
impl AuditSink for MemoryDirectory {
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry> {
        let stored = self.stamp(entry)?;
        self.state.write().await.audit.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, query: &AuditQuery) -> StoreResult<Vec<AuditEntry>> {
        let state = self.state.read().await;
        Ok(DirectoryState::select_audit(state.audit.iter(), query))
    }
}

#[async_trait]
impl RoleAssignment for MemoryDirectory {
    async fn assign_role(&self, user_id: &UserId, role: &str) -> StoreResult<AssignmentChange> {
        Ok(self.state.write().await.apply_membership(user_id, role, true))
    }

    async fn revoke_role(&self, user_id: &UserId, role: &str) -> StoreResult<AssignmentChange> {
        Ok(self.state.write().await.apply_membership(user_id, role, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_auth::audit::{AuditAction, AuditResult};
    use strata_auth::types::ClearanceLevel;

    fn directory() -> MemoryDirectory {
        MemoryDirectory::from_seed(
            DirectorySeed::default_catalog()
                .user(
                    User::builder("1", "alice")
                        .role("staff")
                        .role("student")
                        .build(),
                )
                .user(User::builder("2", "bob").role("ghost-role").build())
                .resource(ProtectedResource::file("10", ClearanceLevel::Restricted)),
        )
    }

    #[tokio::test]
    async fn test_permissions_are_union_of_roles() {
        let dir = directory();
        let perms = dir.permissions_of(&UserId::new("1")).await.unwrap();
        assert!(perms.contains("file.share"));
        assert!(perms.contains("file.upload"));
        assert!(!perms.contains("admin.view_logs"));
        assert_eq!(perms.len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_roles_and_users_grant_nothing() {
        let dir = directory();
        assert!(dir.permissions_of(&UserId::new("2")).await.unwrap().is_empty());
        assert!(dir.roles_of(&UserId::new("2")).await.unwrap().is_empty());
        assert!(dir.permissions_of(&UserId::new("nobody")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_resource_by_type() {
        let dir = directory();
        assert!(dir.find_resource("file", "10").await.unwrap().is_some());
        assert!(dir.find_resource("incident", "10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_membership_changes() {
        let dir = directory();
        let alice = UserId::new("1");

        assert_eq!(
            dir.assign_role(&alice, "admin").await.unwrap(),
            AssignmentChange::Applied
        );
        assert_eq!(
            dir.assign_role(&alice, "admin").await.unwrap(),
            AssignmentChange::Unchanged
        );
        assert_eq!(
            dir.assign_role(&alice, "nope").await.unwrap(),
            AssignmentChange::UnknownRole
        );
        assert_eq!(
            dir.revoke_role(&UserId::new("x"), "admin").await.unwrap(),
            AssignmentChange::UnknownUser
        );
        assert!(
            dir.permissions_of(&alice)
                .await
                .unwrap()
                .contains("admin.manage_roles")
        );
    }

    #[tokio::test]
    async fn test_audit_append_and_list_newest_first() {
        let dir = directory();
        let first = dir
            .append(NewAuditEntry::denied(AuditAction::RbacDenied))
            .await
            .unwrap();
        let second = dir
            .append(NewAuditEntry::success(AuditAction::FileDownload))
            .await
            .unwrap();
        assert!(second.id > first.id);

        let all = dir.list(&AuditQuery::default()).await.unwrap();
        assert_eq!(all.iter().map(|e| e.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        let denied = dir
            .list(&AuditQuery {
                result: Some(AuditResult::Denied),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(denied.len(), 1);

        let limited = dir
            .list(&AuditQuery {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited[0].id, second.id);
    }

    #[tokio::test]
    async fn test_unavailable_sink_rejects_writes() {
        let dir = directory();
        dir.set_audit_unavailable(true);
        let err = dir
            .append(NewAuditEntry::denied(AuditAction::MacDenied))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert_eq!(dir.audit_len().await, 0);
    }
}
