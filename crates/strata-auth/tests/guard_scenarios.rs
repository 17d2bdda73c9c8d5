//! End-to-end guard decisions against the in-memory directory.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use strata_auth::prelude::*;
use strata_auth::{
    AuditConfig, AuditEntry, AuditQuery, AuditResult, DenialKind, PermissionEvaluator,
    ProtectedResource, RoleAdmin, UnauthenticatedReason,
};
use strata_db_memory::{DirectorySeed, MemoryDirectory, MemoryTransaction};

// =============================================================================
// Fixtures
// =============================================================================

fn directory() -> MemoryDirectory {
    MemoryDirectory::from_seed(
        DirectorySeed::default_catalog()
            .user(
                User::builder("1", "root")
                    .role("admin")
                    .clearance(ClearanceLevel::Restricted)
                    .build(),
            )
            .user(
                User::builder("2", "sam")
                    .role("staff")
                    .clearance(ClearanceLevel::Confidential)
                    .build(),
            )
            .user(User::builder("3", "stu").role("student").build())
            .user(
                User::builder("4", "multi")
                    .role("staff")
                    .role("student")
                    .clearance(ClearanceLevel::Restricted)
                    .build(),
            )
            .user(User::builder("5", "nobody").build())
            .user(
                User::builder("6", "gone")
                    .role("admin")
                    .clearance(ClearanceLevel::Restricted)
                    .active(false)
                    .build(),
            )
            .resource(
                ProtectedResource::file("10", ClearanceLevel::Public).with_name("handbook.pdf"),
            )
            .resource(ProtectedResource::file("11", ClearanceLevel::Confidential))
            .resource(ProtectedResource::file("12", ClearanceLevel::Restricted))
            .resource(ProtectedResource::file("13", SecurityLabel::new("secret"))),
    )
}

fn services(tx: &Arc<MemoryTransaction>, config: AuditConfig) -> GuardServices {
    GuardServices::new(tx.clone(), AuditLogger::new(tx.clone(), config))
}

fn download_guard() -> PolicyGuard {
    PolicyGuard::permission("file.download")
        .and(PolicyGuard::clearance(TargetResolver::path_param(
            "file", "file_id",
        )))
        .audit_success(AuditAction::FileDownload)
}

fn download_ctx(subject: &str, file_id: &str) -> RequestContext {
    RequestContext::for_subject(subject).with_param("file_id", file_id)
}

async fn all_entries(dir: &MemoryDirectory) -> Vec<AuditEntry> {
    dir.list(&AuditQuery::default()).await.unwrap()
}

/// Runs the download guard in its own committed transaction.
async fn download(
    dir: &MemoryDirectory,
    config: AuditConfig,
    ctx: &RequestContext,
    calls: &Arc<AtomicUsize>,
) -> AuthResult<GuardOutcome<Option<ProtectedResource>>> {
    let tx = dir.begin();
    let counter = calls.clone();
    let handler = download_guard().wrap(move |authorized: Authorized| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AuthError>(authorized.target().cloned())
        }
    });
    let outcome = handler.call(&services(&tx, config), ctx).await;
    if outcome.is_ok() {
        tx.commit().await.unwrap();
    }
    outcome
}

// =============================================================================
// Permission Evaluator
// =============================================================================

#[tokio::test]
async fn staff_permissions_match_role_grants() {
    let dir = directory();
    let evaluator = PermissionEvaluator::new(&dir);
    let sam = UserId::new("2");

    assert!(evaluator.has_permission(&sam, "file.upload").await.unwrap());
    assert!(!evaluator.has_permission(&sam, "admin.manage_users").await.unwrap());
}

#[tokio::test]
async fn permissions_are_the_union_over_roles() {
    let dir = directory();
    let evaluator = PermissionEvaluator::new(&dir);

    let multi = evaluator.permissions_of(&UserId::new("4")).await.unwrap();
    let staff = evaluator.permissions_of(&UserId::new("2")).await.unwrap();
    let student = evaluator.permissions_of(&UserId::new("3")).await.unwrap();
    let expected: std::collections::BTreeSet<_> = staff.union(&student).cloned().collect();
    assert_eq!(multi, expected);
}

#[tokio::test]
async fn role_less_unknown_and_inactive_users_hold_nothing() {
    let dir = directory();
    let evaluator = PermissionEvaluator::new(&dir);

    assert!(evaluator.permissions_of(&UserId::new("5")).await.unwrap().is_empty());
    assert!(!evaluator.has_permission(&UserId::new("5"), "file.download").await.unwrap());
    assert!(!evaluator.has_permission(&UserId::new("404"), "file.download").await.unwrap());
    // Inactive admin: roles still resolve, but no check passes.
    assert!(!evaluator.has_permission(&UserId::new("6"), "admin.view_logs").await.unwrap());
}

// =============================================================================
// Guard Decisions
// =============================================================================

#[tokio::test]
async fn insufficient_clearance_is_denied_and_audited_once() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = download_ctx("2", "12");

    let outcome = download(&dir, AuditConfig::default(), &ctx, &calls)
        .await
        .unwrap();

    let denial = outcome.denial().expect("denied");
    assert_eq!(denial.kind(), DenialKind::Mac);
    assert_eq!(
        denial.message(),
        "Access Denied (MAC): Your clearance level (confidential) is insufficient for this file (classified as restricted)."
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let entries = all_entries(&dir).await;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.id, denial.audit_id);
    assert_eq!(entry.action, AuditAction::MacDenied);
    assert_eq!(entry.result, AuditResult::Denied);
    assert_eq!(entry.actor_id, Some(UserId::new("2")));
    assert_eq!(entry.target_type.as_deref(), Some("file"));
    assert_eq!(entry.target_id.as_deref(), Some("12"));
    assert_eq!(
        serde_json::to_value(&entry.detail).unwrap(),
        json!({"user_clearance": "confidential", "file_classification": "restricted"})
    );
}

#[tokio::test]
async fn dominating_clearance_runs_the_operation() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = download_ctx("4", "10");

    let outcome = download(&dir, AuditConfig::default(), &ctx, &calls)
        .await
        .unwrap();

    let file = outcome.into_allowed().flatten().expect("allowed with target");
    assert_eq!(file.name.as_deref(), Some("handbook.pdf"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let entries = all_entries(&dir).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::FileDownload);
    assert_eq!(entries[0].result, AuditResult::Success);
    assert_eq!(entries[0].target_id.as_deref(), Some("10"));
}

#[tokio::test]
async fn equal_clearance_is_allowed() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));

    let outcome = download(&dir, AuditConfig::default(), &download_ctx("2", "11"), &calls)
        .await
        .unwrap();
    assert!(outcome.is_allowed());
}

#[tokio::test]
async fn missing_subject_is_unauthenticated_without_audit() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = RequestContext::new().with_param("file_id", "10");

    let outcome = download(&dir, AuditConfig::default(), &ctx, &calls)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        GuardOutcome::Unauthenticated(UnauthenticatedReason::NoSession)
    );
    assert_eq!(
        outcome.message().as_deref(),
        Some("Please log in to access this page.")
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(all_entries(&dir).await.is_empty());
}

#[tokio::test]
async fn missing_permission_is_denied_with_rbac_entry() {
    let dir = directory();
    let tx = dir.begin();
    let guard = PolicyGuard::permission("admin.manage_roles");

    let outcome = guard
        .authorize(
            &services(&tx, AuditConfig::default()),
            &RequestContext::for_subject("3"),
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let denial = outcome.denial().expect("denied");
    assert_eq!(denial.kind(), DenialKind::Rbac);
    assert_eq!(
        denial.message(),
        "Access Denied (RBAC): You do not have the \"admin.manage_roles\" permission."
    );

    let entries = all_entries(&dir).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::RbacDenied);
    assert_eq!(entries[0].target_type.as_deref(), Some("permission"));
    assert_eq!(entries[0].target_id, None);
    assert_eq!(
        serde_json::to_value(&entries[0].detail).unwrap(),
        json!({"required_permission": "admin.manage_roles"})
    );
}

#[tokio::test]
async fn first_failing_requirement_decides() {
    // Student lacks both file.share and clearance over file 12.
    let dir = directory();
    let tx = dir.begin();
    let guard = PolicyGuard::permission("file.share").and(PolicyGuard::clearance(
        TargetResolver::path_param("file", "file_id"),
    ));

    let outcome = guard
        .authorize(
            &services(&tx, AuditConfig::default()),
            &download_ctx("3", "12"),
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(outcome.denial().map(|d| d.kind()), Some(DenialKind::Rbac));
    assert_eq!(all_entries(&dir).await.len(), 1);
}

#[tokio::test]
async fn inactive_and_unknown_subjects_are_expired_sessions() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));

    for subject in ["6", "404"] {
        let outcome = download(&dir, AuditConfig::default(), &download_ctx(subject, "10"), &calls)
            .await
            .unwrap();
        match outcome {
            GuardOutcome::Unauthenticated(reason) => {
                assert_eq!(reason, UnauthenticatedReason::SessionExpired);
                assert!(reason.clears_session());
            }
            other => panic!("expected session expiry, got {other:?}"),
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(all_entries(&dir).await.is_empty());
}

#[tokio::test]
async fn deactivation_takes_effect_on_next_request() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = download_ctx("1", "10");

    assert!(
        download(&dir, AuditConfig::default(), &ctx, &calls)
            .await
            .unwrap()
            .is_allowed()
    );
    dir.set_active(&UserId::new("1"), false).await;
    assert_eq!(
        download(&dir, AuditConfig::default(), &ctx, &calls)
            .await
            .unwrap(),
        GuardOutcome::Unauthenticated(UnauthenticatedReason::SessionExpired)
    );
}

#[tokio::test]
async fn missing_target_is_not_found_without_audit() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));

    let outcome = download(&dir, AuditConfig::default(), &download_ctx("1", "999"), &calls)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        GuardOutcome::NotFound {
            target_type: "file".to_string(),
            target_id: Some("999".to_string()),
        }
    );
    assert_eq!(outcome.message().as_deref(), Some("File not found."));
    assert!(all_entries(&dir).await.is_empty());
}

#[tokio::test]
async fn unrecognized_classification_ranks_as_public() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));

    // Student has public clearance; file 13 is labelled "secret".
    let outcome = download(&dir, AuditConfig::default(), &download_ctx("3", "13"), &calls)
        .await
        .unwrap();
    assert!(outcome.is_allowed());
}

// =============================================================================
// Audit Behaviour
// =============================================================================

#[tokio::test]
async fn audit_failure_aborts_the_request() {
    let dir = directory();
    dir.set_audit_unavailable(true);
    let calls = Arc::new(AtomicUsize::new(0));

    let err = download(&dir, AuditConfig::default(), &download_ctx("2", "12"), &calls)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Storage(_)));
    assert!(err.is_server_error());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    dir.set_audit_unavailable(false);
    assert!(all_entries(&dir).await.is_empty());
}

#[tokio::test]
async fn success_audit_respects_configuration() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));
    let config = AuditConfig {
        log_allowed_decisions: false,
        ..AuditConfig::default()
    };

    let outcome = download(&dir, config, &download_ctx("1", "12"), &calls)
        .await
        .unwrap();
    assert!(outcome.is_allowed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(all_entries(&dir).await.is_empty());
}

#[tokio::test]
async fn request_metadata_is_recorded() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = download_ctx("2", "12")
        .with_ip("192.0.2.7".parse().unwrap())
        .with_user_agent("x".repeat(40));
    let config = AuditConfig {
        max_user_agent_len: 16,
        ..AuditConfig::default()
    };

    download(&dir, config, &ctx, &calls).await.unwrap();

    let entries = all_entries(&dir).await;
    assert_eq!(entries[0].ip_address, Some("192.0.2.7".parse().unwrap()));
    assert_eq!(entries[0].user_agent.as_deref().map(str::len), Some(16));
}

#[tokio::test]
async fn metadata_capture_can_be_disabled() {
    let dir = directory();
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = download_ctx("2", "12").with_user_agent("curl/8.5");
    let config = AuditConfig {
        capture_request_metadata: false,
        ..AuditConfig::default()
    };

    download(&dir, config, &ctx, &calls).await.unwrap();

    let entries = all_entries(&dir).await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].user_agent.is_none());
}

// =============================================================================
// Role Administration
// =============================================================================

#[tokio::test]
async fn role_change_is_visible_on_next_check() {
    let dir = directory();
    let stu = UserId::new("3");
    let guard = PolicyGuard::permission("admin.view_logs");

    let tx = dir.begin();
    let before = guard
        .authorize(&services(&tx, AuditConfig::default()), &RequestContext::for_subject("3"))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert!(before.is_denied());

    let tx = dir.begin();
    let audit = AuditLogger::new(tx.clone(), AuditConfig::default());
    let changed = RoleAdmin::new(tx.as_ref(), &audit)
        .assign(&UserId::new("1"), &stu, "admin", AuditSource::default())
        .await
        .unwrap();
    assert!(changed);
    tx.commit().await.unwrap();

    let tx = dir.begin();
    let after = guard
        .authorize(&services(&tx, AuditConfig::default()), &RequestContext::for_subject("3"))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert!(after.is_allowed());

    let assigned = dir
        .list(&AuditQuery {
            action: Some(AuditAction::RoleAssign),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].actor_id, Some(UserId::new("1")));
    assert_eq!(assigned[0].target_id.as_deref(), Some("3"));
}

#[tokio::test]
async fn role_admin_reports_unknowns_and_noops() {
    let dir = directory();
    let tx = dir.begin();
    let audit = AuditLogger::new(tx.clone(), AuditConfig::default());
    let admin = RoleAdmin::new(tx.as_ref(), &audit);
    let actor = UserId::new("1");

    let unchanged = admin
        .revoke(&actor, &UserId::new("5"), "staff", AuditSource::default())
        .await
        .unwrap();
    assert!(!unchanged);

    let err = admin
        .assign(&actor, &UserId::new("3"), "wizard", AuditSource::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound { .. }));
    assert!(err.is_client_error());

    let err = admin
        .assign(&actor, &UserId::new("404"), "staff", AuditSource::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound { .. }));

    tx.commit().await.unwrap();
    assert!(all_entries(&dir).await.is_empty());
}

#[tokio::test]
async fn role_change_rolls_back_when_audit_fails() {
    let dir = directory();
    dir.set_audit_unavailable(true);
    let stu = UserId::new("3");

    {
        let tx = dir.begin();
        let audit = AuditLogger::new(tx.clone(), AuditConfig::default());
        let result = RoleAdmin::new(tx.as_ref(), &audit)
            .assign(&UserId::new("1"), &stu, "staff", AuditSource::default())
            .await;
        assert!(matches!(result, Err(AuthError::Storage(_))));
    }

    assert!(!dir.roles_of(&stu).await.unwrap().contains("staff"));
}
