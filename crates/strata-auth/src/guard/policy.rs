//! Policy guard combinators.
//!
//! A [`PolicyGuard`] is a plain value describing what an operation requires.
//! Guards compose with [`PolicyGuard::and`] and wrap an operation with
//! [`PolicyGuard::wrap`], producing a new handler value ([`Guarded`]).
//!
//! ```ignore
//! let download = PolicyGuard::permission("file.download")
//!     .and(PolicyGuard::clearance(TargetResolver::path_param("file", "file_id")))
//!     .audit_success(AuditAction::FileDownload)
//!     .wrap(|authorized: Authorized| async move { Ok(authorized.target().cloned()) });
//!
//! match download.call(&services, &ctx).await? {
//!     GuardOutcome::Allowed(file) => { /* stream it */ }
//!     other => { /* redirect with other.message() */ }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::AuthResult;
use crate::audit::{AuditAction, AuditDetail, AuditLogger, NewAuditEntry};
use crate::evaluator::{PermissionEvaluator, can_access};
use crate::storage::DirectoryStore;
use crate::types::{ProtectedResource, User};

use super::context::RequestContext;
use super::outcome::{Denial, DenialContext, GuardOutcome, UnauthenticatedReason};

// =============================================================================
// Services
// =============================================================================

/// The collaborators a guard consults: the directory and the audit logger.
///
/// Build one per request when the backend is transactional, so the reads and
/// the audit write of a decision share a transaction.
#[derive(Clone)]
pub struct GuardServices {
    directory: Arc<dyn DirectoryStore>,
    audit: AuditLogger,
}

impl GuardServices {
    /// Creates the service bundle.
    pub fn new(directory: Arc<dyn DirectoryStore>, audit: AuditLogger) -> Self {
        Self { directory, audit }
    }

    /// Returns the directory store.
    pub fn directory(&self) -> &dyn DirectoryStore {
        self.directory.as_ref()
    }

    /// Returns the audit logger.
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Returns a permission evaluator over the directory.
    pub fn permissions(&self) -> PermissionEvaluator<'_> {
        PermissionEvaluator::new(self.directory.as_ref())
    }
}

// =============================================================================
// Target Resolver
// =============================================================================

/// Locates the classified target of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResolver {
    target_type: String,
    param: Option<String>,
    fallback_id: Option<String>,
}

impl TargetResolver {
    /// Reads the target id from a path parameter.
    #[must_use]
    pub fn path_param(target_type: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            param: Some(param.into()),
            fallback_id: None,
        }
    }

    /// Always targets the given id.
    #[must_use]
    pub fn fixed(target_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            param: None,
            fallback_id: Some(id.into()),
        }
    }

    /// Uses `id` when the path parameter is absent.
    #[must_use]
    pub fn or_fixed(mut self, id: impl Into<String>) -> Self {
        self.fallback_id = Some(id.into());
        self
    }

    /// Returns the target type.
    #[must_use]
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Resolves the concrete target id for a request.
    #[must_use]
    pub fn resolve(&self, ctx: &RequestContext) -> Option<String> {
        self.param
            .as_deref()
            .and_then(|name| ctx.param(name))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| self.fallback_id.clone())
    }
}

// =============================================================================
// Requirements
// =============================================================================

/// A single predicate a guard enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// RBAC: the subject must hold this permission.
    Permission(String),
    /// MAC: the subject's clearance must dominate the target's classification.
    Clearance(TargetResolver),
}

// =============================================================================
// Authorized
// =============================================================================

/// What a wrapped operation receives once every requirement has passed.
#[derive(Debug, Clone)]
pub struct Authorized {
    /// The live user record read at decision time.
    pub user: User,
    /// Classified targets resolved by clearance requirements, in order.
    pub targets: Vec<ProtectedResource>,
}

impl Authorized {
    /// Returns the first resolved target, if any.
    #[must_use]
    pub fn target(&self) -> Option<&ProtectedResource> {
        self.targets.first()
    }
}

// =============================================================================
// Policy Guard
// =============================================================================

/// Composable authorization requirements for one operation.
///
/// A guard carries no state between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyGuard {
    requirements: Vec<Requirement>,
    success_action: Option<AuditAction>,
}

impl PolicyGuard {
    /// A guard that only requires an authenticated, active subject.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Requires a permission.
    #[must_use]
    pub fn permission(name: impl Into<String>) -> Self {
        Self {
            requirements: vec![Requirement::Permission(name.into())],
            success_action: None,
        }
    }

    /// Requires clearance over the resolved target.
    #[must_use]
    pub fn clearance(resolver: TargetResolver) -> Self {
        Self {
            requirements: vec![Requirement::Clearance(resolver)],
            success_action: None,
        }
    }

    /// Conjunction: both guards' requirements must hold, `self`'s first.
    #[must_use]
    pub fn and(mut self, other: PolicyGuard) -> Self {
        self.requirements.extend(other.requirements);
        self.success_action = self.success_action.or(other.success_action);
        self
    }

    /// Records a success entry with this action after the operation succeeds.
    #[must_use]
    pub fn audit_success(mut self, action: AuditAction) -> Self {
        self.success_action = Some(action);
        self
    }

    /// Returns the requirements in evaluation order.
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Wraps an operation, producing a guarded handler.
    #[must_use]
    pub fn wrap<F>(self, operation: F) -> Guarded<F> {
        Guarded {
            guard: self,
            operation,
        }
    }

    /// Runs the decision without invoking any operation.
    ///
    /// Denials are audited here. On success the caller receives the live
    /// user and resolved targets.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be read or the denial
    /// could not be recorded.
    pub async fn authorize(
        &self,
        services: &GuardServices,
        ctx: &RequestContext,
    ) -> AuthResult<GuardOutcome<Authorized>> {
        // 1. Subject presence.
        let Some(subject) = ctx.subject.as_ref() else {
            tracing::debug!("Access denied: no session");
            return Ok(GuardOutcome::Unauthenticated(
                UnauthenticatedReason::NoSession,
            ));
        };

        // 2. Liveness, re-read at decision time.
        let user = match services.directory().find_user(subject).await? {
            Some(user) if user.is_active() => user,
            _ => {
                tracing::info!(user_id = %subject, "Session subject unknown or inactive");
                return Ok(GuardOutcome::Unauthenticated(
                    UnauthenticatedReason::SessionExpired,
                ));
            }
        };

        // 3. Resolve classified targets before evaluating anything.
        let mut targets = Vec::new();
        for requirement in &self.requirements {
            let Requirement::Clearance(resolver) = requirement else {
                continue;
            };
            let target_id = resolver.resolve(ctx);
            let resource = match &target_id {
                Some(id) => {
                    services
                        .directory()
                        .find_resource(resolver.target_type(), id)
                        .await?
                }
                None => None,
            };
            match resource {
                Some(resource) => targets.push(resource),
                None => {
                    tracing::debug!(
                        target_type = resolver.target_type(),
                        target_id = ?target_id,
                        "Guarded target not found"
                    );
                    return Ok(GuardOutcome::NotFound {
                        target_type: resolver.target_type().to_string(),
                        target_id,
                    });
                }
            }
        }

        // 4. Evaluate in declaration order; the first failure is recorded.
        let permissions = services.permissions();
        let mut resolved = targets.iter();
        for requirement in &self.requirements {
            let failure = match requirement {
                Requirement::Permission(name) => {
                    if permissions.check(&user, name).await? {
                        None
                    } else {
                        Some(DenialContext::MissingPermission {
                            required_permission: name.clone(),
                        })
                    }
                }
                Requirement::Clearance(_) => {
                    let Some(resource) = resolved.next() else {
                        return Err(crate::AuthError::internal(
                            "clearance requirement without resolved target",
                        ));
                    };
                    if can_access(&user.clearance, &resource.classification) {
                        None
                    } else {
                        Some(DenialContext::InsufficientClearance {
                            subject_clearance: user.clearance.clone(),
                            resource_classification: resource.classification.clone(),
                            target_type: resource.target_type.clone(),
                            target_id: resource.id.clone(),
                        })
                    }
                }
            };

            if let Some(context) = failure {
                return self.deny(services, ctx, &user, context).await;
            }
        }

        tracing::debug!(
            user_id = %user.id,
            requirements = self.requirements.len(),
            "Access granted"
        );
        Ok(GuardOutcome::Allowed(Authorized { user, targets }))
    }

    /// 5. Record exactly one denial entry, then surface the denial.
    async fn deny(
        &self,
        services: &GuardServices,
        ctx: &RequestContext,
        user: &User,
        context: DenialContext,
    ) -> AuthResult<GuardOutcome<Authorized>> {
        let (target_type, target_id) = context.audit_target();
        let entry = NewAuditEntry::denied(context.audit_action())
            .actor(&user.id)
            .target(target_type, target_id)
            .detail(context.audit_detail())
            .source(ctx.source.clone());

        let stored = services.audit().record(entry).await?;

        tracing::info!(
            user_id = %user.id,
            action = %context.audit_action(),
            audit_id = stored.id,
            "Access denied"
        );
        Ok(GuardOutcome::Denied(Denial {
            context,
            audit_id: stored.id,
        }))
    }

    async fn record_success(
        &self,
        services: &GuardServices,
        ctx: &RequestContext,
        authorized: &Authorized,
    ) -> AuthResult<()> {
        let Some(action) = self.success_action else {
            return Ok(());
        };
        let mut entry = NewAuditEntry::success(action)
            .actor(&authorized.user.id)
            .source(ctx.source.clone());
        if let Some(target) = authorized.target() {
            entry = entry
                .target(target.target_type.clone(), Some(target.id.clone()))
                .detail(AuditDetail::ResourceAccess {
                    classification: target.classification.clone(),
                });
        }
        services.audit().record_success(entry).await?;
        Ok(())
    }
}

// =============================================================================
// Guarded Operation
// =============================================================================

/// An operation wrapped by a guard.
///
/// Calling it runs the decision and, only when every requirement passes,
/// the operation.
#[derive(Debug, Clone)]
pub struct Guarded<F> {
    guard: PolicyGuard,
    operation: F,
}

impl<F> Guarded<F> {
    /// Returns the guard.
    pub fn guard(&self) -> &PolicyGuard {
        &self.guard
    }

    /// Runs the guarded operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or audit sink fails, or if the
    /// operation itself fails. In either case the caller must roll back the
    /// request transaction.
    pub async fn call<T, Fut>(
        &self,
        services: &GuardServices,
        ctx: &RequestContext,
    ) -> AuthResult<GuardOutcome<T>>
    where
        F: Fn(Authorized) -> Fut,
        Fut: Future<Output = AuthResult<T>>,
    {
        let authorized = match self.guard.authorize(services, ctx).await? {
            GuardOutcome::Allowed(authorized) => authorized,
            GuardOutcome::Unauthenticated(reason) => {
                return Ok(GuardOutcome::Unauthenticated(reason));
            }
            GuardOutcome::NotFound {
                target_type,
                target_id,
            } => {
                return Ok(GuardOutcome::NotFound {
                    target_type,
                    target_id,
                });
            }
            GuardOutcome::Denied(denial) => return Ok(GuardOutcome::Denied(denial)),
        };

        // Keep what the success entry needs; the operation consumes the rest.
        let audit_view = self
            .guard
            .success_action
            .is_some()
            .then(|| authorized.clone());

        let value = (self.operation)(authorized).await?;

        if let Some(view) = audit_view {
            self.guard.record_success(services, ctx, &view).await?;
        }
        Ok(GuardOutcome::Allowed(value))
    }
}
