//! # strata-auth
//!
//! Authorization decision engine combining role-based access control over
//! actions with mandatory access control over classified resources, coupled
//! to an append-only audit trail.
//!
//! ## Modules
//!
//! - [`types`] - users, roles, permissions, security labels, classified resources
//! - [`evaluator`] - permission (RBAC) and clearance (MAC) evaluators
//! - [`guard`] - policy guard combinators and outcomes
//! - [`audit`] - audit entries and the audit logger
//! - [`admin`] - audited role assignment
//! - [`storage`] - directory store and audit sink traits
//! - [`config`] - audit configuration

pub mod admin;
pub mod audit;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod storage;
pub mod types;

pub use admin::RoleAdmin;
pub use audit::{
    AuditAction, AuditDetail, AuditEntry, AuditLogger, AuditQuery, AuditResult, AuditSource,
    NewAuditEntry,
};
pub use config::{AuditConfig, AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use evaluator::{ClearanceEvaluator, PermissionEvaluator, can_access};
pub use guard::{
    Authorized, Denial, DenialContext, DenialKind, GuardOutcome, GuardServices, Guarded,
    PolicyGuard, RequestContext, Requirement, TargetResolver, UnauthenticatedReason,
};
pub use storage::{
    AssignmentChange, AuditSink, DirectoryStore, RoleAssignment, StoreError, StoreResult,
};
pub use types::{
    ClearanceLevel, FILE_TARGET, Permission, ProtectedResource, Role, SecurityLabel, User, UserId,
};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use strata_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::audit::{AuditAction, AuditLogger, AuditSource};
    pub use crate::error::AuthError;
    pub use crate::guard::{
        Authorized, GuardOutcome, GuardServices, PolicyGuard, RequestContext, TargetResolver,
    };
    pub use crate::storage::{AuditSink, DirectoryStore, RoleAssignment};
    pub use crate::types::{ClearanceLevel, SecurityLabel, User, UserId};
}
