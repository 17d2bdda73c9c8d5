//! Guard outcomes.
//!
//! A guard invocation moves from pending to exactly one of these outcomes.
//! Handlers translate them: `Unauthenticated` to the login page, `Denied`
//! and `NotFound` to a redirect with [`GuardOutcome::message`], `Allowed` to
//! the normal response.

use serde::Serialize;

use crate::audit::{AuditAction, AuditDetail};
use crate::types::SecurityLabel;

// =============================================================================
// Unauthenticated
// =============================================================================

/// Why a request has no valid subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnauthenticatedReason {
    /// No subject was resolved for the request.
    NoSession,
    /// A subject was resolved but is unknown or inactive. The session
    /// should be cleared.
    SessionExpired,
}

impl UnauthenticatedReason {
    /// Returns the user-facing message.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::NoSession => "Please log in to access this page.",
            Self::SessionExpired => "Session expired. Please log in again.",
        }
    }

    /// Returns `true` if the session layer should drop its state.
    #[must_use]
    pub fn clears_session(self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

// =============================================================================
// Denial
// =============================================================================

/// Which access model rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DenialKind {
    /// Role-based: a permission requirement failed.
    Rbac,
    /// Mandatory: a clearance requirement failed.
    Mac,
}

/// The failed predicate and the values it compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialContext {
    /// The subject lacks a required permission.
    MissingPermission { required_permission: String },

    /// The subject's clearance does not dominate the target's classification.
    InsufficientClearance {
        subject_clearance: SecurityLabel,
        resource_classification: SecurityLabel,
        target_type: String,
        target_id: String,
    },
}

impl DenialContext {
    /// Returns the access model that failed.
    #[must_use]
    pub fn kind(&self) -> DenialKind {
        match self {
            Self::MissingPermission { .. } => DenialKind::Rbac,
            Self::InsufficientClearance { .. } => DenialKind::Mac,
        }
    }

    /// Returns the audit action tag for this denial.
    #[must_use]
    pub fn audit_action(&self) -> AuditAction {
        match self.kind() {
            DenialKind::Rbac => AuditAction::RbacDenied,
            DenialKind::Mac => AuditAction::MacDenied,
        }
    }

    /// Returns the audit target as `(type, id)`.
    #[must_use]
    pub fn audit_target(&self) -> (&str, Option<String>) {
        match self {
            Self::MissingPermission { .. } => ("permission", None),
            Self::InsufficientClearance {
                target_type,
                target_id,
                ..
            } => (target_type.as_str(), Some(target_id.clone())),
        }
    }

    /// Returns the audit detail payload.
    #[must_use]
    pub fn audit_detail(&self) -> AuditDetail {
        match self {
            Self::MissingPermission {
                required_permission,
            } => AuditDetail::RbacDenied {
                required_permission: required_permission.clone(),
            },
            Self::InsufficientClearance {
                subject_clearance,
                resource_classification,
                ..
            } => AuditDetail::MacDenied {
                subject_clearance: subject_clearance.clone(),
                resource_classification: resource_classification.clone(),
            },
        }
    }
}

/// A recorded denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    /// What failed.
    pub context: DenialContext,
    /// Id of the audit entry written for this denial.
    pub audit_id: u64,
}

impl Denial {
    /// Returns the access model that failed.
    #[must_use]
    pub fn kind(&self) -> DenialKind {
        self.context.kind()
    }

    /// Returns the user-facing denial message.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.context {
            DenialContext::MissingPermission {
                required_permission,
            } => format!(
                "Access Denied (RBAC): You do not have the \"{required_permission}\" permission."
            ),
            DenialContext::InsufficientClearance {
                subject_clearance,
                resource_classification,
                target_type,
                ..
            } => format!(
                "Access Denied (MAC): Your clearance level ({subject_clearance}) is insufficient \
                 for this {target_type} (classified as {resource_classification})."
            ),
        }
    }
}

// =============================================================================
// Guard Outcome
// =============================================================================

/// Final outcome of a guard invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome<T> {
    /// No valid subject. Nothing was evaluated or audited.
    Unauthenticated(UnauthenticatedReason),
    /// The classified target could not be resolved. Nothing was audited.
    NotFound {
        target_type: String,
        target_id: Option<String>,
    },
    /// A requirement failed and the denial was audited.
    Denied(Denial),
    /// Every requirement passed.
    Allowed(T),
}

impl<T> GuardOutcome<T> {
    /// Returns `true` if access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    /// Returns `true` if access was denied.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }

    /// Get the denial if access was denied.
    #[must_use]
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Denied(denial) => Some(denial),
            _ => None,
        }
    }

    /// Consumes the outcome, returning the allowed value.
    #[must_use]
    pub fn into_allowed(self) -> Option<T> {
        match self {
            Self::Allowed(value) => Some(value),
            _ => None,
        }
    }

    /// Maps the allowed value, keeping every other outcome.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GuardOutcome<U> {
        match self {
            Self::Unauthenticated(reason) => GuardOutcome::Unauthenticated(reason),
            Self::NotFound {
                target_type,
                target_id,
            } => GuardOutcome::NotFound {
                target_type,
                target_id,
            },
            Self::Denied(denial) => GuardOutcome::Denied(denial),
            Self::Allowed(value) => GuardOutcome::Allowed(f(value)),
        }
    }

    /// Returns the user-facing message for non-allowed outcomes.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Unauthenticated(reason) => Some(reason.message().to_string()),
            Self::NotFound { target_type, .. } => Some(not_found_message(target_type)),
            Self::Denied(denial) => Some(denial.message()),
            Self::Allowed(_) => None,
        }
    }
}

fn not_found_message(target_type: &str) -> String {
    let mut chars = target_type.chars();
    match chars.next() {
        Some(first) => format!("{}{} not found.", first.to_uppercase(), chars.as_str()),
        None => "Not found.".to_string(),
    }
}
