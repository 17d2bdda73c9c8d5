//! Audit entry types.
//!
//! An entry is written once and never updated. The sink assigns the id and
//! the timestamp; callers only describe *what* happened through
//! [`NewAuditEntry`].

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{SecurityLabel, UserId};

// =============================================================================
// Action / Result
// =============================================================================

/// Audited action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A permission requirement failed.
    RbacDenied,
    /// A clearance requirement failed.
    MacDenied,
    /// A classified file was downloaded.
    FileDownload,
    /// A role was assigned to a user.
    RoleAssign,
    /// A role was revoked from a user.
    RoleRevoke,
}

impl AuditAction {
    /// Returns the persisted action tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RbacDenied => "rbac_denied",
            Self::MacDenied => "mac_denied",
            Self::FileDownload => "file_download",
            Self::RoleAssign => "role_assign",
            Self::RoleRevoke => "role_revoke",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome recorded on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditResult {
    /// The action was permitted and carried out.
    Success,
    /// A requirement failed and the action did not run.
    Denied,
}

impl AuditResult {
    /// Returns the persisted result tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Detail Payload
// =============================================================================

/// Structured detail payload, one variant per action family.
///
/// Serialized untagged, so the JSON object carries only the variant's fields
/// (e.g. `{"required_permission": "admin.manage_roles"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuditDetail {
    /// Payload of `rbac_denied`.
    RbacDenied { required_permission: String },

    /// Payload of `mac_denied`.
    MacDenied {
        #[serde(rename = "user_clearance")]
        subject_clearance: SecurityLabel,
        #[serde(rename = "file_classification")]
        resource_classification: SecurityLabel,
    },

    /// Payload of role assignment changes.
    RoleChange { user_id: UserId, role: String },

    /// Payload of audited successful access to a classified resource.
    ResourceAccess { classification: SecurityLabel },
}

// =============================================================================
// Source
// =============================================================================

/// Originating request metadata, captured when available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSource {
    /// Caller network address.
    pub ip_address: Option<IpAddr>,
    /// Caller agent string.
    pub user_agent: Option<String>,
}

impl AuditSource {
    /// Returns `true` if no metadata was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ip_address.is_none() && self.user_agent.is_none()
    }
}

// =============================================================================
// New Entry Builder
// =============================================================================

/// An entry as described by the caller, before the sink stamps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    /// User who attempted the action, if one was resolved.
    pub actor_id: Option<UserId>,
    pub action: AuditAction,
    /// Kind of the object acted on (`"file"`, `"permission"`, `"user"`).
    pub target_type: Option<String>,
    /// Identifier of the object acted on.
    pub target_id: Option<String>,
    pub result: AuditResult,
    /// Action-specific payload.
    pub detail: Option<AuditDetail>,
    /// Request metadata; empty when capture is disabled.
    pub source: AuditSource,
}

impl NewAuditEntry {
    /// Starts an entry for the given action and result.
    #[must_use]
    pub fn new(action: AuditAction, result: AuditResult) -> Self {
        Self {
            actor_id: None,
            action,
            target_type: None,
            target_id: None,
            result,
            detail: None,
            source: AuditSource::default(),
        }
    }

    /// Starts a `denied` entry.
    #[must_use]
    pub fn denied(action: AuditAction) -> Self {
        Self::new(action, AuditResult::Denied)
    }

    /// Starts a `success` entry.
    #[must_use]
    pub fn success(action: AuditAction) -> Self {
        Self::new(action, AuditResult::Success)
    }

    /// Set the acting user.
    #[must_use]
    pub fn actor(mut self, actor: &UserId) -> Self {
        self.actor_id = Some(actor.clone());
        self
    }

    /// Set the target.
    #[must_use]
    pub fn target(mut self, target_type: impl Into<String>, target_id: Option<String>) -> Self {
        self.target_type = Some(target_type.into());
        self.target_id = target_id;
        self
    }

    /// Set the detail payload.
    #[must_use]
    pub fn detail(mut self, detail: AuditDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Set the request metadata.
    #[must_use]
    pub fn source(mut self, source: AuditSource) -> Self {
        self.source = source;
        self
    }
}

// =============================================================================
// Stored Entry
// =============================================================================

/// An immutable, stored audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Sink-assigned identifier, increasing in write order.
    pub id: u64,
    /// Sink-assigned write time.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    /// User who attempted the action.
    pub actor_id: Option<UserId>,
    pub action: AuditAction,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub result: AuditResult,
    pub detail: Option<AuditDetail>,
    /// Caller address, when captured.
    pub ip_address: Option<IpAddr>,
    /// Caller agent string, truncated to the configured length.
    pub user_agent: Option<String>,
}

impl AuditEntry {
    /// Stamps a new entry with its id and write time.
    #[must_use]
    pub fn stamp(id: u64, recorded_at: OffsetDateTime, entry: NewAuditEntry) -> Self {
        Self {
            id,
            recorded_at,
            actor_id: entry.actor_id,
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id,
            result: entry.result,
            detail: entry.detail,
            ip_address: entry.source.ip_address,
            user_agent: entry.source.user_agent,
        }
    }
}

// =============================================================================
// Query
// =============================================================================

/// Filter for listing audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuditQuery {
    /// Only entries by this actor.
    pub actor_id: Option<UserId>,
    /// Only entries of this action.
    pub action: Option<AuditAction>,
    /// Only entries with this result.
    pub result: Option<AuditResult>,
    /// Maximum entries to return; `None` returns everything.
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Returns `true` if the entry passes every filter.
    #[must_use]
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.actor_id
            .as_ref()
            .is_none_or(|actor| entry.actor_id.as_ref() == Some(actor))
            && self.action.is_none_or(|action| entry.action == action)
            && self.result.is_none_or(|result| entry.result == result)
    }
}

// =============================================================================
// Tests
// =============================================================================
