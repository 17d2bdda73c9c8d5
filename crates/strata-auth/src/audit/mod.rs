//! Append-only audit trail of authorization decisions.
//!
//! Every denied decision is recorded before the request is rejected.
//! Successful decisions are recorded when a guard asks for it and
//! `audit.log_allowed_decisions` is enabled.

pub mod entry;
pub mod logger;

pub use entry::{
    AuditAction, AuditDetail, AuditEntry, AuditQuery, AuditResult, AuditSource, NewAuditEntry,
};
pub use logger::AuditLogger;
