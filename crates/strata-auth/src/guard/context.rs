//! Explicit per-request context threaded into every guard call.

use std::collections::HashMap;
use std::net::IpAddr;

use crate::audit::AuditSource;
use crate::types::UserId;

/// Resolved subject plus request metadata.
///
/// The subject is whatever the session layer resolved. The guard treats it
/// as a claim only and re-reads the user from the directory before deciding.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Subject resolved by the session layer, if any.
    pub subject: Option<UserId>,

    /// Caller address and agent for audit entries.
    pub source: AuditSource,

    /// Path parameters of the matched route (e.g. `file_id`).
    pub params: HashMap<String, String>,
}

impl RequestContext {
    /// Creates an empty (anonymous) context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context for an already-resolved subject.
    #[must_use]
    pub fn for_subject(subject: impl Into<UserId>) -> Self {
        Self::new().with_subject(subject)
    }

    /// Set the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<UserId>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set a path parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the caller address.
    #[must_use]
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.source.ip_address = Some(ip);
        self
    }

    /// Set the caller agent string.
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.source.user_agent = Some(agent.into());
        self
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}
