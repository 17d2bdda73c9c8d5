//! Authorization configuration.
//!
//! Denial auditing is not configurable: every denied decision is recorded.
//! The settings here only cover the optional parts of the audit trail.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth.audit]
//! log_allowed_decisions = true
//! capture_request_metadata = true
//! max_user_agent_len = 512
//! ```

use serde::{Deserialize, Serialize};

/// Root authorization configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Audit configuration.
    pub audit: AuditConfig,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Record success entries for guards that request them.
    ///
    /// When disabled, guards configured with `audit_success` skip the write.
    pub log_allowed_decisions: bool,

    /// Copy caller address and agent from the request context into entries.
    pub capture_request_metadata: bool,

    /// Agent strings longer than this are truncated before writing.
    pub max_user_agent_len: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_allowed_decisions: true,
            capture_request_metadata: true,
            max_user_agent_len: 512,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `max_user_agent_len` is zero
    /// while request metadata capture is enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audit.capture_request_metadata && self.audit.max_user_agent_len == 0 {
            return Err(ConfigError::InvalidValue(
                "audit.max_user_agent_len must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
