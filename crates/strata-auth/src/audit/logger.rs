//! Audit logger service.

use std::sync::Arc;

use crate::AuthResult;
use crate::config::AuditConfig;
use crate::storage::AuditSink;

use super::entry::{AuditEntry, AuditQuery, AuditResult, NewAuditEntry};

/// Writes audit entries to a sink.
///
/// Writes are awaited to completion. A failed write is returned to the
/// caller as [`crate::AuthError::Storage`]; it is never swallowed.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
    config: AuditConfig,
}

impl AuditLogger {
    /// Creates a logger over the given sink.
    pub fn new(sink: Arc<dyn AuditSink>, config: AuditConfig) -> Self {
        Self { sink, config }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Returns `true` if optional success entries should be written.
    pub fn logs_allowed_decisions(&self) -> bool {
        self.config.log_allowed_decisions
    }

    /// Records one entry.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the sink rejects the write.
    pub async fn record(&self, entry: NewAuditEntry) -> AuthResult<AuditEntry> {
        let entry = self.prepare(entry);
        let action = entry.action;
        let result = entry.result;

        match self.sink.append(entry).await {
            Ok(stored) => {
                tracing::debug!(
                    audit_id = stored.id,
                    action = %action,
                    result = %result,
                    "Audit entry recorded"
                );
                Ok(stored)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    action = %action,
                    result = %result,
                    "Failed to record audit entry"
                );
                Err(e.into())
            }
        }
    }

    /// Records a success entry if allowed decisions are being logged.
    ///
    /// Returns `Ok(None)` when success logging is disabled.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the sink rejects the write.
    pub async fn record_success(&self, entry: NewAuditEntry) -> AuthResult<Option<AuditEntry>> {
        debug_assert_eq!(entry.result, AuditResult::Success);
        if !self.config.log_allowed_decisions {
            return Ok(None);
        }
        self.record(entry).await.map(Some)
    }

    /// Lists entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the sink cannot be read.
    pub async fn list(&self, query: &AuditQuery) -> AuthResult<Vec<AuditEntry>> {
        Ok(self.sink.list(query).await?)
    }

    fn prepare(&self, mut entry: NewAuditEntry) -> NewAuditEntry {
        if !self.config.capture_request_metadata {
            entry.source = Default::default();
            return entry;
        }
        if let Some(agent) = entry.source.user_agent.as_mut() {
            truncate_at_char_boundary(agent, self.config.max_user_agent_len);
        }
        entry
    }
}

fn truncate_at_char_boundary(value: &mut String, max_len: usize) {
    if value.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    value.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        let mut agent = "Mozilla/5.0".to_string();
        truncate_at_char_boundary(&mut agent, 7);
        assert_eq!(agent, "Mozilla");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // 'é' is two bytes; cutting at 2 would split it.
        let mut agent = "aéb".to_string();
        truncate_at_char_boundary(&mut agent, 2);
        assert_eq!(agent, "a");
    }

    #[test]
    fn test_truncate_noop_when_short() {
        let mut agent = "curl".to_string();
        truncate_at_char_boundary(&mut agent, 512);
        assert_eq!(agent, "curl");
    }
}
