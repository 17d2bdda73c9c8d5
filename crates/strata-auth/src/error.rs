//! Authorization error types.
//!
//! Denials, missing sessions and missing targets are *outcomes* of a guard
//! invocation (see [`crate::guard::GuardOutcome`]), not errors. `AuthError`
//! covers the failures that abort a request outright.

use std::fmt;

use crate::storage::StoreError;

/// Errors that can occur during authorization and administration operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A referenced user, role or resource does not exist.
    #[error("Not found: {target_type}/{target_id}")]
    NotFound {
        /// Kind of the missing entity.
        target_type: String,
        /// Identifier that was looked up.
        target_id: String,
    },

    /// The request is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The directory store or audit sink failed.
    ///
    /// Always fatal: the surrounding request transaction must be rolled back.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(target_type: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self::NotFound {
            target_type: target_type.into(),
            target_id: target_id.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error from an unavailable backend.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(StoreError::unavailable(message))
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidRequest { .. })
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } | Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Storage(_) => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request validation errors.
    Validation,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
