//! Store error types.
//!
//! Errors raised by directory and audit sink backends. They are always fatal
//! to the current request.

/// Errors that can occur while reading the directory or writing the audit trail.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// A write conflicted with concurrent state (e.g. a finished transaction).
    #[error("Store conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// An unexpected backend error.
    #[error("Store internal error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
