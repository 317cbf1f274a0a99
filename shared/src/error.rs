//! Error types for ledger operations
//!
//! Every operation of the engine fails with exactly one of these kinds.
//! Business-rule violations are raised before commit, so a returned error
//! always means no state was written.

use thiserror::Error;

/// Unified error type for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed input: bad dates, empty line lists, non-finite amounts
    #[error("{message}")]
    InvalidInput { message: String },

    /// FEFO plan or commit-time re-check cannot satisfy the requested
    /// quantity from valid (non-expired, available) batches
    #[error("{message}")]
    InsufficientStock {
        item_id: i64,
        requested: i64,
        available: i64,
        message: String,
    },

    /// The document is already void
    #[error("{resource} is already void")]
    AlreadyVoid { resource: String },

    /// A void cannot be applied without breaking stock invariants
    #[error("cannot reverse: {message}")]
    CannotReverse { message: String },

    /// Referenced document does not exist
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Concurrent modification reported by the storage layer; the whole
    /// operation is safe to retry from the top
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Storage failure
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl LedgerError {
    // ========== Convenient constructors ==========

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    pub fn already_void(resource: impl Into<String>) -> Self {
        Self::AlreadyVoid { resource: resource.into() }
    }

    pub fn cannot_reverse(message: impl Into<String>) -> Self {
        Self::CannotReverse { message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }

    /// True for errors where retrying the whole operation can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
