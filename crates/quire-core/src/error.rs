//! Page operation errors
//!
//! Typed errors for requests against the remote page API. Every failure is
//! scoped to the operation that triggered it; none is fatal to the process.

use thiserror::Error;

use crate::models::PageId;

/// Errors that can occur while talking to the remote page store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Request was rejected or could not be sent
    #[error("{operation} failed: {message}")]
    NetworkFailure { operation: String, message: String },

    /// Requested page does not exist on the server
    #[error("Page not found: '{page_id}'")]
    NotFound { page_id: PageId },

    /// Response did not have the expected shape
    #[error("{operation} returned an unexpected response: {details}")]
    Unconfirmed { operation: String, details: String },
}

impl PageError {
    pub fn network(operation: &str, message: impl Into<String>) -> Self {
        PageError::NetworkFailure {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(page_id: &PageId) -> Self {
        PageError::NotFound {
            page_id: page_id.clone(),
        }
    }

    pub fn unconfirmed(operation: &str, details: impl Into<String>) -> Self {
        PageError::Unconfirmed {
            operation: operation.to_string(),
            details: details.into(),
        }
    }

    /// Check if this is a missing-page error
    pub fn is_not_found(&self) -> bool {
        matches!(self, PageError::NotFound { .. })
    }

    /// Check if repeating the same request could succeed
    ///
    /// Only transport failures qualify; a missing page or a malformed
    /// response will not fix itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PageError::NetworkFailure { .. })
    }
}

/// Result type for page operations
pub type PageResult<T> = Result<T, PageError>;
