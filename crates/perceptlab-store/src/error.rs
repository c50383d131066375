//! Store error types.
//!
//! Typed here so callers can classify persistence failures without string
//! matching. The core never retries on any of these; it logs, degrades,
//! or (for session creation only) surfaces the failure.

use thiserror::Error;

/// Errors that can occur when talking to a session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The service returned a non-success HTTP status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The referenced session does not exist on the service.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The service responded with a payload this crate cannot decode.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Returns `true` when the referenced session is gone on the service.
    /// Appends to a missing session can never succeed on retry.
    pub fn is_session_missing(&self) -> bool {
        matches!(self, StoreError::SessionNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_predicates() {
        let err = StoreError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 500): boom");
        assert!(!err.is_session_missing());
        assert!(StoreError::SessionNotFound("s1".into()).is_session_missing());
    }
}
