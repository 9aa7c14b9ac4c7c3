//! Source error taxonomy.
//!
//! Every backend maps its transport-level failures into this set. The
//! transient/permanent split is the contract the reconciler relies on:
//! transient errors are retried with backoff indefinitely, permanent errors
//! park the secret until an operator intervenes.

use thiserror::Error;

/// Errors returned by [`SecretSource::fetch`](super::SecretSource::fetch).
///
/// Messages must never contain payload content.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Authentication or authorization with the store failed. Permanent.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The named secret does not exist in the store. Permanent.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The store is unreachable or returned a server-side failure. Transient.
    #[error("unavailable: {message}")]
    Unavailable { message: String },

    /// The fetch did not complete within the deadline. Transient.
    #[error("timeout: {message}")]
    Timeout { message: String },

    /// The store responded with something the backend cannot decode. Permanent.
    #[error("malformed response: {message}")]
    Malformed { message: String },

    /// The payload exceeds the controller's size bound. Permanent.
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
}

impl SourceError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout { message: message.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed { message: message.into() }
    }

    /// Whether a retry can succeed without operator action.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SourceError::unavailable("connection refused").is_transient());
        assert!(SourceError::timeout("deadline exceeded").is_transient());

        assert!(!SourceError::unauthorized("bad token").is_transient());
        assert!(!SourceError::not_found("no such secret").is_transient());
        assert!(!SourceError::malformed("not json").is_transient());
        assert!(!SourceError::PayloadTooLarge { size: 1, limit: 0 }.is_transient());
    }

    #[test]
    fn test_display_has_no_payload_fields() {
        let err = SourceError::PayloadTooLarge { size: 70_000, limit: 65_536 };
        assert_eq!(err.to_string(), "payload of 70000 bytes exceeds the 65536 byte limit");
    }
}
