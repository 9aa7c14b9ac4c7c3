//! # Error Handling
//!
//! Crate-wide error types for the keyline controller, built on `thiserror`.
//!
//! The taxonomy mirrors how failures are handled at the reconciler boundary:
//! source errors carry a transient/permanent classification that decides
//! whether the reconciler backs off and retries or parks the secret in a
//! failing state awaiting operator intervention. Delivery errors are always
//! surfaced and retried with backoff.

use crate::source::SourceError;

/// Custom result type for keyline operations.
pub type Result<T> = std::result::Result<T, KeylineError>;

/// Main error type for the keyline controller.
#[derive(thiserror::Error, Debug)]
pub enum KeylineError {
    /// Configuration errors (invalid settings file, failed validation)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Remote secret source errors
    #[error("Source error for secret '{name}': {source}")]
    Source {
        name: String,
        #[source]
        source: SourceError,
    },

    /// Failure to atomically apply a secret to its delivery target
    #[error("Delivery error for target '{target}': {message}")]
    Delivery {
        target: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl KeylineError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with a source error
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error scoped to a field
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Wrap a source error with the secret name it occurred for
    pub fn source_error<N: Into<String>>(name: N, source: SourceError) -> Self {
        Self::Source { name: name.into(), source }
    }

    /// Create a delivery error
    pub fn delivery<T: Into<String>, M: Into<String>>(target: T, message: M) -> Self {
        Self::Delivery { target: target.into(), message: message.into(), source: None }
    }

    /// Create a delivery error with a source error
    pub fn delivery_with_source<T: Into<String>, M: Into<String>>(
        target: T,
        message: M,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Delivery { target: target.into(), message: message.into(), source: Some(source) }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Whether retrying this operation can succeed without operator action.
    ///
    /// Drives the reconciler's transition into backed-off retry versus the
    /// absorbing failing state.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source { source, .. } => source.is_transient(),
            Self::Delivery { .. } | Self::Io { .. } => true,
            Self::Config { .. }
            | Self::Validation { .. }
            | Self::Serialization { .. }
            | Self::Internal { .. } => false,
        }
    }
}

impl From<validator::ValidationErrors> for KeylineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::validation(format!("Settings validation failed: {}", errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = KeylineError::config("bad settings");
        assert!(matches!(err, KeylineError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: bad settings");

        let err = KeylineError::validation_field("interval must be nonzero", "interval_secs");
        assert!(matches!(err, KeylineError::Validation { field: Some(_), .. }));

        let err = KeylineError::delivery("/run/secrets/api-key", "rename failed");
        assert!(err.to_string().contains("/run/secrets/api-key"));
    }

    #[test]
    fn test_retryable_classification() {
        let transient = KeylineError::source_error("db-password", SourceError::unavailable("503"));
        assert!(transient.is_retryable());

        let permanent = KeylineError::source_error("db-password", SourceError::not_found("gone"));
        assert!(!permanent.is_retryable());

        assert!(KeylineError::delivery("target", "partial write").is_retryable());
        assert!(!KeylineError::config("broken").is_retryable());
    }
}
