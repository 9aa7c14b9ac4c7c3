//! Secret value model.
//!
//! A [`Secret`] is a named, versioned piece of opaque sensitive data. The
//! version token is supplied by the remote store and treated as opaque: the
//! controller only ever compares versions for equality, never for order.
//! Payload bytes live in a [`SecretPayload`] that redacts itself everywhere
//! and zeroes its memory on drop.

pub mod types;

pub use types::{SecretPayload, MAX_PAYLOAD_BYTES};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A secret's name, unique within the controller's configuration.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretName(String);

impl SecretName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SecretName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SecretName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// An opaque version token assigned by the remote store.
///
/// Tokens are compared only for equality. A change in token, in any
/// direction the store chooses, means the secret rotated.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretVersion(String);

impl SecretVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SecretVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SecretVersion {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A successfully fetched secret: name, store-assigned version, payload, and
/// the time the fetch completed.
///
/// Instances only exist for verified fetches. Partial fetches fail at the
/// source boundary and never produce a `Secret`.
#[derive(Debug, Clone, PartialEq)]
pub struct Secret {
    pub name: SecretName,
    pub version: SecretVersion,
    pub payload: SecretPayload,
    pub fetched_at: DateTime<Utc>,
}

impl Secret {
    /// Build a secret record for a fetch that completed now.
    pub fn new(
        name: impl Into<SecretName>,
        version: impl Into<SecretVersion>,
        payload: impl Into<SecretPayload>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            payload: payload.into(),
            fetched_at: Utc::now(),
        }
    }
}
