//! Secure types for handling sensitive data.
//!
//! This module provides types that prevent accidental exposure of secret
//! material through logging, debugging, or error messages.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum secret payload size accepted from any source (64 KiB).
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// A byte-buffer wrapper that redacts its contents in Debug, Display, and
/// serialization.
///
/// Secret payloads are opaque bytes fetched from a remote store. This type
/// ensures they are never accidentally logged, printed, or serialized. The
/// actual value can only be accessed via explicit method calls.
///
/// # Security
///
/// - Debug output shows `SecretPayload([REDACTED])` instead of the bytes
/// - Display output shows `[REDACTED]`
/// - Serialization outputs `"[REDACTED]"` (NEVER the actual value)
/// - **Memory is securely zeroed when dropped** (via `zeroize`)
/// - To read the bytes, you must call `expose()` explicitly
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretPayload(Vec<u8>);

impl SecretPayload {
    /// Creates a new payload from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Exposes the underlying bytes.
    ///
    /// # Security Warning
    ///
    /// Only use this where the material is actually consumed (writing to a
    /// delivery target). Never log or print the result.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Returns the payload length without exposing the bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretPayload {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Never serialize the actual payload; this keeps structured events
        // and any serialized state free of secret material.
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretPayload {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Vec::<u8>::deserialize(deserializer)?;
        Ok(SecretPayload(value))
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretPayload([REDACTED])")
    }
}

impl fmt::Display for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretPayload {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretPayload {}

impl From<Vec<u8>> for SecretPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for SecretPayload {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl From<&str> for SecretPayload {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}
