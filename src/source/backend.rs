//! Secret source trait and types
//!
//! Defines the core interface for pluggable remote secret stores.

use super::error::SourceError;
use crate::secrets::{Secret, SecretName, MAX_PAYLOAD_BYTES};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of secret source backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// HashiCorp Vault KV v2
    Vault,
    /// Generic HTTP secret-manager API
    Http,
    /// Environment variables (development only)
    Env,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vault => "vault",
            Self::Http => "http",
            Self::Env => "env",
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "vault" => Ok(Self::Vault),
            "http" => Ok(Self::Http),
            "env" => Ok(Self::Env),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for remote secret stores.
///
/// A fetch is read-only and has no side effects on the store. Implementations
/// must map their transport errors into the [`SourceError`] taxonomy and must
/// not log payload content at any verbosity level.
#[async_trait]
pub trait SecretSource: Send + Sync + fmt::Debug {
    /// Fetch the current version of a secret by name.
    ///
    /// Returns a fully verified [`Secret`]; a partially fetched or
    /// undecodable response is an error, never a truncated secret.
    async fn fetch(&self, name: &SecretName) -> std::result::Result<Secret, SourceError>;

    /// Get the backend type identifier
    fn kind(&self) -> SourceKind;
}

/// Reject payloads above the controller's size bound.
///
/// Applied by every backend before constructing a [`Secret`], so oversized
/// material never reaches the cache or a delivery target.
pub(crate) fn check_payload_size(size: usize) -> std::result::Result<(), SourceError> {
    if size > MAX_PAYLOAD_BYTES {
        return Err(SourceError::PayloadTooLarge { size, limit: MAX_PAYLOAD_BYTES });
    }
    Ok(())
}
