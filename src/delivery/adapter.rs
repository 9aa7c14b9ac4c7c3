//! Delivery adapter trait and target descriptors
//!
//! Defines the single contract by which a secret reaches a running workload.

use crate::errors::Result;
use crate::secrets::Secret;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a secret must be materialized.
///
/// Built once from configuration at startup, owned one-to-one by a secret
/// name, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryTarget {
    /// A file on a mounted volume, replaced atomically on rotation.
    File {
        path: PathBuf,
        /// Unix permission bits for the delivered file.
        #[serde(default = "default_file_mode")]
        mode: u32,
    },
    /// A named remote object replaced with a single full-replacement call.
    Object { url: String },
    /// An in-memory slot, for tests and dry runs.
    Memory { key: String },
}

fn default_file_mode() -> u32 {
    0o600
}

impl DeliveryTarget {
    /// The adapter family this target belongs to.
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::File { .. } => TargetKind::File,
            Self::Object { .. } => TargetKind::Object,
            Self::Memory { .. } => TargetKind::Memory,
        }
    }
}

impl fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, .. } => write!(f, "file:{}", path.display()),
            Self::Object { url } => write!(f, "object:{}", url),
            Self::Memory { key } => write!(f, "memory:{}", key),
        }
    }
}

/// Delivery mechanism family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    File,
    Object,
    Memory,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Object => "object",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for delivery mechanisms.
///
/// The one guarantee every implementation must uphold is atomicity: a
/// consumer observes the target either entirely in its prior state or
/// entirely in its new state, never a torn intermediate. On failure the
/// prior delivered state must remain intact and the operation reported as
/// failed, never left ambiguous.
#[async_trait]
pub trait DeliveryAdapter: Send + Sync + fmt::Debug {
    /// Atomically materialize `secret` into `target`.
    async fn apply(&self, target: &DeliveryTarget, secret: &Secret) -> Result<()>;

    /// Get the adapter's mechanism family
    fn kind(&self) -> TargetKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display() {
        let file = DeliveryTarget::File { path: PathBuf::from("/run/secrets/key"), mode: 0o600 };
        assert_eq!(file.to_string(), "file:/run/secrets/key");

        let memory = DeliveryTarget::Memory { key: "slot".to_string() };
        assert_eq!(memory.to_string(), "memory:slot");
    }

    #[test]
    fn test_target_kind() {
        let object = DeliveryTarget::Object { url: "https://cluster/api/secrets/x".to_string() };
        assert_eq!(object.kind(), TargetKind::Object);
        assert_eq!(object.kind().to_string(), "object");
    }

    #[test]
    fn test_file_target_default_mode() {
        let yaml = "kind: file\npath: /run/secrets/key";
        let target: DeliveryTarget = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(target, DeliveryTarget::File { path: PathBuf::from("/run/secrets/key"), mode: 0o600 });
    }
}
