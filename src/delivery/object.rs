//! Remote object delivery adapter.
//!
//! Replaces a named remote object (a cluster secret object behind an API)
//! with a single full-replacement PUT. Atomicity comes from the single-call
//! replacement semantics of the receiving API: there is no sequence of
//! partial writes a consumer could observe halfway.

use super::adapter::{DeliveryAdapter, DeliveryTarget, TargetKind};
use crate::errors::{KeylineError, Result};
use crate::secrets::Secret;
use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Configuration for the object delivery adapter
#[derive(Debug, Clone)]
pub struct ObjectDeliveryConfig {
    /// Bearer token for the receiving API
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ObjectDeliveryConfig {
    fn default() -> Self {
        Self { token: None, timeout_secs: 10 }
    }
}

#[derive(Serialize)]
struct ReplaceObjectRequest<'a> {
    name: &'a str,
    version: &'a str,
    data: String,
}

/// Full-replacement PUT delivery for object-backed targets.
pub struct ObjectDelivery {
    client: reqwest::Client,
    token: Option<String>,
}

impl std::fmt::Debug for ObjectDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDelivery")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ObjectDelivery {
    pub fn new(config: ObjectDeliveryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                KeylineError::config(format!("Failed to build object delivery client: {}", e))
            })?;

        Ok(Self { client, token: config.token })
    }
}

#[async_trait]
impl DeliveryAdapter for ObjectDelivery {
    async fn apply(&self, target: &DeliveryTarget, secret: &Secret) -> Result<()> {
        let url = match target {
            DeliveryTarget::Object { url } => url,
            other => {
                return Err(KeylineError::internal(format!(
                    "object adapter cannot deliver to target '{}'",
                    other
                )))
            }
        };

        debug!(secret = %secret.name, version = %secret.version, url = %url, "Delivering secret to object target");

        let body = ReplaceObjectRequest {
            name: secret.name.as_str(),
            version: secret.version.as_str(),
            data: base64::engine::general_purpose::STANDARD.encode(secret.payload.expose()),
        };

        let mut request = self.client.put(url).json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            KeylineError::delivery_with_source(
                target.to_string(),
                "object replacement request failed",
                Box::new(e),
            )
        })?;

        if !response.status().is_success() {
            return Err(KeylineError::delivery(
                target.to_string(),
                format!("object replacement returned HTTP {}", response.status().as_u16()),
            ));
        }

        Ok(())
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let adapter = ObjectDelivery::new(ObjectDeliveryConfig {
            token: Some("cluster-token".to_string()),
            timeout_secs: 5,
        })
        .unwrap();

        let debug = format!("{:?}", adapter);
        assert!(!debug.contains("cluster-token"));
    }

    #[tokio::test]
    async fn test_rejects_foreign_target() {
        let adapter = ObjectDelivery::new(ObjectDeliveryConfig::default()).unwrap();
        let target = DeliveryTarget::Memory { key: "slot".to_string() };
        let err = adapter.apply(&target, &Secret::new("x", "v1", "abc")).await.unwrap_err();
        assert!(matches!(err, KeylineError::Internal { .. }));
    }
}
