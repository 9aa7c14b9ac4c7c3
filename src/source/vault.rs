//! HashiCorp Vault source backend.
//!
//! Fetches secrets from Vault's KV v2 engine. The KV v2 metadata version is
//! used as the secret's version token, so a Vault-side write is observed as
//! a rotation on the next reconcile cycle.
//!
//! ## Secret Format in Vault
//!
//! Secrets are stored as KV v2 entries with a `value` field holding the
//! payload:
//!
//! ```json
//! {
//!   "value": "<payload>"
//! }
//! ```
//!
//! # Security
//!
//! - All communication uses TLS when the address is HTTPS
//! - Tokens and payloads are never logged

use super::backend::{check_payload_size, SecretSource, SourceKind};
use super::error::SourceError;
use crate::errors::{KeylineError, Result};
use crate::secrets::{Secret, SecretName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

/// Configuration for the Vault source backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSourceConfig {
    /// Vault server address
    pub address: String,
    /// Vault authentication token
    pub token: Option<String>,
    /// Vault namespace (for Enterprise)
    pub namespace: Option<String>,
    /// KV v2 mount path (default: "secret")
    #[serde(default = "default_kv_mount")]
    pub mount_path: String,
}

fn default_kv_mount() -> String {
    "secret".to_string()
}

impl VaultSourceConfig {
    /// Load configuration from environment variables
    ///
    /// Uses:
    /// - `KEYLINE_VAULT_ADDR` or `VAULT_ADDR`
    /// - `KEYLINE_VAULT_TOKEN` or `VAULT_TOKEN`
    /// - `KEYLINE_VAULT_NAMESPACE` or `VAULT_NAMESPACE`
    /// - `KEYLINE_VAULT_KV_MOUNT` (default: "secret")
    pub fn from_env() -> Option<Self> {
        let address =
            std::env::var("KEYLINE_VAULT_ADDR").or_else(|_| std::env::var("VAULT_ADDR")).ok()?;

        let token =
            std::env::var("KEYLINE_VAULT_TOKEN").or_else(|_| std::env::var("VAULT_TOKEN")).ok();

        let namespace = std::env::var("KEYLINE_VAULT_NAMESPACE")
            .or_else(|_| std::env::var("VAULT_NAMESPACE"))
            .ok();

        let mount_path =
            std::env::var("KEYLINE_VAULT_KV_MOUNT").unwrap_or_else(|_| default_kv_mount());

        Some(Self { address, token, namespace, mount_path })
    }
}

/// HashiCorp Vault secret source
///
/// Reads the KV v2 metadata first to pin the current version, then reads
/// exactly that version's data, so a concurrent Vault-side write can never
/// pair one version's payload with another version's token.
pub struct VaultSecretSource {
    client: VaultClient,
    mount_path: String,
}

impl std::fmt::Debug for VaultSecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSecretSource")
            .field("mount_path", &self.mount_path)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

impl VaultSecretSource {
    /// Create a new Vault source with the given configuration
    pub fn new(config: VaultSourceConfig) -> Result<Self> {
        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token);
        }

        if let Some(ref namespace) = config.namespace {
            settings_builder.namespace(Some(namespace.clone()));
        }

        let settings = settings_builder.build().map_err(|e| {
            KeylineError::config(format!("Invalid Vault source configuration: {}", e))
        })?;

        let client = VaultClient::new(settings)
            .map_err(|e| KeylineError::config(format!("Failed to create Vault client: {}", e)))?;

        info!(address = %config.address, kv_mount = %config.mount_path, "Initialized Vault secret source");

        Ok(Self { client, mount_path: config.mount_path })
    }

    fn parse_value(
        &self,
        name: &SecretName,
        data: HashMap<String, serde_json::Value>,
    ) -> std::result::Result<Vec<u8>, SourceError> {
        data.get("value")
            .or_else(|| data.get("secret"))
            .and_then(|v| v.as_str())
            .map(|s| s.as_bytes().to_vec())
            .ok_or_else(|| {
                SourceError::malformed(format!(
                    "Vault entry for '{}' has no string 'value' field",
                    name
                ))
            })
    }
}

fn map_vault_error(err: ClientError) -> SourceError {
    match err {
        ClientError::APIError { code: 401, .. } | ClientError::APIError { code: 403, .. } => {
            SourceError::unauthorized(format!("Vault returned {}", err))
        }
        ClientError::APIError { code: 404, .. } => {
            SourceError::not_found(format!("Vault returned {}", err))
        }
        ClientError::APIError { code, .. } if code == 429 || code >= 500 => {
            SourceError::unavailable(format!("Vault returned {}", err))
        }
        ClientError::APIError { .. } => SourceError::malformed(format!("Vault returned {}", err)),
        // Transport failures (connection refused, TLS, DNS) are retryable.
        other => SourceError::unavailable(format!("Vault request failed: {}", other)),
    }
}

#[async_trait]
impl SecretSource for VaultSecretSource {
    async fn fetch(&self, name: &SecretName) -> std::result::Result<Secret, SourceError> {
        debug!(secret = %name, kv_mount = %self.mount_path, "Fetching secret from Vault");

        let metadata = kv2::read_metadata(&self.client, &self.mount_path, name.as_str())
            .await
            .map_err(map_vault_error)?;
        let version = metadata.current_version;

        let data: HashMap<String, serde_json::Value> =
            kv2::read_version(&self.client, &self.mount_path, name.as_str(), version)
                .await
                .map_err(map_vault_error)?;

        let payload = self.parse_value(name, data)?;
        check_payload_size(payload.len())?;

        Ok(Secret::new(name.clone(), version.to_string(), payload))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Vault
    }
}
