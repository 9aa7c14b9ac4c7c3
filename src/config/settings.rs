//! # Configuration Settings
//!
//! Defines the configuration structure for the keyline controller: which
//! source backend to talk to, retry tuning, and the static set of secrets
//! to synchronize with their delivery targets.
//!
//! Settings load from a YAML file; source credentials may instead come from
//! environment variables (`VAULT_ADDR`, `VAULT_TOKEN`, ...), keeping tokens
//! out of the settings file.

use crate::delivery::{DeliveryTarget, TargetKind};
use crate::errors::{KeylineError, Result};
use crate::reconciler::SecretSyncSpec;
use crate::retry::RetryPolicy;
use crate::secrets::SecretName;
use crate::source::{
    EnvSecretSource, HttpSecretSource, HttpSourceConfig, SecretSource, SourceKind,
    VaultSecretSource, VaultSourceConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// Main controller configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    /// Source backend configuration
    pub source: SourceSettings,

    /// Retry backoff tuning
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetrySettings,

    /// Secrets to synchronize
    #[validate(length(min = 1, message = "At least one secret must be configured"), nested)]
    pub secrets: Vec<SecretEntry>,
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| KeylineError::io(e, format!("reading settings file {}", path.display())))?;
        Self::from_yaml_str(&raw)
    }

    /// Parse settings from a YAML string and validate them.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(raw)
            .map_err(|e| KeylineError::config_with_source("invalid settings YAML", Box::new(e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)?;
        self.validate_custom()
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        // Secret names must be unique
        let mut names = HashSet::new();
        for entry in &self.secrets {
            if !names.insert(entry.name.as_str()) {
                return Err(KeylineError::validation(format!(
                    "duplicate secret name '{}'",
                    entry.name
                )));
            }
        }

        // Delivery targets must not collide
        let mut targets = HashSet::new();
        for entry in &self.secrets {
            if !targets.insert(entry.target.to_string()) {
                return Err(KeylineError::validation(format!(
                    "delivery target '{}' is used by more than one secret",
                    entry.target
                )));
            }
        }

        // File targets need a parent directory to stage the temp file in
        for entry in &self.secrets {
            if let DeliveryTarget::File { path, .. } = &entry.target {
                if path.parent().map(|p| p.as_os_str().is_empty()).unwrap_or(true) {
                    return Err(KeylineError::validation(format!(
                        "file target '{}' must be an absolute or directory-qualified path",
                        path.display()
                    )));
                }
            }
        }

        self.source.validate_for_kind()?;

        Ok(())
    }

    /// Build the configured source backend.
    pub fn build_source(&self) -> Result<Arc<dyn SecretSource>> {
        self.source.build()
    }

    /// Per-secret sync specs for the controller.
    pub fn sync_specs(&self) -> Vec<SecretSyncSpec> {
        self.secrets.iter().map(SecretEntry::to_spec).collect()
    }

    /// The configured retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }

    /// Whether any secret delivers to a target of the given kind.
    pub fn uses_target_kind(&self, kind: TargetKind) -> bool {
        self.secrets.iter().any(|s| s.target.kind() == kind)
    }
}

/// Source backend selection and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Which backend to use
    pub kind: SourceKind,

    /// Vault settings; falls back to `VAULT_ADDR`/`VAULT_TOKEN` env vars
    #[serde(default)]
    pub vault: Option<VaultSourceConfig>,

    /// HTTP secret-manager settings
    #[serde(default)]
    pub http: Option<HttpSourceConfig>,
}

impl SourceSettings {
    fn validate_for_kind(&self) -> Result<()> {
        match self.kind {
            SourceKind::Vault => {
                if self.vault.is_none() && VaultSourceConfig::from_env().is_none() {
                    return Err(KeylineError::validation(
                        "source kind 'vault' needs a 'vault' section or VAULT_ADDR in the environment",
                    ));
                }
            }
            SourceKind::Http => {
                if self.http.is_none() {
                    return Err(KeylineError::validation(
                        "source kind 'http' needs an 'http' section",
                    ));
                }
            }
            SourceKind::Env => {}
        }
        Ok(())
    }

    fn build(&self) -> Result<Arc<dyn SecretSource>> {
        match self.kind {
            SourceKind::Vault => {
                let config = self
                    .vault
                    .clone()
                    .or_else(VaultSourceConfig::from_env)
                    .ok_or_else(|| KeylineError::config("Vault source is not configured"))?;
                Ok(Arc::new(VaultSecretSource::new(config)?))
            }
            SourceKind::Http => {
                let config = self
                    .http
                    .clone()
                    .ok_or_else(|| KeylineError::config("HTTP source is not configured"))?;
                Ok(Arc::new(HttpSecretSource::new(config)?))
            }
            SourceKind::Env => Ok(Arc::new(EnvSecretSource::new())),
        }
    }
}

/// Retry backoff tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetrySettings {
    /// Initial backoff in milliseconds
    #[validate(range(min = 1, message = "Initial backoff must be at least 1ms"))]
    pub initial_backoff_ms: u64,

    /// Backoff cap in seconds
    #[validate(range(min = 1, message = "Backoff cap must be at least 1 second"))]
    pub max_backoff_secs: u64,

    /// Exponential multiplier
    #[validate(range(min = 1.0, message = "Multiplier must be at least 1.0"))]
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { initial_backoff_ms: 500, max_backoff_secs: 60, multiplier: 2.0 }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_secs(self.max_backoff_secs),
            backoff_multiplier: self.multiplier,
        }
    }
}

/// One secret to synchronize
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecretEntry {
    /// Secret name in the source store
    #[validate(length(min = 1, message = "Secret name cannot be empty"))]
    pub name: String,

    /// Version-check interval in seconds
    #[validate(range(min = 1, max = 86400, message = "Interval must be between 1s and 24h"))]
    pub interval_secs: u64,

    /// Where the secret is delivered
    pub target: DeliveryTarget,
}

impl SecretEntry {
    pub fn to_spec(&self) -> SecretSyncSpec {
        SecretSyncSpec {
            name: SecretName::from(self.name.as_str()),
            interval: Duration::from_secs(self.interval_secs),
            target: self.target.clone(),
        }
    }
}
