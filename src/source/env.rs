//! Environment variable source backend (development only).
//!
//! Reads secrets from environment variables with the `KEYLINE_SECRET_`
//! prefix. Environment variables carry no version token, so the version is
//! derived from a digest of the content: editing the variable and restarting
//! is observed as a rotation.
//!
//! **DO NOT use in production.** Process environments are visible in process
//! listings, are not encrypted, and cannot be rotated in place.

use super::backend::{check_payload_size, SecretSource, SourceKind};
use super::error::SourceError;
use crate::secrets::{Secret, SecretName};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::env;

/// Environment variable prefix for secrets.
const SECRET_PREFIX: &str = "KEYLINE_SECRET_";

/// Environment variable secret source (development only).
#[derive(Debug, Clone, Default)]
pub struct EnvSecretSource;

impl EnvSecretSource {
    pub fn new() -> Self {
        Self
    }

    /// Converts a secret name to its environment variable name.
    ///
    /// `db-password` reads from `KEYLINE_SECRET_DB_PASSWORD`.
    fn name_to_env_var(name: &SecretName) -> String {
        format!("{}{}", SECRET_PREFIX, name.as_str().to_uppercase().replace('-', "_"))
    }

    /// Content digest used as the version token.
    fn content_version(value: &[u8]) -> String {
        let digest = Sha256::digest(value);
        hex::encode(&digest[..8])
    }
}

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn fetch(&self, name: &SecretName) -> std::result::Result<Secret, SourceError> {
        let env_var = Self::name_to_env_var(name);

        let value = env::var(&env_var).map_err(|_| {
            SourceError::not_found(format!(
                "secret '{}' not found in environment (looking for {})",
                name, env_var
            ))
        })?;

        let payload = value.into_bytes();
        check_payload_size(payload.len())?;
        let version = Self::content_version(&payload);

        Ok(Secret::new(name.clone(), version, payload))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Env
    }
}
