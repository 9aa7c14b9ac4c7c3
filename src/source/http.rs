//! Generic HTTP secret-manager source backend.
//!
//! Talks to a cloud-secret-manager-shaped REST API: the latest version of a
//! secret is accessed at `{base_url}/v1/secrets/{name}/versions/latest`, and
//! the response carries the version name plus the base64-encoded payload:
//!
//! ```json
//! {
//!   "version": "projects/demo/secrets/db-password/versions/5",
//!   "payload": { "data": "aHVudGVyMg==" }
//! }
//! ```
//!
//! The version string is treated as opaque; only equality matters.

use super::backend::{check_payload_size, SecretSource, SourceKind};
use super::error::SourceError;
use crate::errors::{KeylineError, Result};
use crate::secrets::{Secret, SecretName};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP source backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    /// Base URL of the secret-manager API
    pub base_url: String,
    /// Bearer token for authentication
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
struct AccessVersionResponse {
    version: String,
    payload: VersionPayload,
}

#[derive(Debug, Deserialize)]
struct VersionPayload {
    data: String,
}

/// HTTP secret-manager source
pub struct HttpSecretSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for HttpSecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSecretSource")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpSecretSource {
    /// Create a new HTTP source with the given configuration
    pub fn new(config: HttpSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                KeylineError::config(format!("Failed to build HTTP source client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn access_url(&self, name: &SecretName) -> String {
        format!("{}/v1/secrets/{}/versions/latest", self.base_url, name)
    }
}

fn map_transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::timeout(format!("secret-manager request timed out: {}", err))
    } else {
        SourceError::unavailable(format!("secret-manager request failed: {}", err))
    }
}

fn map_status(status: reqwest::StatusCode) -> Option<SourceError> {
    if status.is_success() {
        return None;
    }
    let message = format!("secret-manager returned HTTP {}", status.as_u16());
    Some(match status.as_u16() {
        401 | 403 => SourceError::unauthorized(message),
        404 => SourceError::not_found(message),
        429 => SourceError::unavailable(message),
        code if code >= 500 => SourceError::unavailable(message),
        _ => SourceError::malformed(message),
    })
}

#[async_trait]
impl SecretSource for HttpSecretSource {
    async fn fetch(&self, name: &SecretName) -> std::result::Result<Secret, SourceError> {
        let url = self.access_url(name);
        debug!(secret = %name, url = %url, "Fetching secret over HTTP");

        let mut request = self.client.get(&url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_transport_error)?;

        if let Some(err) = map_status(response.status()) {
            return Err(err);
        }

        let body: AccessVersionResponse = response
            .json()
            .await
            .map_err(|e| SourceError::malformed(format!("undecodable response body: {}", e)))?;

        let payload = base64::engine::general_purpose::STANDARD
            .decode(body.payload.data.as_bytes())
            .map_err(|e| SourceError::malformed(format!("payload is not valid base64: {}", e)))?;
        check_payload_size(payload.len())?;

        Ok(Secret::new(name.clone(), body.version, payload))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Http
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_url_shape() {
        let source = HttpSecretSource::new(HttpSourceConfig {
            base_url: "https://secrets.example.com/".to_string(),
            token: None,
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            source.access_url(&SecretName::from("db-password")),
            "https://secrets.example.com/v1/secrets/db-password/versions/latest"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert!(map_status(reqwest::StatusCode::OK).is_none());
        assert!(matches!(
            map_status(reqwest::StatusCode::UNAUTHORIZED),
            Some(SourceError::Unauthorized { .. })
        ));
        assert!(matches!(
            map_status(reqwest::StatusCode::NOT_FOUND),
            Some(SourceError::NotFound { .. })
        ));
        assert!(map_status(reqwest::StatusCode::TOO_MANY_REQUESTS).unwrap().is_transient());
        assert!(map_status(reqwest::StatusCode::BAD_GATEWAY).unwrap().is_transient());
        assert!(!map_status(reqwest::StatusCode::BAD_REQUEST).unwrap().is_transient());
    }

    #[test]
    fn test_debug_redacts_token() {
        let source = HttpSecretSource::new(HttpSourceConfig {
            base_url: "https://secrets.example.com".to_string(),
            token: Some("very-secret-token".to_string()),
            timeout_secs: 5,
        })
        .unwrap();

        let debug = format!("{:?}", source);
        assert!(!debug.contains("very-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
