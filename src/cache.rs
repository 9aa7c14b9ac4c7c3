//! Last-known-good secret cache.
//!
//! Holds the most recently delivered [`Secret`] per name, in memory only.
//! Entries are replaced whole under a write lock, so a reader never observes
//! a half-written secret. There is no TTL and no eviction: membership is
//! fixed to the configured secret set, and freshness is the reconciler's
//! job, not the cache's. Nothing here ever touches durable storage, so a
//! cold start always re-fetches.

use crate::secrets::{Secret, SecretName};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory store of the last successfully delivered secret per name.
///
/// Writes for a given name only ever come from that secret's own
/// reconciliation task; distinct names may be written concurrently.
#[derive(Debug, Default)]
pub struct SecretCache {
    inner: Arc<RwLock<HashMap<SecretName, Secret>>>,
}

impl SecretCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached secret for a name, if one has been delivered.
    pub async fn get(&self, name: &SecretName) -> Option<Secret> {
        self.inner.read().await.get(name).cloned()
    }

    /// Replace the entry for a name atomically.
    pub async fn put(&self, secret: Secret) {
        let mut cache = self.inner.write().await;
        debug!(secret = %secret.name, version = %secret.version, "Caching delivered secret");
        cache.insert(secret.name.clone(), secret);
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Clone for SecretCache {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = SecretCache::new();
        let name = SecretName::from("api-key");

        assert!(cache.get(&name).await.is_none());

        cache.put(Secret::new("api-key", "v1", "abc")).await;
        let cached = cache.get(&name).await.unwrap();
        assert_eq!(cached.version.as_str(), "v1");
        assert_eq!(cached.payload.expose(), b"abc");
    }

    #[tokio::test]
    async fn test_put_replaces_whole_entry() {
        let cache = SecretCache::new();
        let name = SecretName::from("api-key");

        cache.put(Secret::new("api-key", "v1", "abc")).await;
        cache.put(Secret::new("api-key", "v2", "xyz")).await;

        let cached = cache.get(&name).await.unwrap();
        assert_eq!(cached.version.as_str(), "v2");
        assert_eq!(cached.payload.expose(), b"xyz");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let cache = SecretCache::new();
        let clone = cache.clone();

        cache.put(Secret::new("shared", "v1", "abc")).await;
        assert!(clone.get(&SecretName::from("shared")).await.is_some());
    }

    #[tokio::test]
    async fn test_distinct_names_written_concurrently() {
        let cache = SecretCache::new();

        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let name = format!("secret-{}", i);
                cache.put(Secret::new(name.as_str(), "v1", "payload")).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len().await, 8);
    }
}
