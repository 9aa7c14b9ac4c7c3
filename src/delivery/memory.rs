//! In-memory delivery adapter, for tests and dry runs.

use super::adapter::{DeliveryAdapter, DeliveryTarget, TargetKind};
use crate::errors::{KeylineError, Result};
use crate::secrets::Secret;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A delivered entry: version token plus payload bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredEntry {
    pub version: String,
    pub data: Vec<u8>,
}

/// Delivery into process-local slots. The slot map insert replaces the
/// entry whole, giving the same old-state-or-new-state guarantee the other
/// adapters provide.
#[derive(Debug, Clone, Default)]
pub struct MemoryDelivery {
    slots: Arc<RwLock<HashMap<String, DeliveredEntry>>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back a delivered entry, for assertions and dry-run inspection.
    pub async fn get(&self, key: &str) -> Option<DeliveredEntry> {
        self.slots.read().await.get(key).cloned()
    }

    /// Number of delivered slots.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }
}

#[async_trait]
impl DeliveryAdapter for MemoryDelivery {
    async fn apply(&self, target: &DeliveryTarget, secret: &Secret) -> Result<()> {
        let key = match target {
            DeliveryTarget::Memory { key } => key.clone(),
            other => {
                return Err(KeylineError::internal(format!(
                    "memory adapter cannot deliver to target '{}'",
                    other
                )))
            }
        };

        let entry = DeliveredEntry {
            version: secret.version.as_str().to_string(),
            data: secret.payload.expose().to_vec(),
        };
        self.slots.write().await.insert(key, entry);
        Ok(())
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Memory
    }
}
