//! Delivery mechanisms.
//!
//! A [`DeliveryAdapter`] abstracts how a secret reaches a running workload:
//! an atomically replaced file, a full-replacement remote object, or an
//! in-memory slot. New mechanisms implement the single `apply` contract; the
//! reconciler never knows which mechanism it is driving.

pub mod adapter;
pub mod file;
pub mod memory;
pub mod object;

pub use adapter::{DeliveryAdapter, DeliveryTarget, TargetKind};
pub use file::FileDelivery;
pub use memory::{DeliveredEntry, MemoryDelivery};
pub use object::{ObjectDelivery, ObjectDeliveryConfig};

use crate::errors::{KeylineError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps target kinds to the adapter that serves them.
#[derive(Debug, Default, Clone)]
pub struct DeliveryRegistry {
    adapters: HashMap<TargetKind, Arc<dyn DeliveryAdapter>>,
}

impl DeliveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in file, object, and memory adapters.
    pub fn with_defaults(object_config: ObjectDeliveryConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(FileDelivery::new()));
        registry.register(Arc::new(ObjectDelivery::new(object_config)?));
        registry.register(Arc::new(MemoryDelivery::new()));
        Ok(registry)
    }

    /// Register an adapter for its mechanism family, replacing any prior one.
    pub fn register(&mut self, adapter: Arc<dyn DeliveryAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Look up the adapter serving a target.
    pub fn adapter_for(&self, target: &DeliveryTarget) -> Result<Arc<dyn DeliveryAdapter>> {
        self.adapters.get(&target.kind()).cloned().ok_or_else(|| {
            KeylineError::config(format!("no delivery adapter registered for '{}'", target.kind()))
        })
    }
}
