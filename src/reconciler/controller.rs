//! Controller: spawns and owns one reconcile worker per configured secret.

use crate::cache::SecretCache;
use crate::delivery::{DeliveryRegistry, DeliveryTarget};
use crate::errors::{KeylineError, Result};
use crate::observability::{EventSink, SyncEvent};
use crate::retry::RetryPolicy;
use crate::secrets::SecretName;
use crate::source::SecretSource;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use super::state::{SecretStatus, StatusBoard};
use super::worker::SecretWorker;

/// One secret's synchronization parameters, derived from configuration.
#[derive(Debug, Clone)]
pub struct SecretSyncSpec {
    pub name: SecretName,
    /// Version-check interval
    pub interval: Duration,
    pub target: DeliveryTarget,
}

/// Owns the reconcile workers, the shared cache, and the event stream.
///
/// Each secret runs on its own task; nothing orders reconciliation across
/// secrets, and a failure on one never affects another's cadence.
pub struct Controller {
    workers: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
    force_handles: HashMap<SecretName, mpsc::Sender<()>>,
    cache: SecretCache,
    events: EventSink,
    status: StatusBoard,
}

impl Controller {
    /// Spawn one worker per spec and start reconciling.
    ///
    /// Fails fast on duplicate names or a target with no registered adapter,
    /// before any worker starts.
    pub fn spawn(
        specs: Vec<SecretSyncSpec>,
        source: Arc<dyn SecretSource>,
        registry: &DeliveryRegistry,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Self::spawn_with_events(specs, source, registry, retry, EventSink::new())
    }

    /// Like [`Controller::spawn`], but emitting into a caller-provided sink,
    /// so subscribers attached before spawn see the very first events.
    pub fn spawn_with_events(
        specs: Vec<SecretSyncSpec>,
        source: Arc<dyn SecretSource>,
        registry: &DeliveryRegistry,
        retry: RetryPolicy,
        events: EventSink,
    ) -> Result<Self> {
        let cache = SecretCache::new();
        let status = StatusBoard::new();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let mut workers = Vec::with_capacity(specs.len());
        let mut force_handles = HashMap::with_capacity(specs.len());

        // Resolve every adapter before spawning anything.
        let mut seen = std::collections::HashSet::new();
        let mut resolved = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.name.clone()) {
                return Err(KeylineError::validation(format!(
                    "duplicate secret name '{}'",
                    spec.name
                )));
            }
            let adapter = registry.adapter_for(&spec.target)?;
            resolved.push((spec, adapter));
        }

        for (spec, adapter) in resolved {
            let (force_tx, force_rx) = mpsc::channel(1);
            force_handles.insert(spec.name.clone(), force_tx);

            let worker = SecretWorker::new(
                spec.name.clone(),
                spec.target,
                spec.interval,
                Arc::clone(&source),
                adapter,
                cache.clone(),
                retry.clone(),
                events.clone(),
                status.clone(),
                shutdown_rx.clone(),
                force_rx,
            );
            workers.push(tokio::spawn(worker.run()));
        }

        info!(secrets = workers.len(), source = %source.kind(), "Secret sync controller started");

        Ok(Self { workers, shutdown, force_handles, cache, events, status })
    }

    /// Subscribe to the structured event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// The shared last-known-good cache.
    pub fn cache(&self) -> &SecretCache {
        &self.cache
    }

    /// Status of one secret.
    pub async fn status(&self, name: &SecretName) -> Option<SecretStatus> {
        self.status.get(name.as_str()).await
    }

    /// Status of all secrets, sorted by name.
    pub async fn statuses(&self) -> Vec<SecretStatus> {
        self.status.all().await
    }

    /// Trigger an immediate reconcile cycle for a secret, re-arming it if it
    /// was parked on a permanent error.
    pub async fn force_sync(&self, name: &SecretName) -> Result<()> {
        let handle = self.force_handles.get(name).ok_or_else(|| {
            KeylineError::validation(format!("no configured secret named '{}'", name))
        })?;

        // A full queue means a forced cycle is already pending.
        match handle.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(())) => {
                Err(KeylineError::internal(format!("worker for '{}' is gone", name)))
            }
        }
    }

    /// Signal shutdown and wait for every worker to finish its in-flight
    /// cycle. No delivery is interrupted mid-swap.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for worker in self.workers {
            let _ = worker.await;
        }
        info!("Secret sync controller stopped");
    }
}
