//! Per-secret reconciliation worker.
//!
//! Each configured secret is bound to exactly one worker task for its
//! lifetime, which makes the worker the sole writer of that secret's
//! `ReconcileState` and cache entry. A cycle is strictly sequential:
//! fetch → compare → deliver → bookkeeping. Delivery success gates every
//! state mutation, so a crash between delivery and bookkeeping can only
//! cause a redundant re-delivery of identical content, never a missed one.

use crate::cache::SecretCache;
use crate::delivery::{DeliveryAdapter, DeliveryTarget};
use crate::errors::KeylineError;
use crate::observability::{EventSink, SyncEvent, SyncEventKind};
use crate::retry::RetryPolicy;
use crate::secrets::SecretName;
use crate::source::SecretSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::state::{ReconcileState, SecretStatus, StatusBoard, SyncPhase};

/// Outcome of one reconcile cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CycleOutcome {
    /// A changed version was delivered and recorded
    Applied,
    /// Remote version matched the last applied version
    Unchanged,
    /// The cycle failed; `retryable` selects backoff versus operator hold
    Failed { retryable: bool },
}

pub(crate) struct SecretWorker {
    name: SecretName,
    target: DeliveryTarget,
    interval: Duration,
    source: Arc<dyn SecretSource>,
    adapter: Arc<dyn DeliveryAdapter>,
    cache: SecretCache,
    retry: RetryPolicy,
    events: EventSink,
    status: StatusBoard,
    state: ReconcileState,
    shutdown: watch::Receiver<bool>,
    force: mpsc::Receiver<()>,
}

impl SecretWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: SecretName,
        target: DeliveryTarget,
        interval: Duration,
        source: Arc<dyn SecretSource>,
        adapter: Arc<dyn DeliveryAdapter>,
        cache: SecretCache,
        retry: RetryPolicy,
        events: EventSink,
        status: StatusBoard,
        shutdown: watch::Receiver<bool>,
        force: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            name,
            target,
            interval,
            source,
            adapter,
            cache,
            retry,
            events,
            status,
            state: ReconcileState::new(),
            shutdown,
            force,
        }
    }

    /// Drive the reconcile loop until shutdown.
    pub(crate) async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(secret = %self.name, target = %self.target, interval_secs = self.interval.as_secs(), "Reconcile worker started");

        let mut force_open = true;
        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    // A dropped sender means the controller is gone; stop.
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick(), if !self.state.needs_operator => {}
                maybe = self.force.recv(), if force_open => {
                    match maybe {
                        Some(()) => self.state.re_arm(),
                        None => {
                            force_open = false;
                            continue;
                        }
                    }
                }
            }

            if self.run_cycle_with_retries().await {
                break;
            }
        }

        debug!(secret = %self.name, "Reconcile worker stopped");
    }

    /// Run one cycle, retrying transient failures with backoff.
    ///
    /// Returns true when a shutdown was observed mid-backoff.
    async fn run_cycle_with_retries(&mut self) -> bool {
        loop {
            match self.reconcile_once().await {
                CycleOutcome::Applied | CycleOutcome::Unchanged => return false,
                CycleOutcome::Failed { retryable: false } => {
                    // Parked until an operator re-arms via force_sync.
                    return false;
                }
                CycleOutcome::Failed { retryable: true } => {
                    let attempt = self.state.consecutive_failures.saturating_sub(1);
                    let delay = self.retry.jittered_delay(attempt);
                    debug!(secret = %self.name, attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        changed = self.shutdown.changed() => {
                            if changed.is_err() || *self.shutdown.borrow() {
                                return true;
                            }
                        }
                    }
                }
            }
        }
    }

    /// One fetch-compare-deliver pass.
    pub(crate) async fn reconcile_once(&mut self) -> CycleOutcome {
        self.state.last_attempt = Some(Instant::now());
        self.set_phase(SyncPhase::Fetching).await;

        let fetched = match self.source.fetch(&self.name).await {
            Ok(secret) => secret,
            Err(err) => {
                let retryable = err.is_transient();
                let err = KeylineError::source_error(self.name.as_str(), err);
                return self.fail(err, retryable).await;
            }
        };

        self.events.emit(
            SyncEvent::new(self.name.as_str(), SyncEventKind::Fetched)
                .with_version(fetched.version.as_str()),
        );

        self.set_phase(SyncPhase::Comparing).await;
        if self.state.last_applied_version.as_ref() == Some(&fetched.version) {
            // Unchanged version: never re-deliver, bounding blast radius.
            self.events.emit(
                SyncEvent::new(self.name.as_str(), SyncEventKind::Unchanged)
                    .with_version(fetched.version.as_str()),
            );
            self.state.record_unchanged();
            self.set_phase(SyncPhase::Idle).await;
            return CycleOutcome::Unchanged;
        }

        self.set_phase(SyncPhase::Delivering).await;
        match self.adapter.apply(&self.target, &fetched).await {
            Ok(()) => {
                // Bookkeeping strictly after the swap: version first, then
                // cache, so readers of the cache only ever see delivered
                // material.
                self.state.record_applied(fetched.version.clone());
                self.cache.put(fetched.clone()).await;
                self.events.emit(
                    SyncEvent::new(self.name.as_str(), SyncEventKind::Delivered)
                        .with_version(fetched.version.as_str()),
                );
                self.set_phase(SyncPhase::Idle).await;
                CycleOutcome::Applied
            }
            Err(err) => {
                let retryable = err.is_retryable();
                self.fail(err, retryable).await
            }
        }
    }

    async fn fail(&mut self, err: KeylineError, retryable: bool) -> CycleOutcome {
        self.events.emit(
            SyncEvent::new(self.name.as_str(), SyncEventKind::Failed)
                .with_message(err.to_string()),
        );
        self.state.record_failure(retryable);
        self.set_phase(SyncPhase::Failing).await;
        CycleOutcome::Failed { retryable }
    }

    async fn set_phase(&mut self, phase: SyncPhase) {
        self.state.phase = phase;
        self.status
            .update(SecretStatus {
                name: self.name.as_str().to_string(),
                phase,
                last_applied_version: self
                    .state
                    .last_applied_version
                    .as_ref()
                    .map(|v| v.as_str().to_string()),
                consecutive_failures: self.state.consecutive_failures,
                needs_operator: self.state.needs_operator,
            })
            .await;
    }
}
