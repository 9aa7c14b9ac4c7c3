//! Shared test doubles for reconciler integration tests.

use async_trait::async_trait;
use keyline::delivery::{DeliveryAdapter, DeliveryTarget, MemoryDelivery, TargetKind};
use keyline::secrets::{Secret, SecretName};
use keyline::source::{SecretSource, SourceError, SourceKind};
use keyline::{KeylineError, Result, SyncEvent, SyncEventKind};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// One scripted fetch outcome.
pub enum Step {
    Ok { payload: &'static str, version: &'static str },
    Unavailable,
    NotFound,
}

/// A source that replays a per-secret script of fetch outcomes. When a
/// script runs out, its last step repeats forever.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    last: Mutex<HashMap<String, Step>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl std::fmt::Debug for ScriptedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedSource").finish()
    }
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, name: &str, steps: Vec<Step>) -> Self {
        self.scripts.lock().unwrap().insert(name.to_string(), steps.into());
        self
    }

    /// Fetches attempted for one secret.
    pub fn fetch_count_for(&self, name: &str) -> usize {
        self.fetches.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    fn step_to_result(name: &SecretName, step: &Step) -> std::result::Result<Secret, SourceError> {
        match step {
            Step::Ok { payload, version } => Ok(Secret::new(name.clone(), *version, *payload)),
            Step::Unavailable => Err(SourceError::unavailable("scripted outage")),
            Step::NotFound => Err(SourceError::not_found("scripted missing secret")),
        }
    }
}

#[async_trait]
impl SecretSource for ScriptedSource {
    async fn fetch(&self, name: &SecretName) -> std::result::Result<Secret, SourceError> {
        *self.fetches.lock().unwrap().entry(name.as_str().to_string()).or_insert(0) += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(name.as_str())
            .ok_or_else(|| SourceError::not_found(format!("no script for '{}'", name)))?;

        if let Some(step) = queue.pop_front() {
            let result = Self::step_to_result(name, &step);
            self.last.lock().unwrap().insert(name.as_str().to_string(), step);
            result
        } else {
            let last = self.last.lock().unwrap();
            let step = last
                .get(name.as_str())
                .ok_or_else(|| SourceError::not_found(format!("empty script for '{}'", name)))?;
            Self::step_to_result(name, step)
        }
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Env
    }
}

/// Wraps [`MemoryDelivery`], counting applies and optionally failing the
/// first `fail_first` of them. Used to assert delivery-count idempotence and
/// fail-closed behavior.
#[derive(Debug, Clone)]
pub struct CountingAdapter {
    pub inner: MemoryDelivery,
    applies: Arc<AtomicUsize>,
    fail_first: Arc<AtomicUsize>,
}

impl CountingAdapter {
    pub fn new() -> Self {
        Self {
            inner: MemoryDelivery::new(),
            applies: Arc::new(AtomicUsize::new(0)),
            fail_first: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_first(n: usize) -> Self {
        let adapter = Self::new();
        adapter.fail_first.store(n, Ordering::SeqCst);
        adapter
    }

    /// Applies attempted, including failed ones.
    pub fn apply_count(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryAdapter for CountingAdapter {
    async fn apply(&self, target: &DeliveryTarget, secret: &Secret) -> Result<()> {
        self.applies.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(KeylineError::delivery(target.to_string(), "injected delivery fault"));
        }

        self.inner.apply(target, secret).await
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Memory
    }
}

/// Receive events until one of `kind` for `secret` arrives, or time out.
pub async fn wait_for_event(
    receiver: &mut broadcast::Receiver<SyncEvent>,
    secret: &str,
    kind: SyncEventKind,
) -> SyncEvent {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            let event = receiver.recv().await.expect("event channel closed");
            if event.secret_name == secret && event.kind == kind {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {} event on '{}'", kind, secret))
}
