//! Per-secret reconciliation state.

use crate::secrets::SecretVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Phase of a secret's reconciliation state machine.
///
/// The happy path cycles `Idle → Fetching → Comparing → Delivering → Idle`;
/// `Failing` is entered from `Fetching` or `Delivering` and holds until the
/// retry schedule (or an operator) re-runs the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Fetching,
    Comparing,
    Delivering,
    Failing,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Comparing => "comparing",
            Self::Delivering => "delivering",
            Self::Failing => "failing",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bookkeeping owned exclusively by one secret's reconciliation task.
#[derive(Debug)]
pub struct ReconcileState {
    /// Version last applied to the delivery target, None before first delivery
    pub last_applied_version: Option<SecretVersion>,
    /// When the last reconcile cycle started
    pub last_attempt: Option<Instant>,
    /// Failures since the last successful cycle
    pub consecutive_failures: u32,
    /// Current phase
    pub phase: SyncPhase,
    /// Set on a permanent error; cleared only by operator re-arm
    pub needs_operator: bool,
}

impl ReconcileState {
    pub fn new() -> Self {
        Self {
            last_applied_version: None,
            last_attempt: None,
            consecutive_failures: 0,
            phase: SyncPhase::Idle,
            needs_operator: false,
        }
    }

    /// A cycle ended with a delivery: record the applied version and reset
    /// the failure count.
    pub fn record_applied(&mut self, version: SecretVersion) {
        self.last_applied_version = Some(version);
        self.consecutive_failures = 0;
        self.needs_operator = false;
    }

    /// A cycle ended with no change: still a success, reset the failure count.
    pub fn record_unchanged(&mut self) {
        self.consecutive_failures = 0;
        self.needs_operator = false;
    }

    /// A cycle failed. Permanent failures park the secret for an operator.
    pub fn record_failure(&mut self, retryable: bool) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if !retryable {
            self.needs_operator = true;
        }
    }

    /// Operator-triggered re-arm after a permanent failure.
    pub fn re_arm(&mut self) {
        self.needs_operator = false;
        self.consecutive_failures = 0;
    }
}

impl Default for ReconcileState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time status of one secret, published for operators.
#[derive(Debug, Clone, Serialize)]
pub struct SecretStatus {
    pub name: String,
    pub phase: SyncPhase,
    pub last_applied_version: Option<String>,
    pub consecutive_failures: u32,
    pub needs_operator: bool,
}

/// Shared map of per-secret statuses, written by workers, read by operators.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<HashMap<String, SecretStatus>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn update(&self, status: SecretStatus) {
        self.inner.write().await.insert(status.name.clone(), status);
    }

    pub async fn get(&self, name: &str) -> Option<SecretStatus> {
        self.inner.read().await.get(name).cloned()
    }

    pub async fn all(&self) -> Vec<SecretStatus> {
        let mut statuses: Vec<SecretStatus> = self.inner.read().await.values().cloned().collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applied_resets_failures() {
        let mut state = ReconcileState::new();
        state.record_failure(true);
        state.record_failure(true);
        assert_eq!(state.consecutive_failures, 2);

        state.record_applied(SecretVersion::from("v1"));
        assert_eq!(state.consecutive_failures, 0);
        assert_eq!(state.last_applied_version, Some(SecretVersion::from("v1")));
    }

    #[test]
    fn test_unchanged_resets_failures() {
        let mut state = ReconcileState::new();
        state.record_failure(true);
        state.record_unchanged();
        assert_eq!(state.consecutive_failures, 0);
    }

    #[test]
    fn test_permanent_failure_needs_operator() {
        let mut state = ReconcileState::new();
        state.record_failure(false);
        assert!(state.needs_operator);

        state.re_arm();
        assert!(!state.needs_operator);
        assert_eq!(state.consecutive_failures, 0);
    }

    #[test]
    fn test_transient_failure_does_not_park() {
        let mut state = ReconcileState::new();
        state.record_failure(true);
        assert!(!state.needs_operator);
    }

    #[tokio::test]
    async fn test_status_board_sorted() {
        let board = StatusBoard::new();
        for name in ["zeta", "alpha"] {
            board
                .update(SecretStatus {
                    name: name.to_string(),
                    phase: SyncPhase::Idle,
                    last_applied_version: None,
                    consecutive_failures: 0,
                    needs_operator: false,
                })
                .await;
        }

        let all = board.all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "alpha");
        assert_eq!(all[1].name, "zeta");
    }
}
