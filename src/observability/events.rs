//! Structured sync events.
//!
//! Every reconciliation state transition emits a [`SyncEvent`]: `Fetched`,
//! `Unchanged`, `Delivered`, or `Failed`. Events carry the secret name and
//! version token, never payload content. They fan out to subscribers over a
//! broadcast channel and are mirrored into `tracing` so operators see them
//! without wiring a consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Kind of reconciliation event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEventKind {
    /// A fetch from the remote store completed and verified
    Fetched,
    /// The remote version matches the last applied version; no delivery
    Unchanged,
    /// A changed version was atomically applied to the delivery target
    Delivered,
    /// A fetch or delivery failed
    Failed,
}

impl SyncEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::Unchanged => "unchanged",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structured reconciliation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    /// Unique event id
    pub id: Uuid,
    /// Name of the secret the event concerns
    pub secret_name: String,
    /// What happened
    pub kind: SyncEventKind,
    /// The version token involved, when known
    pub version: Option<String>,
    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
    /// Failure detail for `Failed` events; never payload content
    pub message: Option<String>,
}

impl SyncEvent {
    pub fn new(secret_name: impl Into<String>, kind: SyncEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            secret_name: secret_name.into(),
            kind,
            version: None,
            timestamp: Utc::now(),
            message: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Emits sync events to broadcast subscribers and mirrors them to `tracing`.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: broadcast::Sender<SyncEvent>,
}

impl EventSink {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the event stream.
    ///
    /// Broadcast semantics: a subscriber that falls behind loses the oldest
    /// events, never blocks the reconcilers.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to subscribers and the log.
    pub fn emit(&self, event: SyncEvent) {
        match event.kind {
            SyncEventKind::Failed => tracing::warn!(
                secret = %event.secret_name,
                event = %event.kind,
                version = event.version.as_deref().unwrap_or("-"),
                message = event.message.as_deref().unwrap_or("-"),
                "Secret sync event"
            ),
            _ => tracing::info!(
                secret = %event.secret_name,
                event = %event.kind,
                version = event.version.as_deref().unwrap_or("-"),
                "Secret sync event"
            ),
        }

        // Send only fails when there are no subscribers, which is fine.
        let _ = self.sender.send(event);
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}
