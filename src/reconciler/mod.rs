//! The reconciler: per-secret sync state machines and the controller that
//! owns them.
//!
//! Control flow for one secret: the worker ticks on its configured interval,
//! fetches the remote version, compares it with the last applied version,
//! and only on a change drives an atomic delivery. Bookkeeping (applied
//! version, then cache) happens strictly after delivery succeeds. Transient
//! failures retry with jittered exponential backoff; permanent failures park
//! the secret until an operator re-arms it.

pub mod controller;
pub mod state;
mod worker;

pub use controller::{Controller, SecretSyncSpec};
pub use state::{ReconcileState, SecretStatus, StatusBoard, SyncPhase};
