//! # Keyline
//!
//! Keyline is a secret synchronization controller: it watches versioned
//! secrets in a remote secret manager and materializes changed versions
//! atomically into workload-facing targets.
//!
//! ## Architecture
//!
//! ```text
//! SecretSource (vault | http | env)
//!        ↓ fetch(name) -> Secret
//!   Reconciler (one task per secret)
//!        ↓ on version change
//! DeliveryAdapter (file | object | memory)  →  workload
//!        ↓ after the atomic swap
//!   SecretCache (last known good)
//! ```
//!
//! ## Core Components
//!
//! - **Source backends**: read-only clients for remote secret stores,
//!   mapping transport failures into a transient/permanent taxonomy
//! - **Reconciler**: per-secret fetch → compare → deliver state machines
//!   with jittered exponential backoff on transient failures
//! - **Delivery adapters**: atomic materialization; a consumer only ever
//!   sees the fully-old or fully-new secret
//! - **Observability**: a structured event per state transition, never
//!   carrying payload content
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use keyline::config::Settings;
//! use keyline::delivery::{DeliveryRegistry, ObjectDeliveryConfig};
//! use keyline::reconciler::Controller;
//!
//! # async fn run() -> keyline::Result<()> {
//! let settings = Settings::from_yaml_file("keyline.yaml")?;
//! let source = settings.build_source()?;
//! let registry = DeliveryRegistry::with_defaults(ObjectDeliveryConfig::default())?;
//!
//! let controller =
//!     Controller::spawn(settings.sync_specs(), source, &registry, settings.retry_policy())?;
//! tokio::signal::ctrl_c().await.ok();
//! controller.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod observability;
pub mod reconciler;
pub mod retry;
pub mod secrets;
pub mod source;

// Re-export commonly used types
pub use cache::SecretCache;
pub use errors::{KeylineError, Result};
pub use observability::{init_tracing, EventSink, SyncEvent, SyncEventKind};
pub use reconciler::{Controller, SecretStatus, SecretSyncSpec, SyncPhase};
pub use retry::RetryPolicy;
pub use secrets::{Secret, SecretName, SecretPayload, SecretVersion};
pub use source::{SecretSource, SourceError, SourceKind};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
