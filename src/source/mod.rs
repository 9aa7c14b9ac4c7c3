//! Remote secret store clients.
//!
//! The [`SecretSource`] trait is the controller's only view of a secret
//! manager: one read-only operation, `fetch(name) -> Secret`. Backends map
//! their transport errors into the [`SourceError`] taxonomy, which the
//! reconciler uses to decide between backed-off retry and operator-facing
//! failure.

pub mod backend;
pub mod env;
pub mod error;
pub mod http;
pub mod vault;

pub use backend::{SecretSource, SourceKind};
pub use env::EnvSecretSource;
pub use error::SourceError;
pub use http::{HttpSecretSource, HttpSourceConfig};
pub use vault::{VaultSecretSource, VaultSourceConfig};
