//! Configuration loading and validation.

pub mod settings;

pub use settings::{RetrySettings, SecretEntry, Settings, SourceSettings};
