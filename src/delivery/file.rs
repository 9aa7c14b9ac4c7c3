//! File delivery adapter.
//!
//! Materializes a secret as a file using write-to-temp-then-rename: the
//! payload is written to a temporary file in the target's directory, synced,
//! given its final permissions, and renamed over the destination. The rename
//! is atomic on POSIX filesystems, so a consumer reading the path sees
//! either the old content or the new content in full. On any failure the
//! prior file is left untouched.

use super::adapter::{DeliveryAdapter, DeliveryTarget, TargetKind};
use crate::errors::{KeylineError, Result};
use crate::secrets::Secret;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

/// Atomic file materialization for mounted-volume targets.
#[derive(Debug, Clone, Default)]
pub struct FileDelivery;

impl FileDelivery {
    pub fn new() -> Self {
        Self
    }
}

fn write_atomic(path: &Path, mode: u32, payload: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "target path has no parent directory")
    })?;

    // Temp file in the same directory, so the rename never crosses a
    // filesystem boundary.
    let mut tmp = tempfile::Builder::new().prefix(".keyline-").tempfile_in(dir)?;
    tmp.write_all(payload)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(std::fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.persist(path).map_err(|e| e.error)?;

    // Sync the directory so the rename survives a crash.
    #[cfg(unix)]
    std::fs::File::open(dir)?.sync_all()?;

    Ok(())
}

#[async_trait]
impl DeliveryAdapter for FileDelivery {
    async fn apply(&self, target: &DeliveryTarget, secret: &Secret) -> Result<()> {
        let (path, mode) = match target {
            DeliveryTarget::File { path, mode } => (path.clone(), *mode),
            other => {
                return Err(KeylineError::internal(format!(
                    "file adapter cannot deliver to target '{}'",
                    other
                )))
            }
        };

        debug!(secret = %secret.name, version = %secret.version, path = %path.display(), "Delivering secret to file");

        let payload = Zeroizing::new(secret.payload.expose().to_vec());
        let target_desc = target.to_string();
        let written_path: PathBuf = path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&written_path, mode, &payload))
            .await
            .map_err(|e| KeylineError::internal(format!("file delivery task panicked: {}", e)))?
            .map_err(|e| {
                KeylineError::delivery_with_source(
                    target_desc,
                    "failed to atomically replace file",
                    Box::new(e),
                )
            })
    }

    fn kind(&self) -> TargetKind {
        TargetKind::File
    }
}
