//! File system placer implementation.

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tokio::fs::{self, File};
use tracing::{debug, warn};

use super::error::PlacerError;
use super::traits::Placer;
use super::types::{IntakeCleanup, SwapReceipt, SwapRequest};

/// File system based placer implementation.
#[derive(Debug, Default)]
pub struct FsPlacer;

impl FsPlacer {
    /// Creates a new file system placer.
    pub fn new() -> Self {
        Self
    }

    /// Attempts to move a file atomically (rename).
    ///
    /// Returns `Ok(false)` when the paths are on different filesystems.
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // Cross-filesystem moves fail with EXDEV (18 on Linux)
                // We check for CrossesDevices error kind or the raw EXDEV code
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Flushes the replacement's data to disk before it becomes visible.
    async fn sync_file(path: &Path) -> Result<(), std::io::Error> {
        File::open(path).await?.sync_all().await
    }

    /// Persists the rename itself. Failure only weakens crash durability.
    async fn sync_parent_dir(path: &Path) {
        #[cfg(unix)]
        if let Some(parent) = path.parent() {
            let result = match File::open(parent).await {
                Ok(dir) => dir.sync_all().await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                debug!(dir = %parent.display(), error = %e, "Failed to sync directory");
            }
        }
        #[cfg(not(unix))]
        let _ = path;
    }
}

#[async_trait]
impl Placer for FsPlacer {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn file_size(&self, path: &Path) -> Result<u64, PlacerError> {
        Ok(fs::metadata(path).await?.len())
    }

    async fn swap(&self, request: &SwapRequest) -> Result<SwapReceipt, PlacerError> {
        let start = Instant::now();

        if !request.replacement.is_file() {
            return Err(PlacerError::ReplacementNotFound {
                path: request.replacement.clone(),
            });
        }
        let original_meta = fs::metadata(&request.original).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::OriginalNotFound {
                    path: request.original.clone(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;

        // The new file inherits the original's mode bits.
        if let Err(e) = fs::set_permissions(&request.replacement, original_meta.permissions()).await
        {
            warn!(
                path = %request.replacement.display(),
                error = %e,
                "Failed to copy permissions from original"
            );
        }

        Self::sync_file(&request.replacement).await?;

        // Everything before this rename leaves the original untouched.
        let moved = Self::try_atomic_move(&request.replacement, &request.original)
            .await
            .map_err(|e| {
                PlacerError::move_failed(request.replacement.clone(), request.original.clone(), e)
            })?;
        if !moved {
            return Err(PlacerError::CrossDevice {
                from: request.replacement.clone(),
                to: request.original.clone(),
            });
        }

        Self::sync_parent_dir(&request.original).await;

        let meta =
            fs::metadata(&request.original)
                .await
                .map_err(|e| PlacerError::ConfirmFailed {
                    path: request.original.clone(),
                    source: e,
                })?;
        if meta.len() != request.expected_size {
            return Err(PlacerError::SizeMismatch {
                path: request.original.clone(),
                expected: request.expected_size,
                actual: meta.len(),
            });
        }

        Ok(SwapReceipt {
            path: request.original.clone(),
            size_bytes: meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn discard(&self, path: &Path) -> Result<bool, PlacerError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PlacerError::CleanupFailed {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    async fn remove_intake(
        &self,
        intake: &Path,
        library_file: &Path,
    ) -> Result<IntakeCleanup, PlacerError> {
        let intake_canonical = match fs::canonicalize(intake).await {
            Ok(p) => p,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(IntakeCleanup::AlreadyGone)
            }
            Err(e) => {
                return Err(PlacerError::CleanupFailed {
                    path: intake.to_path_buf(),
                    source: e,
                })
            }
        };

        // Compared by resolved path: after a swap the library path is a new
        // inode, while a hard-linked intake copy still holds the old bytes.
        if let Ok(library_canonical) = fs::canonicalize(library_file).await {
            if library_canonical == intake_canonical {
                return Ok(IntakeCleanup::SameFile);
            }
        }

        match fs::remove_file(intake).await {
            Ok(()) => Ok(IntakeCleanup::Removed),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IntakeCleanup::AlreadyGone),
            Err(e) => Err(PlacerError::CleanupFailed {
                path: intake.to_path_buf(),
                source: e,
            }),
        }
    }
}
