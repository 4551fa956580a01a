//! Mock placer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::placer::{FsPlacer, IntakeCleanup, Placer, PlacerError, SwapReceipt, SwapRequest};

/// Where an injected swap failure happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapFailure {
    /// The rename is refused; the original stays in place.
    BeforeCommit,
    /// The rename happens but the result does not confirm.
    AfterCommit,
}

/// Placer that does real filesystem work through [`FsPlacer`] but can be told
/// to fail at specific points.
///
/// # Example
///
/// ```rust,ignore
/// use squeeze_core::testing::{MockPlacer, SwapFailure};
///
/// let placer = MockPlacer::new();
/// placer.fail_next_swap(SwapFailure::AfterCommit).await;
///
/// let outcome = processor.process(&intake).await;
/// assert_eq!(outcome.state, ProtocolState::DataLossRisk);
/// ```
#[derive(Debug)]
pub struct MockPlacer {
    inner: FsPlacer,
    swaps: Arc<RwLock<Vec<SwapRequest>>>,
    swap_failure: Arc<RwLock<Option<SwapFailure>>>,
    unreadable: Arc<RwLock<HashSet<PathBuf>>>,
    fail_remove_intake: Arc<RwLock<bool>>,
}

impl Default for MockPlacer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlacer {
    /// Create a new mock placer with no failures configured.
    pub fn new() -> Self {
        Self {
            inner: FsPlacer::new(),
            swaps: Arc::new(RwLock::new(Vec::new())),
            swap_failure: Arc::new(RwLock::new(None)),
            unreadable: Arc::new(RwLock::new(HashSet::new())),
            fail_remove_intake: Arc::new(RwLock::new(false)),
        }
    }

    /// Configure the next swap to fail.
    pub async fn fail_next_swap(&self, failure: SwapFailure) {
        *self.swap_failure.write().await = Some(failure);
    }

    /// Make `file_size` fail for a path.
    pub async fn set_size_unreadable(&self, path: impl AsRef<Path>) {
        self.unreadable
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Make intake cleanup fail.
    pub async fn set_fail_remove_intake(&self, fail: bool) {
        *self.fail_remove_intake.write().await = fail;
    }

    /// Get all swap requests received.
    pub async fn recorded_swaps(&self) -> Vec<SwapRequest> {
        self.swaps.read().await.clone()
    }
}

#[async_trait]
impl Placer for MockPlacer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn file_size(&self, path: &Path) -> Result<u64, PlacerError> {
        if self.unreadable.read().await.contains(path) {
            return Err(PlacerError::Io(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            )));
        }
        self.inner.file_size(path).await
    }

    async fn swap(&self, request: &SwapRequest) -> Result<SwapReceipt, PlacerError> {
        self.swaps.write().await.push(request.clone());

        match self.swap_failure.write().await.take() {
            None => self.inner.swap(request).await,
            Some(SwapFailure::BeforeCommit) => Err(PlacerError::move_failed(
                request.replacement.clone(),
                request.original.clone(),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            )),
            Some(SwapFailure::AfterCommit) => {
                tokio::fs::rename(&request.replacement, &request.original).await?;
                Err(PlacerError::SizeMismatch {
                    path: request.original.clone(),
                    expected: request.expected_size,
                    actual: 0,
                })
            }
        }
    }

    async fn discard(&self, path: &Path) -> Result<bool, PlacerError> {
        self.inner.discard(path).await
    }

    async fn remove_intake(
        &self,
        intake: &Path,
        library_file: &Path,
    ) -> Result<IntakeCleanup, PlacerError> {
        if *self.fail_remove_intake.read().await {
            return Err(PlacerError::CleanupFailed {
                path: intake.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        self.inner.remove_intake(intake, library_file).await
    }
}
