//! Trait definitions for the placer module.

use async_trait::async_trait;
use std::path::Path;

use super::error::PlacerError;
use super::types::{IntakeCleanup, SwapReceipt, SwapRequest};

/// Performs the filesystem side of a replacement.
#[async_trait]
pub trait Placer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Size of a file in bytes.
    async fn file_size(&self, path: &Path) -> Result<u64, PlacerError>;

    /// Replaces the original with the verified replacement.
    ///
    /// Errors for which [`PlacerError::replacement_committed`] is false leave
    /// the original untouched.
    async fn swap(&self, request: &SwapRequest) -> Result<SwapReceipt, PlacerError>;

    /// Deletes a temp output. Returns whether a file was removed.
    async fn discard(&self, path: &Path) -> Result<bool, PlacerError>;

    /// Deletes the intake copy unless it is the library file itself.
    async fn remove_intake(
        &self,
        intake: &Path,
        library_file: &Path,
    ) -> Result<IntakeCleanup, PlacerError>;
}
