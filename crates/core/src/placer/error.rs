//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while swapping or cleaning up files.
#[derive(Debug, Error)]
pub enum PlacerError {
    /// Replacement file not found.
    #[error("Replacement file not found: {path}")]
    ReplacementNotFound { path: PathBuf },

    /// Original file not found.
    #[error("Original file not found: {path}")]
    OriginalNotFound { path: PathBuf },

    /// Replacement and original live on different filesystems.
    #[error("Cannot swap across filesystems: {from} -> {to}")]
    CrossDevice { from: PathBuf, to: PathBuf },

    /// Failed to rename the replacement over the original.
    #[error("Failed to move file from {from} to {to}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The swapped file could not be inspected after the rename.
    #[error("Failed to confirm replacement at {path}")]
    ConfirmFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The swapped file does not have the verified size.
    #[error("Size mismatch for {path}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Failed to delete a file during cleanup.
    #[error("Failed to cleanup file: {path}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacerError {
    /// Creates a move failed error.
    pub fn move_failed(from: PathBuf, to: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed { from, to, error }
    }

    /// Whether the replacement had already been renamed over the original
    /// when this error occurred.
    ///
    /// When true the original bytes are gone and the new ones are unconfirmed.
    pub fn replacement_committed(&self) -> bool {
        matches!(self, Self::ConfirmFailed { .. } | Self::SizeMismatch { .. })
    }
}
