//! Types for the placer module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Replace `original` with the verified file at `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Verified temp output, in the same directory as `original`.
    pub replacement: PathBuf,
    /// Library file being replaced.
    pub original: PathBuf,
    /// Size the replacement had when it was verified.
    pub expected_size: u64,
}

/// Result of a confirmed swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    /// Path now holding the new bytes (the original path).
    pub path: PathBuf,
    /// Confirmed size at that path.
    pub size_bytes: u64,
    /// Time taken for the swap.
    pub duration_ms: u64,
}

/// What happened to the intake copy after a successful swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeCleanup {
    /// Intake file was deleted.
    Removed,
    /// Intake path resolves to the library file; left alone.
    SameFile,
    /// Nothing to delete.
    AlreadyGone,
}
