//! Types for the processor module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Error recorded when no library file shares the candidate's name.
pub const NO_MATCH_ERROR: &str = "no matching media file";

/// Where a candidate is in the replacement protocol.
///
/// The first block of variants are intermediate steps; the rest are terminal
/// and end up in an [`OutcomeRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    Discovered,
    Matched,
    Probed,
    Transcoding,
    Verifying,
    RatioCheck,
    Swapping,

    /// No library file with the same name.
    NoMatch,
    /// Library file is already in the target codec.
    AlreadyTargetCodec,
    /// Library file size could not be read.
    ProbeFailed,
    /// Preview run; savings estimated, nothing touched.
    DryRun,
    TranscodeFailed,
    VerifyFailed,
    /// Output not small enough to be worth keeping.
    InsufficientGain,
    /// Swap failed before the rename; original intact.
    SwapFailed,
    /// Swap failed after the rename; original gone, replacement unconfirmed.
    DataLossRisk,
    /// Original replaced.
    Done,
}

impl ProtocolState {
    /// Whether processing stops in this state.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::Discovered
                | Self::Matched
                | Self::Probed
                | Self::Transcoding
                | Self::Verifying
                | Self::RatioCheck
                | Self::Swapping
        )
    }

    /// Terminal states that are expected no-ops rather than failures.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::NoMatch | Self::AlreadyTargetCodec | Self::InsufficientGain
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Matched => "matched",
            Self::Probed => "probed",
            Self::Transcoding => "transcoding",
            Self::Verifying => "verifying",
            Self::RatioCheck => "ratio_check",
            Self::Swapping => "swapping",
            Self::NoMatch => "no_match",
            Self::AlreadyTargetCodec => "already_target_codec",
            Self::ProbeFailed => "probe_failed",
            Self::DryRun => "dry_run",
            Self::TranscodeFailed => "transcode_failed",
            Self::VerifyFailed => "verify_failed",
            Self::InsufficientGain => "insufficient_gain",
            Self::SwapFailed => "swap_failed",
            Self::DataLossRisk => "data_loss_risk",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one candidate through the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Intake candidate.
    pub file: PathBuf,
    /// Library file it matched, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<PathBuf>,
    /// Terminal state reached.
    pub state: ProtocolState,
    pub success: bool,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    pub space_saved_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time spent on this candidate.
    pub elapsed_ms: u64,
}

impl OutcomeRecord {
    pub(crate) fn new(file: &Path) -> Self {
        Self {
            file: file.to_path_buf(),
            matched: None,
            state: ProtocolState::Discovered,
            success: false,
            original_size_bytes: 0,
            compressed_size_bytes: 0,
            space_saved_bytes: 0,
            error: None,
            elapsed_ms: 0,
        }
    }

    /// Ratio of compressed to original size, when a compressed size is known.
    pub fn compression_ratio(&self) -> Option<f64> {
        (self.compressed_size_bytes > 0)
            .then(|| compression_ratio(self.original_size_bytes, self.compressed_size_bytes))
    }
}

/// `compressed / original`. An empty original counts as no gain (1.0).
pub fn compression_ratio(original_bytes: u64, compressed_bytes: u64) -> f64 {
    if original_bytes == 0 {
        return 1.0;
    }
    compressed_bytes as f64 / original_bytes as f64
}

/// Error text for an output that missed the ratio threshold.
pub fn insufficient_compression_message(ratio: f64) -> String {
    format!("insufficient compression ({:.2}%)", ratio * 100.0)
}
