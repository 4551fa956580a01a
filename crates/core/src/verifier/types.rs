use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning for post-transcode verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Allowed difference between source and output duration.
    #[serde(default = "default_duration_tolerance")]
    pub duration_tolerance_secs: f64,
    /// Seconds decoded by the integrity sample.
    #[serde(default = "default_decode_sample_secs")]
    pub decode_sample_secs: u32,
}

fn default_duration_tolerance() -> f64 {
    5.0
}

fn default_decode_sample_secs() -> u32 {
    10
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            duration_tolerance_secs: default_duration_tolerance(),
            decode_sample_secs: default_decode_sample_secs(),
        }
    }
}

/// Why a transcode output was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyFailure {
    #[error("no duration")]
    NoDuration,

    #[error("duration mismatch (original {original:.2}s, compressed {compressed:.2}s)")]
    DurationMismatch { original: f64, compressed: f64 },

    #[error("wrong codec ({})", .found.as_deref().unwrap_or("unknown"))]
    WrongCodec { found: Option<String> },

    #[error("decode test failed: {reason}")]
    DecodeTestFailed { reason: String },
}

impl VerifyFailure {
    /// Short, stable name of the failed check.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoDuration => "no duration",
            Self::DurationMismatch { .. } => "duration mismatch",
            Self::WrongCodec { .. } => "wrong codec",
            Self::DecodeTestFailed { .. } => "decode test failed",
        }
    }
}

/// Facts established about an output that passed every check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedOutput {
    pub duration_secs: f64,
    pub codec: String,
}
