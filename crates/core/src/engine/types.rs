//! Types for the engine module.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A codec the library is being converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCodec {
    /// Encoder passed to `-c:v`.
    pub encoder: &'static str,
    /// Codec names ffprobe may report for a stream already in this codec.
    pub identifiers: &'static [&'static str],
}

/// HEVC via libx265.
pub const HEVC: TargetCodec = TargetCodec {
    encoder: "libx265",
    identifiers: &["hevc", "h265"],
};

impl TargetCodec {
    /// Whether a probed codec name is this codec. Case-insensitive.
    pub fn matches(&self, codec: &str) -> bool {
        let codec = codec.trim();
        self.identifiers
            .iter()
            .any(|id| id.eq_ignore_ascii_case(codec))
    }
}

/// What ffprobe could tell about a file. `None` means undeterminable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// A single re-encode of one library file into a sibling temp file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeJob {
    /// File being re-encoded.
    pub source: PathBuf,
    /// Temp output, always in the source's directory.
    pub destination: PathBuf,
    /// x265 constant rate factor.
    pub crf: u8,
    /// x265 speed preset.
    pub preset: String,
    /// Source duration used for progress percentages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<f64>,
}

impl TranscodeJob {
    /// Creates a job writing to the temp output path next to `source`.
    pub fn for_source(
        source: PathBuf,
        crf: u8,
        preset: String,
        total_duration: Option<f64>,
    ) -> Self {
        let destination = temp_output_path(&source);
        Self {
            source,
            destination,
            crf,
            preset,
            total_duration,
        }
    }
}

/// Temp output path for a source: `<dir>/.<stem>.tmp<.ext>`.
///
/// The extension is kept so ffmpeg picks the same muxer as the source.
pub fn temp_output_path(source: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    if let Some(stem) = source.file_stem() {
        name.push(stem);
    }
    name.push(".tmp");
    if let Some(ext) = source.extension() {
        name.push(".");
        name.push(ext);
    }
    source.with_file_name(name)
}

/// Whether a file name has the shape produced by [`temp_output_path`].
pub fn is_temp_output_name(name: &str) -> bool {
    if !name.starts_with('.') {
        return false;
    }
    let without_ext = match name.rfind('.') {
        Some(idx) if idx > 0 && !name.ends_with(".tmp") => &name[..idx],
        _ => name,
    };
    without_ext.len() > ".tmp".len() + 1 && without_ext.ends_with(".tmp")
}

/// Result of a completed transcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeResult {
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    /// Wall-clock time spent encoding.
    pub duration_ms: u64,
}

/// Milestone progress update during a transcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeProgress {
    /// Percent complete (0-100).
    pub percent: f64,
    /// Seconds of output written so far.
    pub processed_secs: f64,
    /// Total seconds of input.
    pub total_secs: f64,
    /// Estimated seconds remaining.
    pub eta_secs: f64,
    /// Encoding speed as reported by ffmpeg (e.g. "1.5x").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
}
