//! Engine module: the external ffprobe/ffmpeg tools behind one trait.
//!
//! This module provides the `MediaEngine` trait and its FFmpeg implementation.
//! The engine is the only part of the crate that spawns subprocesses.
//!
//! # Features
//!
//! - Codec and duration probing that never fails loudly (absent on error)
//! - HEVC transcoding with audio/subtitle passthrough and fail-fast errors
//! - Progress parsing from `-progress` output with 10% milestones and ETA
//! - Decode-to-null integrity sampling
//! - Hard timeouts on every invocation
//!
//! # Example
//!
//! ```ignore
//! use squeeze_core::engine::{FfmpegEngine, MediaEngine, TranscodeJob};
//!
//! let engine = FfmpegEngine::with_defaults();
//! engine.validate().await?;
//!
//! let codec = engine.probe_codec(Path::new("/media/movie.mkv")).await;
//! let job = TranscodeJob::for_source(
//!     PathBuf::from("/media/movie.mkv"),
//!     23,
//!     "slow".to_string(),
//!     engine.probe_duration(Path::new("/media/movie.mkv")).await,
//! );
//! let result = engine.transcode(&job, None).await?;
//! println!("Wrote {} bytes in {} ms", result.output_size_bytes, result.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod progress;
mod traits;
mod types;

pub use config::EngineConfig;
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use progress::{parse_progress_line, ProgressSignal, ProgressTracker};
pub use traits::MediaEngine;
pub use types::{
    is_temp_output_name, temp_output_path, ProbeResult, TargetCodec, TranscodeJob,
    TranscodeProgress, TranscodeResult, HEVC,
};
