//! Processor module: the per-file replacement protocol.
//!
//! This module provides the `ReplacementProcessor`, which takes one intake
//! candidate through
//! - Matching: finding the library copy with the same file name
//! - Probing: size, codec and duration of the library copy
//! - Transcoding: re-encoding into a sibling temp file
//! - Verification and the compression-ratio gate
//! - Swapping: renaming the temp file over the library copy
//!
//! Every path ends in an `OutcomeRecord`; per-file failures never escape as
//! errors.
//!
//! # Example
//!
//! ```ignore
//! use squeeze_core::processor::ReplacementProcessor;
//! use squeeze_core::engine::FfmpegEngine;
//! use squeeze_core::placer::FsPlacer;
//!
//! let processor = ReplacementProcessor::new(
//!     Arc::new(config),
//!     Arc::new(FfmpegEngine::with_defaults()),
//!     Arc::new(FsPlacer::new()),
//! );
//!
//! let outcome = processor.process(Path::new("/data/Downloads/Film.mkv")).await;
//! println!("{}: {}", outcome.state, outcome.success);
//! ```

mod replace;
mod types;

pub use replace::ReplacementProcessor;
pub use types::{
    compression_ratio, insufficient_compression_message, OutcomeRecord, ProtocolState,
    NO_MATCH_ERROR,
};
