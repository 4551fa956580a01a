//! Trait definitions for the engine module.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::error::EngineError;
use super::types::{ProbeResult, TranscodeJob, TranscodeProgress, TranscodeResult};

/// The external media tools: probing, transcoding and decode sampling.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Codec of the first video stream, lower-cased. `None` if undeterminable.
    async fn probe_codec(&self, path: &Path) -> Option<String>;

    /// Container duration in seconds. `None` if undeterminable.
    async fn probe_duration(&self, path: &Path) -> Option<f64>;

    /// Probes codec and duration together.
    async fn probe(&self, path: &Path) -> ProbeResult {
        ProbeResult {
            codec: self.probe_codec(path).await,
            duration_secs: self.probe_duration(path).await,
        }
    }

    /// Re-encodes `job.source` into `job.destination`.
    ///
    /// Milestone updates are sent on `progress_tx` when given; a full or
    /// closed channel never stalls the encode. On error the destination may
    /// hold partial output and is the caller's to delete.
    async fn transcode(
        &self,
        job: &TranscodeJob,
        progress_tx: Option<mpsc::Sender<TranscodeProgress>>,
    ) -> Result<TranscodeResult, EngineError>;

    /// Decodes the first `secs` seconds of `path`, discarding the frames.
    async fn decode_sample(&self, path: &Path, secs: u32) -> Result<(), EngineError>;

    /// Validates that the engine's tools are installed and runnable.
    async fn validate(&self) -> Result<(), EngineError>;
}
