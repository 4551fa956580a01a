//! Mock media engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, RwLock};

use crate::engine::{
    EngineError, MediaEngine, TranscodeJob, TranscodeProgress, TranscodeResult,
};

/// Bytes written at the start of every file the mock "encodes".
///
/// Probing a file that starts with this marker reports the output codec, so a
/// library file replaced in an earlier run probes as already converted.
pub const MOCK_HEVC_MARKER: &[u8] = b"SQUEEZE-MOCK-HEVC";

/// Codec reported for files with no configured codec.
pub const MOCK_DEFAULT_CODEC: &str = "h264";

/// Duration reported for files with no configured duration.
pub const MOCK_DEFAULT_DURATION: f64 = 3600.0;

/// A call made to the mock, for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Transcode { job: TranscodeJob, success: bool },
    DecodeSample { path: PathBuf, secs: u32 },
    Validate,
}

/// Size of the file produced by a mock transcode.
#[derive(Debug, Clone, Copy, PartialEq)]
enum OutputSize {
    /// Fraction of the source size.
    Ratio(f64),
    Bytes(u64),
}

/// Mock implementation of the MediaEngine trait.
///
/// Transcodes write a real (sparse) file of the configured size next to the
/// source, so the placer and ratio gate see real filesystem state.
///
/// - Codec and duration can be configured per path
/// - Transcode output size, codec and duration are configurable
/// - The next transcode can be made to fail, optionally leaving a partial file
/// - Decode tests and tool validation can be made to fail
///
/// # Example
///
/// ```rust,ignore
/// use squeeze_core::testing::MockEngine;
///
/// let engine = MockEngine::new();
/// engine.set_output_ratio(0.9).await;
///
/// let outcome = processor.process(&intake).await;
/// assert_eq!(engine.transcode_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockEngine {
    codecs: Arc<RwLock<HashMap<PathBuf, Option<String>>>>,
    durations: Arc<RwLock<HashMap<PathBuf, Option<f64>>>>,
    output_codec: Arc<RwLock<Option<String>>>,
    /// `None` means the output gets the job's source duration.
    output_duration: Arc<RwLock<Option<Option<f64>>>>,
    output_size: Arc<RwLock<OutputSize>>,
    /// If set, the next transcode fails with this message.
    transcode_error: Arc<RwLock<Option<String>>>,
    write_partial_on_error: Arc<RwLock<bool>>,
    decode_failure: Arc<RwLock<Option<String>>>,
    validate_failure: Arc<RwLock<bool>>,
    calls: Arc<RwLock<Vec<EngineCall>>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a new mock engine that encodes to 40% of the source size.
    pub fn new() -> Self {
        Self {
            codecs: Arc::new(RwLock::new(HashMap::new())),
            durations: Arc::new(RwLock::new(HashMap::new())),
            output_codec: Arc::new(RwLock::new(Some("hevc".to_string()))),
            output_duration: Arc::new(RwLock::new(None)),
            output_size: Arc::new(RwLock::new(OutputSize::Ratio(0.4))),
            transcode_error: Arc::new(RwLock::new(None)),
            write_partial_on_error: Arc::new(RwLock::new(true)),
            decode_failure: Arc::new(RwLock::new(None)),
            validate_failure: Arc::new(RwLock::new(false)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the codec probed for a specific path (`None` = undeterminable).
    pub async fn set_codec(&self, path: impl AsRef<Path>, codec: Option<&str>) {
        self.codecs
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), codec.map(str::to_string));
    }

    /// Set the duration probed for a specific path (`None` = undeterminable).
    pub async fn set_duration(&self, path: impl AsRef<Path>, duration: Option<f64>) {
        self.durations
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), duration);
    }

    /// Set the codec reported for transcode outputs.
    pub async fn set_output_codec(&self, codec: Option<&str>) {
        *self.output_codec.write().await = codec.map(str::to_string);
    }

    /// Set the duration reported for transcode outputs.
    pub async fn set_output_duration(&self, duration: Option<f64>) {
        *self.output_duration.write().await = Some(duration);
    }

    /// Make transcode outputs this fraction of the source size.
    pub async fn set_output_ratio(&self, ratio: f64) {
        *self.output_size.write().await = OutputSize::Ratio(ratio);
    }

    /// Make transcode outputs exactly this many bytes.
    pub async fn set_output_size(&self, bytes: u64) {
        *self.output_size.write().await = OutputSize::Bytes(bytes);
    }

    /// Configure the next transcode to fail with the given message.
    pub async fn set_transcode_error_message(&self, message: &str) {
        *self.transcode_error.write().await = Some(message.to_string());
    }

    /// Whether a failing transcode leaves a partial output behind.
    pub async fn set_write_partial_on_error(&self, enabled: bool) {
        *self.write_partial_on_error.write().await = enabled;
    }

    /// Make every decode test fail with this message (`None` to clear).
    pub async fn set_decode_failure(&self, message: Option<&str>) {
        *self.decode_failure.write().await = message.map(str::to_string);
    }

    /// Make `validate` report a missing ffmpeg.
    pub async fn set_validate_failure(&self, fail: bool) {
        *self.validate_failure.write().await = fail;
    }

    /// Get all recorded calls.
    pub async fn calls(&self) -> Vec<EngineCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of transcodes attempted.
    pub async fn transcode_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, EngineCall::Transcode { .. }))
            .count()
    }

    /// Get the number of decode tests run.
    pub async fn decode_sample_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, EngineCall::DecodeSample { .. }))
            .count()
    }

    async fn record(&self, call: EngineCall) {
        self.calls.write().await.push(call);
    }

    async fn has_marker(path: &Path) -> bool {
        let Ok(mut file) = tokio::fs::File::open(path).await else {
            return false;
        };
        let mut head = vec![0u8; MOCK_HEVC_MARKER.len()];
        match file.read_exact(&mut head).await {
            Ok(_) => head == MOCK_HEVC_MARKER,
            Err(_) => false,
        }
    }

    async fn output_bytes(&self, source: &Path) -> Result<u64, EngineError> {
        let size = match *self.output_size.read().await {
            OutputSize::Bytes(bytes) => bytes,
            OutputSize::Ratio(ratio) => {
                let source_len = tokio::fs::metadata(source).await?.len();
                (source_len as f64 * ratio).round() as u64
            }
        };
        Ok(size)
    }

    /// Writes the marker then extends to `size`, leaving the rest sparse.
    async fn write_output(path: &Path, size: u64) -> Result<(), EngineError> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(MOCK_HEVC_MARKER).await?;
        file.set_len(size).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl MediaEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe_codec(&self, path: &Path) -> Option<String> {
        if !path.exists() {
            return None;
        }
        if let Some(codec) = self.codecs.read().await.get(path) {
            return codec.clone();
        }
        if Self::has_marker(path).await {
            return self.output_codec.read().await.clone();
        }
        Some(MOCK_DEFAULT_CODEC.to_string())
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        if !path.exists() {
            return None;
        }
        match self.durations.read().await.get(path) {
            Some(duration) => *duration,
            None => Some(MOCK_DEFAULT_DURATION),
        }
    }

    async fn transcode(
        &self,
        job: &TranscodeJob,
        progress_tx: Option<mpsc::Sender<TranscodeProgress>>,
    ) -> Result<TranscodeResult, EngineError> {
        if let Some(message) = self.transcode_error.write().await.take() {
            self.record(EngineCall::Transcode {
                job: job.clone(),
                success: false,
            })
            .await;
            if *self.write_partial_on_error.read().await {
                tokio::fs::write(&job.destination, b"partial output").await?;
            }
            return Err(EngineError::transcode_failed(
                message,
                Some("mock ffmpeg stderr".to_string()),
            ));
        }

        if !job.source.exists() {
            self.record(EngineCall::Transcode {
                job: job.clone(),
                success: false,
            })
            .await;
            return Err(EngineError::InputNotFound {
                path: job.source.clone(),
            });
        }

        let size = self.output_bytes(&job.source).await?;
        Self::write_output(&job.destination, size).await?;

        let output_codec = self.output_codec.read().await.clone();
        self.codecs
            .write()
            .await
            .insert(job.destination.clone(), output_codec);
        let output_duration = self
            .output_duration
            .read()
            .await
            .unwrap_or(job.total_duration);
        self.durations
            .write()
            .await
            .insert(job.destination.clone(), output_duration);

        if let Some(tx) = progress_tx {
            let total = job.total_duration.unwrap_or(0.0);
            let _ = tx.try_send(TranscodeProgress {
                percent: 100.0,
                processed_secs: total,
                total_secs: total,
                eta_secs: 0.0,
                speed: Some("1.0x".to_string()),
            });
        }

        self.record(EngineCall::Transcode {
            job: job.clone(),
            success: true,
        })
        .await;

        Ok(TranscodeResult {
            output_path: job.destination.clone(),
            output_size_bytes: size,
            duration_ms: 0,
        })
    }

    async fn decode_sample(&self, path: &Path, secs: u32) -> Result<(), EngineError> {
        self.record(EngineCall::DecodeSample {
            path: path.to_path_buf(),
            secs,
        })
        .await;
        match self.decode_failure.read().await.as_deref() {
            Some(message) => Err(EngineError::decode_failed(message)),
            None => Ok(()),
        }
    }

    async fn validate(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Validate).await;
        if *self.validate_failure.read().await {
            return Err(EngineError::FfmpegNotFound {
                path: PathBuf::from("ffmpeg"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_transcode_writes_sized_output() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Film.mkv");
        std::fs::write(&source, vec![0u8; 1000]).unwrap();

        let engine = MockEngine::new();
        let job = TranscodeJob::for_source(source.clone(), 28, "medium".into(), Some(60.0));
        let result = engine.transcode(&job, None).await.unwrap();

        assert_eq!(result.output_size_bytes, 400);
        assert_eq!(std::fs::metadata(&job.destination).unwrap().len(), 400);
        assert_eq!(engine.probe_codec(&job.destination).await.as_deref(), Some("hevc"));
        assert_eq!(engine.probe_duration(&job.destination).await, Some(60.0));
        assert_eq!(engine.probe_codec(&source).await.as_deref(), Some("h264"));
        assert_eq!(engine.transcode_count().await, 1);
    }

    #[tokio::test]
    async fn test_marker_survives_rename() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Film.mkv");
        std::fs::write(&source, vec![0u8; 1000]).unwrap();

        let engine = MockEngine::new();
        let job = TranscodeJob::for_source(source.clone(), 28, "medium".into(), None);
        engine.transcode(&job, None).await.unwrap();
        std::fs::rename(&job.destination, &source).unwrap();

        assert_eq!(engine.probe_codec(&source).await.as_deref(), Some("hevc"));
    }

    #[tokio::test]
    async fn test_injected_error_is_taken_once() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Film.mkv");
        std::fs::write(&source, vec![0u8; 10]).unwrap();

        let engine = MockEngine::new();
        engine.set_transcode_error_message("encoder crashed").await;
        let job = TranscodeJob::for_source(source, 28, "medium".into(), None);

        let err = engine.transcode(&job, None).await.unwrap_err();
        assert!(err.to_string().contains("encoder crashed"));
        assert!(job.destination.exists());
        assert!(engine.transcode(&job, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_path_probes_none() {
        let engine = MockEngine::new();
        let missing = Path::new("/nonexistent/Film.mkv");
        assert_eq!(engine.probe_codec(missing).await, None);
        assert_eq!(engine.probe_duration(missing).await, None);
    }
}
