use std::path::Path;
use tracing::{debug, warn};

use super::types::{VerifiedOutput, VerifyConfig, VerifyFailure};
use crate::engine::{MediaEngine, TargetCodec};

/// Runs the post-transcode checks against a compressed file.
pub struct Verifier<'a, E: MediaEngine + ?Sized> {
    engine: &'a E,
    config: &'a VerifyConfig,
    target: TargetCodec,
}

impl<'a, E: MediaEngine + ?Sized> Verifier<'a, E> {
    pub fn new(engine: &'a E, config: &'a VerifyConfig, target: TargetCodec) -> Self {
        Self {
            engine,
            config,
            target,
        }
    }

    /// Verifies `compressed` against the source it was made from.
    ///
    /// `original_duration` is `None` when the source could not be probed, in
    /// which case the duration comparison is skipped.
    pub async fn verify(
        &self,
        original_duration: Option<f64>,
        compressed: &Path,
    ) -> Result<VerifiedOutput, VerifyFailure> {
        let probe = self.engine.probe(compressed).await;
        let duration = match probe.duration_secs {
            Some(d) if d > 0.0 => d,
            _ => return Err(VerifyFailure::NoDuration),
        };

        match original_duration {
            Some(original) => {
                if (duration - original).abs() > self.config.duration_tolerance_secs {
                    return Err(VerifyFailure::DurationMismatch {
                        original,
                        compressed: duration,
                    });
                }
            }
            None => debug!(
                file = %compressed.display(),
                "Source duration unknown, skipping duration comparison"
            ),
        }

        let codec = match probe.codec {
            Some(c) if self.target.matches(&c) => c,
            found => return Err(VerifyFailure::WrongCodec { found }),
        };

        if let Err(e) = self
            .engine
            .decode_sample(compressed, self.config.decode_sample_secs)
            .await
        {
            warn!(file = %compressed.display(), error = %e, "Decode sample failed");
            let reason = e.diagnostics().map(str::to_string).unwrap_or_else(|| e.to_string());
            return Err(VerifyFailure::DecodeTestFailed { reason });
        }

        Ok(VerifiedOutput {
            duration_secs: duration,
            codec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HEVC;
    use crate::testing::MockEngine;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        compressed: PathBuf,
        engine: MockEngine,
        config: VerifyConfig,
    }

    async fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let compressed = temp.path().join(".Film.tmp.mkv");
        std::fs::write(&compressed, b"compressed").unwrap();

        let engine = MockEngine::new();
        engine.set_codec(&compressed, Some("hevc")).await;
        engine.set_duration(&compressed, Some(3600.0)).await;

        Fixture {
            _temp: temp,
            compressed,
            engine,
            config: VerifyConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_verify_passes() {
        let f = fixture().await;
        let verifier = Verifier::new(&f.engine, &f.config, HEVC);

        let verified = verifier.verify(Some(3602.0), &f.compressed).await.unwrap();
        assert_eq!(verified.codec, "hevc");
        assert_eq!(verified.duration_secs, 3600.0);
        assert_eq!(f.engine.decode_sample_count().await, 1);
    }

    #[tokio::test]
    async fn test_verify_no_duration() {
        let f = fixture().await;
        f.engine.set_duration(&f.compressed, None).await;
        let verifier = Verifier::new(&f.engine, &f.config, HEVC);

        let err = verifier.verify(Some(3600.0), &f.compressed).await.unwrap_err();
        assert_eq!(err, VerifyFailure::NoDuration);
    }

    #[tokio::test]
    async fn test_verify_zero_duration() {
        let f = fixture().await;
        f.engine.set_duration(&f.compressed, Some(0.0)).await;
        let verifier = Verifier::new(&f.engine, &f.config, HEVC);

        let err = verifier.verify(None, &f.compressed).await.unwrap_err();
        assert_eq!(err.reason(), "no duration");
    }

    #[tokio::test]
    async fn test_verify_duration_mismatch() {
        let f = fixture().await;
        let verifier = Verifier::new(&f.engine, &f.config, HEVC);

        let err = verifier.verify(Some(3700.0), &f.compressed).await.unwrap_err();
        assert_eq!(err.reason(), "duration mismatch");
        // Later checks never ran.
        assert_eq!(f.engine.decode_sample_count().await, 0);
    }

    #[tokio::test]
    async fn test_verify_tolerance_is_inclusive() {
        let f = fixture().await;
        let verifier = Verifier::new(&f.engine, &f.config, HEVC);

        assert!(verifier.verify(Some(3605.0), &f.compressed).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_unknown_original_skips_comparison() {
        let f = fixture().await;
        f.engine.set_duration(&f.compressed, Some(10.0)).await;
        let verifier = Verifier::new(&f.engine, &f.config, HEVC);

        assert!(verifier.verify(None, &f.compressed).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_wrong_codec() {
        let f = fixture().await;
        f.engine.set_codec(&f.compressed, Some("h264")).await;
        let verifier = Verifier::new(&f.engine, &f.config, HEVC);

        let err = verifier.verify(Some(3600.0), &f.compressed).await.unwrap_err();
        assert_eq!(
            err,
            VerifyFailure::WrongCodec {
                found: Some("h264".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_verify_accepts_h265_identifier() {
        let f = fixture().await;
        f.engine.set_codec(&f.compressed, Some("H265")).await;
        let verifier = Verifier::new(&f.engine, &f.config, HEVC);

        assert!(verifier.verify(Some(3600.0), &f.compressed).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_decode_failure() {
        let f = fixture().await;
        f.engine
            .set_decode_failure(Some("Invalid NAL unit size"))
            .await;
        let verifier = Verifier::new(&f.engine, &f.config, HEVC);

        let err = verifier.verify(Some(3600.0), &f.compressed).await.unwrap_err();
        assert_eq!(err.reason(), "decode test failed");
        assert!(err.to_string().contains("Invalid NAL unit size"));
    }
}
