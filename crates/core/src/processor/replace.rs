//! The replacement protocol.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::engine::{MediaEngine, TargetCodec, TranscodeJob, TranscodeProgress, HEVC};
use crate::library::find_matching_media;
use crate::placer::{IntakeCleanup, Placer, SwapRequest};
use crate::verifier::Verifier;

use super::types::{
    compression_ratio, insufficient_compression_message, OutcomeRecord, ProtocolState,
    NO_MATCH_ERROR,
};

/// Drives one intake candidate from discovery to a terminal state.
///
/// The library file is only ever replaced by a rename of an output that has
/// passed verification and the ratio gate. Every other path out of the
/// protocol deletes the temp output and leaves the library file as it was.
pub struct ReplacementProcessor<E: MediaEngine, P: Placer> {
    config: Arc<Config>,
    engine: Arc<E>,
    placer: Arc<P>,
    target: TargetCodec,
}

impl<E: MediaEngine, P: Placer> ReplacementProcessor<E, P> {
    /// Creates a processor converting to HEVC.
    pub fn new(config: Arc<Config>, engine: Arc<E>, placer: Arc<P>) -> Self {
        Self {
            config,
            engine,
            placer,
            target: HEVC,
        }
    }

    /// Processes one candidate. Never fails: every outcome is a record.
    pub async fn process(&self, candidate: &Path) -> OutcomeRecord {
        self.process_with_progress(candidate, None).await
    }

    /// Like [`process`](Self::process), forwarding transcode milestones.
    pub async fn process_with_progress(
        &self,
        candidate: &Path,
        progress_tx: Option<mpsc::Sender<TranscodeProgress>>,
    ) -> OutcomeRecord {
        let name = candidate
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let span = info_span!("candidate", file = %name);

        async {
            let start = Instant::now();
            let mut outcome = OutcomeRecord::new(candidate);
            self.run(candidate, &mut outcome, progress_tx).await;
            outcome.elapsed_ms = start.elapsed().as_millis() as u64;
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        candidate: &Path,
        outcome: &mut OutcomeRecord,
        progress_tx: Option<mpsc::Sender<TranscodeProgress>>,
    ) {
        info!(path = %candidate.display(), "Processing candidate");

        // Discovered -> Matched
        let Some(media) = self.find_match(candidate).await else {
            info!("No matching media file found");
            return finish(outcome, ProtocolState::NoMatch, Some(NO_MATCH_ERROR.to_string()));
        };
        outcome.matched = Some(media.clone());
        transition(outcome, ProtocolState::Matched);
        info!(media = %media.display(), "Found match");

        let original_size = match self.placer.file_size(&media).await {
            Ok(size) => size,
            Err(e) => {
                warn!(media = %media.display(), error = %e, "Cannot read size of matched file");
                return finish(
                    outcome,
                    ProtocolState::ProbeFailed,
                    Some(format!("cannot read matched file size: {}", e)),
                );
            }
        };
        outcome.original_size_bytes = original_size;

        let codec = self.engine.probe_codec(&media).await;
        if let Some(codec) = codec.as_deref().filter(|c| self.target.matches(c)) {
            info!(codec, "Already in target codec, skipping");
            return finish(
                outcome,
                ProtocolState::AlreadyTargetCodec,
                Some(format!("already target codec ({})", codec)),
            );
        }
        debug!(codec = codec.as_deref().unwrap_or("unknown"), "Source codec");

        if self.config.dry_run {
            let estimated = original_size / 2;
            outcome.compressed_size_bytes = estimated;
            outcome.space_saved_bytes = original_size - estimated;
            info!(
                original_bytes = original_size,
                estimated_bytes = estimated,
                "[DRY RUN] Would compress"
            );
            outcome.success = true;
            return finish(outcome, ProtocolState::DryRun, None);
        }

        // Matched -> Probed
        let duration = self.engine.probe_duration(&media).await;
        if duration.is_none() {
            warn!(media = %media.display(), "Source duration unknown, duration check will be skipped");
        }
        transition(outcome, ProtocolState::Probed);

        let job = TranscodeJob::for_source(
            media.clone(),
            self.config.compression_crf,
            self.config.compression_preset.clone(),
            duration,
        );
        match self.placer.discard(&job.destination).await {
            Ok(true) => warn!(temp = %job.destination.display(), "Removed stale temp output"),
            Ok(false) => {}
            Err(e) => warn!(temp = %job.destination.display(), error = %e, "Failed to remove stale temp output"),
        }

        // Probed -> Transcoding
        transition(outcome, ProtocolState::Transcoding);
        let result = match self.engine.transcode(&job, progress_tx).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    error = %e,
                    diagnostics = e.diagnostics().unwrap_or(""),
                    "Transcode failed"
                );
                self.discard(&job.destination).await;
                return finish(
                    outcome,
                    ProtocolState::TranscodeFailed,
                    Some(format!("transcode failed: {}", e)),
                );
            }
        };
        info!(
            output_bytes = result.output_size_bytes,
            duration_ms = result.duration_ms,
            "Transcode finished"
        );

        // Transcoding -> Verifying
        transition(outcome, ProtocolState::Verifying);
        let verifier = Verifier::new(self.engine.as_ref(), &self.config.verify, self.target);
        if let Err(failure) = verifier.verify(duration, &job.destination).await {
            error!(reason = failure.reason(), error = %failure, "Compressed file failed verification");
            self.discard(&job.destination).await;
            return finish(
                outcome,
                ProtocolState::VerifyFailed,
                Some(format!("verification failed: {}", failure)),
            );
        }

        // Verifying -> RatioCheck
        transition(outcome, ProtocolState::RatioCheck);
        let compressed_size = match self.placer.file_size(&job.destination).await {
            Ok(size) => size,
            Err(e) => {
                error!(error = %e, "Cannot read size of compressed file");
                self.discard(&job.destination).await;
                return finish(
                    outcome,
                    ProtocolState::VerifyFailed,
                    Some(format!("cannot read compressed file size: {}", e)),
                );
            }
        };
        outcome.compressed_size_bytes = compressed_size;
        outcome.space_saved_bytes = original_size.saturating_sub(compressed_size);

        let ratio = compression_ratio(original_size, compressed_size);
        if ratio > self.config.min_compression_ratio {
            warn!(
                ratio,
                threshold = self.config.min_compression_ratio,
                "Compression ratio above threshold, keeping original"
            );
            self.discard(&job.destination).await;
            outcome.space_saved_bytes = 0;
            return finish(
                outcome,
                ProtocolState::InsufficientGain,
                Some(insufficient_compression_message(ratio)),
            );
        }
        info!(
            original_bytes = original_size,
            compressed_bytes = compressed_size,
            ratio,
            "Compression accepted"
        );

        // RatioCheck -> Swapping
        transition(outcome, ProtocolState::Swapping);
        let request = SwapRequest {
            replacement: job.destination.clone(),
            original: media.clone(),
            expected_size: compressed_size,
        };
        match self.placer.swap(&request).await {
            Ok(receipt) => {
                info!(path = %receipt.path.display(), duration_ms = receipt.duration_ms, "Replaced original");
            }
            Err(e) if e.replacement_committed() => {
                error!(
                    original = %media.display(),
                    replacement = %job.destination.display(),
                    candidate = %candidate.display(),
                    expected_bytes = compressed_size,
                    original_bytes = original_size,
                    error = %e,
                    "DATA LOSS RISK: original was replaced but the replacement could not be confirmed"
                );
                return finish(
                    outcome,
                    ProtocolState::DataLossRisk,
                    Some(format!("replacement unconfirmed after swap: {}", e)),
                );
            }
            Err(e) => {
                error!(error = %e, "Swap failed, original untouched");
                self.discard(&job.destination).await;
                return finish(
                    outcome,
                    ProtocolState::SwapFailed,
                    Some(format!("swap failed: {}", e)),
                );
            }
        }

        match self.placer.remove_intake(candidate, &media).await {
            Ok(IntakeCleanup::Removed) => info!(path = %candidate.display(), "Deleted intake file"),
            Ok(IntakeCleanup::SameFile) => {
                info!(path = %candidate.display(), "Intake file is the library file, keeping it")
            }
            Ok(IntakeCleanup::AlreadyGone) => debug!("Intake file already gone"),
            Err(e) => warn!(path = %candidate.display(), error = %e, "Failed to delete intake file"),
        }

        outcome.success = true;
        finish(outcome, ProtocolState::Done, None);
    }

    async fn find_match(&self, candidate: &Path) -> Option<PathBuf> {
        let name = candidate.file_name()?.to_os_string();
        let roots = self.config.library_roots();
        match tokio::task::spawn_blocking(move || find_matching_media(&name, &roots)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Library search task failed");
                None
            }
        }
    }

    /// Deletes a temp output, logging instead of failing.
    async fn discard(&self, path: &Path) {
        match self.placer.discard(path).await {
            Ok(removed) => debug!(temp = %path.display(), removed, "Discarded temp output"),
            Err(e) => warn!(temp = %path.display(), error = %e, "Failed to delete temp output"),
        }
    }
}

fn transition(outcome: &mut OutcomeRecord, state: ProtocolState) {
    debug!(from = %outcome.state, to = %state, "State transition");
    outcome.state = state;
}

fn finish(outcome: &mut OutcomeRecord, state: ProtocolState, error: Option<String>) {
    debug_assert!(state.is_terminal(), "{} is not a terminal state", state);
    transition(outcome, state);
    outcome.error = error;
}
