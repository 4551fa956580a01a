//! Replacement protocol integration tests.
//!
//! These drive the `ReplacementProcessor` with the mock engine against real
//! files in a temp directory:
//! - Skip paths (no match, already HEVC, dry run) leave the filesystem alone
//! - Every failure path keeps the original and removes the temp output
//! - The ratio gate and a successful swap, on 10 GB sparse files
//! - Swap failures before and after the rename commits

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use walkdir::WalkDir;

use squeeze_core::{
    engine::temp_output_path,
    processor::{OutcomeRecord, ProtocolState, ReplacementProcessor, NO_MATCH_ERROR},
    testing::{fixtures, MockEngine, MockPlacer, SwapFailure, MOCK_HEVC_MARKER},
    Config,
};

const GB: u64 = 1024 * 1024 * 1024;

struct TestHarness {
    processor: ReplacementProcessor<MockEngine, MockPlacer>,
    engine: Arc<MockEngine>,
    placer: Arc<MockPlacer>,
    config: Config,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = fixtures::config_in(temp_dir.path());
        customize(&mut config);

        let engine = Arc::new(MockEngine::new());
        let placer = Arc::new(MockPlacer::new());
        let processor = ReplacementProcessor::new(
            Arc::new(config.clone()),
            Arc::clone(&engine),
            Arc::clone(&placer),
        );

        Self {
            processor,
            engine,
            placer,
            config,
            temp_dir,
        }
    }

    /// Small intake/library pair with distinct, checkable contents.
    fn small_pair(&self, name: &str) -> (PathBuf, PathBuf) {
        let intake = self.config.downloads_dir.join(name);
        let library = self.config.movies_dir.join("Film (2020)").join(name);
        fs::create_dir_all(library.parent().unwrap()).unwrap();
        fs::write(&intake, b"freshly downloaded copy").unwrap();
        fs::write(&library, original_bytes()).unwrap();
        (intake, library)
    }

    async fn process(&self, intake: &Path) -> OutcomeRecord {
        self.processor.process(intake).await
    }

    /// Every file under the temp dir with its size.
    fn snapshot(&self) -> BTreeMap<PathBuf, u64> {
        WalkDir::new(self.temp_dir.path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.path().to_path_buf(), e.metadata().unwrap().len()))
            .collect()
    }
}

fn original_bytes() -> Vec<u8> {
    (0..2048u32).map(|i| (i % 251) as u8).collect()
}

fn head(path: &Path, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    fs::File::open(path).unwrap().read_exact(&mut buf).unwrap();
    buf
}

fn assert_untouched(library: &Path) {
    assert_eq!(fs::read(library).unwrap(), original_bytes());
    assert!(!temp_output_path(library).exists(), "temp output left behind");
}

#[tokio::test]
async fn test_no_match_leaves_filesystem_unchanged() {
    let harness = TestHarness::new();
    let intake = harness.config.downloads_dir.join("Unknown.mkv");
    fs::write(&intake, b"data").unwrap();
    let before = harness.snapshot();

    let outcome = harness.process(&intake).await;

    assert!(!outcome.success);
    assert_eq!(outcome.state, ProtocolState::NoMatch);
    assert_eq!(outcome.error.as_deref(), Some(NO_MATCH_ERROR));
    assert!(outcome.matched.is_none());
    assert_eq!(harness.snapshot(), before);
    assert_eq!(harness.engine.transcode_count().await, 0);
}

#[tokio::test]
async fn test_shows_root_is_searched_after_movies() {
    let harness = TestHarness::new();
    let intake = harness.config.downloads_dir.join("Show.S01E01.mkv");
    let episode = harness.config.shows_dir.join("Show").join("Season 1").join("Show.S01E01.mkv");
    fs::write(&intake, b"data").unwrap();
    fs::create_dir_all(episode.parent().unwrap()).unwrap();
    fs::write(&episode, vec![7u8; 1000]).unwrap();

    let outcome = harness.process(&intake).await;

    assert_eq!(outcome.state, ProtocolState::Done, "{:?}", outcome.error);
    assert_eq!(outcome.matched.as_deref(), Some(episode.as_path()));
}

#[tokio::test]
async fn test_already_target_codec_is_not_transcoded() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.engine.set_codec(&library, Some("HEVC")).await;

    let outcome = harness.process(&intake).await;

    assert!(!outcome.success);
    assert_eq!(outcome.state, ProtocolState::AlreadyTargetCodec);
    assert_eq!(outcome.error.as_deref(), Some("already target codec (HEVC)"));
    assert_eq!(harness.engine.transcode_count().await, 0);
    assert_untouched(&library);
    assert!(intake.exists());
}

#[tokio::test]
async fn test_second_pass_over_replaced_file_is_a_no_op() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");

    let first = harness.process(&intake).await;
    assert_eq!(first.state, ProtocolState::Done, "{:?}", first.error);

    fs::write(&intake, b"downloaded again").unwrap();
    let second = harness.process(&intake).await;

    assert_eq!(second.state, ProtocolState::AlreadyTargetCodec);
    assert_eq!(harness.engine.transcode_count().await, 1);
    assert_eq!(harness.placer.recorded_swaps().await.len(), 1);
    assert!(head(&library, MOCK_HEVC_MARKER.len()) == MOCK_HEVC_MARKER);
}

#[tokio::test]
async fn test_verify_wrong_codec_keeps_original() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.engine.set_output_codec(Some("h264")).await;

    let outcome = harness.process(&intake).await;

    assert_eq!(outcome.state, ProtocolState::VerifyFailed);
    assert!(outcome.error.unwrap().starts_with("verification failed:"));
    assert_untouched(&library);
    assert!(intake.exists());
}

#[tokio::test]
async fn test_verify_duration_mismatch_keeps_original() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.engine.set_output_duration(Some(3594.0)).await;

    let outcome = harness.process(&intake).await;

    assert_eq!(outcome.state, ProtocolState::VerifyFailed);
    assert_untouched(&library);
}

#[tokio::test]
async fn test_verify_missing_output_duration_keeps_original() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.engine.set_output_duration(None).await;

    let outcome = harness.process(&intake).await;

    assert_eq!(outcome.state, ProtocolState::VerifyFailed);
    assert_untouched(&library);
}

#[tokio::test]
async fn test_verify_decode_failure_keeps_original() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness
        .engine
        .set_decode_failure(Some("corrupt frame at 00:00:03"))
        .await;

    let outcome = harness.process(&intake).await;

    assert_eq!(outcome.state, ProtocolState::VerifyFailed);
    assert!(outcome.error.unwrap().contains("corrupt frame"));
    assert_untouched(&library);
}

#[tokio::test]
async fn test_unknown_source_duration_skips_duration_check() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.engine.set_duration(&library, None).await;
    harness.engine.set_output_duration(Some(42.0)).await;

    let outcome = harness.process(&intake).await;

    assert_eq!(outcome.state, ProtocolState::Done, "{:?}", outcome.error);
}

#[tokio::test]
async fn test_transcode_failure_removes_partial_output() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.engine.set_transcode_error_message("x265 [error]").await;

    let outcome = harness.process(&intake).await;

    assert_eq!(outcome.state, ProtocolState::TranscodeFailed);
    assert!(outcome.error.unwrap().starts_with("transcode failed:"));
    assert_untouched(&library);
    assert!(intake.exists());
}

#[tokio::test]
async fn test_ratio_gate_rejects_ten_to_nine_gb() {
    let harness = TestHarness::new();
    let (intake, library) = fixtures::movie_pair(&harness.config, "Big.mkv", 10 * GB);
    harness.engine.set_output_size(9 * GB).await;

    let outcome = harness.process(&intake).await;

    assert!(!outcome.success);
    assert_eq!(outcome.state, ProtocolState::InsufficientGain);
    assert_eq!(
        outcome.error.as_deref(),
        Some("insufficient compression (90.00%)")
    );
    assert_eq!(outcome.space_saved_bytes, 0);
    assert_eq!(fs::metadata(&library).unwrap().len(), 10 * GB);
    assert_eq!(head(&library, 16), vec![b'o'; 16]);
    assert!(!temp_output_path(&library).exists());
    assert!(intake.exists());
}

#[tokio::test]
async fn test_ten_to_four_gb_replaces_original() {
    let harness = TestHarness::new();
    let (intake, library) = fixtures::movie_pair(&harness.config, "Big.mkv", 10 * GB);
    harness.engine.set_output_size(4 * GB).await;

    let outcome = harness.process(&intake).await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.state, ProtocolState::Done);
    assert_eq!(outcome.original_size_bytes, 10 * GB);
    assert_eq!(outcome.compressed_size_bytes, 4 * GB);
    assert_eq!(outcome.space_saved_bytes, 6 * GB);
    assert_eq!(outcome.compression_ratio(), Some(0.4));
    assert_eq!(fs::metadata(&library).unwrap().len(), 4 * GB);
    assert!(head(&library, MOCK_HEVC_MARKER.len()) == MOCK_HEVC_MARKER);
    assert!(!temp_output_path(&library).exists());
    assert!(!intake.exists());
}

#[tokio::test]
async fn test_dry_run_estimates_half_and_touches_nothing() {
    let harness = TestHarness::with_config(|c| c.dry_run = true);
    let (intake, _library) = fixtures::movie_pair(&harness.config, "Big.mkv", 10 * GB);
    let before = harness.snapshot();

    let outcome = harness.process(&intake).await;

    assert!(outcome.success);
    assert_eq!(outcome.state, ProtocolState::DryRun);
    assert_eq!(outcome.compressed_size_bytes, 5 * GB);
    assert_eq!(outcome.space_saved_bytes, 5 * GB);
    assert_eq!(harness.engine.transcode_count().await, 0);
    assert_eq!(harness.engine.decode_sample_count().await, 0);
    assert!(harness.placer.recorded_swaps().await.is_empty());
    assert_eq!(harness.snapshot(), before);
}

#[tokio::test]
async fn test_dry_run_still_skips_target_codec() {
    let harness = TestHarness::with_config(|c| c.dry_run = true);
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.engine.set_codec(&library, Some("h265")).await;

    let outcome = harness.process(&intake).await;

    assert_eq!(outcome.state, ProtocolState::AlreadyTargetCodec);
    assert_eq!(outcome.space_saved_bytes, 0);
}

#[tokio::test]
async fn test_swap_failure_before_rename_keeps_original() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.placer.fail_next_swap(SwapFailure::BeforeCommit).await;

    let outcome = harness.process(&intake).await;

    assert!(!outcome.success);
    assert_eq!(outcome.state, ProtocolState::SwapFailed);
    assert!(outcome.error.unwrap().starts_with("swap failed:"));
    assert_untouched(&library);
    assert!(intake.exists());
}

#[tokio::test]
async fn test_swap_failure_after_rename_is_data_loss_risk() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.placer.fail_next_swap(SwapFailure::AfterCommit).await;

    let outcome = harness.process(&intake).await;

    assert!(!outcome.success);
    assert_eq!(outcome.state, ProtocolState::DataLossRisk);
    assert!(outcome
        .error
        .unwrap()
        .starts_with("replacement unconfirmed after swap:"));
    assert!(library.exists());
    assert!(intake.exists(), "intake copy must be kept for recovery");
}

#[tokio::test]
async fn test_unreadable_original_size_is_probe_failure() {
    let harness = TestHarness::new();
    let (intake, library) = harness.small_pair("Film.mkv");
    harness.placer.set_size_unreadable(&library).await;

    let outcome = harness.process(&intake).await;

    assert!(!outcome.success);
    assert_eq!(outcome.state, ProtocolState::ProbeFailed);
    assert_eq!(harness.engine.transcode_count().await, 0);
    assert_untouched(&library);
}

#[tokio::test]
async fn test_intake_cleanup_failure_does_not_fail_outcome() {
    let harness = TestHarness::new();
    let (intake, _library) = harness.small_pair("Film.mkv");
    harness.placer.set_fail_remove_intake(true).await;

    let outcome = harness.process(&intake).await;

    assert!(outcome.success);
    assert_eq!(outcome.state, ProtocolState::Done);
    assert!(intake.exists());
}

#[tokio::test]
async fn test_intake_inside_library_is_not_deleted() {
    let harness = TestHarness::with_config(|c| c.downloads_dir = c.movies_dir.clone());
    let library = harness.config.movies_dir.join("Film.mkv");
    fs::write(&library, original_bytes()).unwrap();

    let outcome = harness.process(&library).await;

    assert_eq!(outcome.state, ProtocolState::Done, "{:?}", outcome.error);
    assert!(library.exists());
    assert!(head(&library, MOCK_HEVC_MARKER.len()) == MOCK_HEVC_MARKER);
}
