//! Run coordinator implementation.

use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::MediaEngine;
use crate::library::find_video_files;
use crate::lock::RunLock;
use crate::notify::{LibraryRefresher, NotificationLevel, Notifier};
use crate::placer::Placer;
use crate::processor::{ProtocolState, ReplacementProcessor};

use super::types::{success_message, CoordinatorError, RunReport, RunSummary};

/// Message sent when the intake directory has no candidates.
pub const NO_VIDEOS_MESSAGE: &str = "No videos found in Downloads directory";

/// Runs one pass over the intake directory.
///
/// Candidates are processed one at a time in scan order. Only one run may be
/// active per lock file; a second run returns [`RunReport::Skipped`] without
/// touching anything.
pub struct RunCoordinator<E: MediaEngine, P: Placer> {
    config: Arc<Config>,
    engine: Arc<E>,
    processor: ReplacementProcessor<E, P>,
    notifier: Option<Arc<dyn Notifier>>,
    refresher: Option<Arc<dyn LibraryRefresher>>,
}

impl<E: MediaEngine, P: Placer> RunCoordinator<E, P> {
    pub fn new(config: Arc<Config>, engine: Arc<E>, placer: Arc<P>) -> Self {
        let processor =
            ReplacementProcessor::new(Arc::clone(&config), Arc::clone(&engine), placer);
        Self {
            config,
            engine,
            processor,
            notifier: None,
            refresher: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn LibraryRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Acquires the run lock and processes every intake candidate.
    ///
    /// The engine's tools are checked only once the lock is held, so a run
    /// that is skipped never spawns a subprocess. Per-file failures end up in
    /// the summary. Only lock, engine and scan errors abort the run; the lock
    /// is released on every path out.
    pub async fn run(&self) -> Result<RunReport, CoordinatorError> {
        let Some(lock) = RunLock::try_acquire(&self.config.lock_file)? else {
            info!(
                lock_file = %self.config.lock_file.display(),
                "Another run is in progress, skipping"
            );
            return Ok(RunReport::Skipped);
        };

        let run_id = Uuid::new_v4();
        let span = info_span!("run", run_id = %run_id);
        let result = self.run_locked(run_id).instrument(span).await;
        drop(lock);
        result.map(RunReport::Completed)
    }

    async fn run_locked(&self, run_id: Uuid) -> Result<RunSummary, CoordinatorError> {
        self.engine.validate().await?;
        info!(engine = self.engine.name(), "Media engine ready");

        let mut summary = RunSummary::new(run_id, self.config.dry_run);
        info!(
            downloads_dir = %self.config.downloads_dir.display(),
            crf = self.config.compression_crf,
            preset = %self.config.compression_preset,
            dry_run = self.config.dry_run,
            "Run started"
        );

        let intake = self.config.downloads_dir.clone();
        let candidates = tokio::task::spawn_blocking(move || find_video_files(&intake))
            .await
            .map_err(|e| CoordinatorError::Scan(e.to_string()))??;

        if candidates.is_empty() {
            info!("No videos to process");
            self.notify(NotificationLevel::Success, NO_VIDEOS_MESSAGE)
                .await;
            summary.finish();
            return Ok(summary);
        }
        info!(count = candidates.len(), "Found candidates");

        for (index, candidate) in candidates.iter().enumerate() {
            info!(
                index = index + 1,
                total = candidates.len(),
                path = %candidate.display(),
                "Starting candidate"
            );
            let outcome = self.processor.process(candidate).await;

            let record = serde_json::to_string(&outcome).unwrap_or_default();
            if outcome.state == ProtocolState::DataLossRisk {
                error!(outcome = %record, state = %outcome.state, "Candidate finished");
            } else {
                info!(outcome = %record, state = %outcome.state, "Candidate finished");
            }

            if outcome.state == ProtocolState::Done {
                self.notify(NotificationLevel::Success, &success_message(&outcome))
                    .await;
            }
            summary.record(outcome);
        }

        summary.finish();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            data_loss_risk = summary.data_loss_risk,
            bytes_saved = summary.bytes_saved,
            duration_secs = summary.duration_secs(),
            "Run finished"
        );

        let level = if summary.data_loss_risk > 0 {
            NotificationLevel::Error
        } else {
            NotificationLevel::Success
        };
        self.notify(level, &summary.message()).await;

        if !self.config.dry_run && summary.succeeded > 0 {
            self.refresh_library().await;
        }

        Ok(summary)
    }

    /// Sends a notification if a notifier is configured. Failures are logged.
    pub async fn notify(&self, level: NotificationLevel, message: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.notify(level, message).await {
            warn!(notifier = notifier.name(), error = %e, "Failed to send notification");
        }
    }

    async fn refresh_library(&self) {
        let Some(refresher) = &self.refresher else {
            return;
        };
        match refresher.refresh().await {
            Ok(()) => info!(refresher = refresher.name(), "Library refresh triggered"),
            Err(e) => warn!(refresher = refresher.name(), error = %e, "Failed to refresh library"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placer::FsPlacer;
    use crate::testing::fixtures::config_in;
    use crate::testing::{MockEngine, MockNotifier, MockRefresher};
    use std::fs;
    use tempfile::TempDir;

    fn coordinator(
        config: Config,
        notifier: Arc<MockNotifier>,
        refresher: Arc<MockRefresher>,
    ) -> RunCoordinator<MockEngine, FsPlacer> {
        RunCoordinator::new(
            Arc::new(config),
            Arc::new(MockEngine::new()),
            Arc::new(FsPlacer::new()),
        )
        .with_notifier(notifier)
        .with_refresher(refresher)
    }

    #[tokio::test]
    async fn test_empty_intake_notifies_no_videos() {
        let temp = TempDir::new().unwrap();
        let notifier = Arc::new(MockNotifier::new());
        let refresher = Arc::new(MockRefresher::new());
        let coordinator = coordinator(config_in(temp.path()), notifier.clone(), refresher.clone());

        let report = coordinator.run().await.unwrap();

        let RunReport::Completed(summary) = report else {
            panic!("expected completed run");
        };
        assert_eq!(summary.total, 0);
        let messages = notifier.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].1, NO_VIDEOS_MESSAGE);
        assert_eq!(refresher.refresh_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_intake_dir_is_empty_run() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        fs::remove_dir(&config.downloads_dir).unwrap();
        let notifier = Arc::new(MockNotifier::new());
        let coordinator = coordinator(config, notifier.clone(), Arc::new(MockRefresher::new()));

        let report = coordinator.run().await.unwrap();

        assert!(matches!(report, RunReport::Completed(ref s) if s.total == 0));
    }

    #[tokio::test]
    async fn test_lock_released_after_run() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let lock_file = config.lock_file.clone();
        let coordinator = coordinator(
            config,
            Arc::new(MockNotifier::new()),
            Arc::new(MockRefresher::new()),
        );

        coordinator.run().await.unwrap();
        assert!(!lock_file.exists());
        assert!(matches!(
            coordinator.run().await.unwrap(),
            RunReport::Completed(_)
        ));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_abort_run() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        fs::write(config.downloads_dir.join("Film.mkv"), vec![0u8; 100]).unwrap();
        fs::create_dir_all(config.movies_dir.join("Film")).unwrap();
        fs::write(config.movies_dir.join("Film").join("Film.mkv"), vec![1u8; 100]).unwrap();

        let notifier = Arc::new(MockNotifier::new());
        notifier.set_fail(true).await;
        let refresher = Arc::new(MockRefresher::new());
        refresher.set_fail(true).await;
        let coordinator = coordinator(config, notifier.clone(), refresher.clone());

        let RunReport::Completed(summary) = coordinator.run().await.unwrap() else {
            panic!("expected completed run");
        };
        assert_eq!(summary.succeeded, 1);
        assert_eq!(notifier.attempts().await, 2);
        assert_eq!(refresher.refresh_count().await, 1);
    }
}
