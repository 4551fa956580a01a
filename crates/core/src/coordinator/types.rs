//! Types for the coordinator module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::engine::EngineError;
use crate::library::LibraryError;
use crate::lock::LockError;
use crate::processor::{OutcomeRecord, ProtocolState};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Run lock error: {0}")]
    Lock(#[from] LockError),

    #[error("Media engine unavailable: {0}")]
    Engine(#[from] EngineError),

    #[error("Intake scan failed: {0}")]
    Library(#[from] LibraryError),

    #[error("Intake scan task failed: {0}")]
    Scan(String),
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum RunReport {
    /// The run went through every candidate.
    Completed(RunSummary),
    /// Another run holds the lock; nothing was touched.
    Skipped,
}

/// Aggregate of every outcome in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub total: usize,
    pub succeeded: usize,
    /// Expected no-ops: no match, already target codec, insufficient gain.
    pub skipped: usize,
    /// Per-file failures, excluding data-loss risks.
    pub failed: usize,
    pub data_loss_risk: usize,
    /// Outcome counts keyed by terminal state.
    pub by_state: BTreeMap<String, usize>,
    /// Bytes saved by successful outcomes (estimated in dry runs).
    pub bytes_saved: u64,
    pub outcomes: Vec<OutcomeRecord>,
}

impl RunSummary {
    pub fn new(run_id: Uuid, dry_run: bool) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            total: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            data_loss_risk: 0,
            by_state: BTreeMap::new(),
            bytes_saved: 0,
            outcomes: Vec::new(),
        }
    }

    /// Adds one outcome to the totals.
    pub fn record(&mut self, outcome: OutcomeRecord) {
        self.total += 1;
        *self
            .by_state
            .entry(outcome.state.as_str().to_string())
            .or_insert(0) += 1;

        if outcome.success {
            self.succeeded += 1;
            self.bytes_saved += outcome.space_saved_bytes;
        } else if outcome.state == ProtocolState::DataLossRisk {
            self.data_loss_risk += 1;
        } else if outcome.state.is_skip() {
            self.skipped += 1;
        } else {
            self.failed += 1;
        }

        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Run duration in seconds; zero until finished.
    pub fn duration_secs(&self) -> f64 {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds().max(0) as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    /// Notification text for the run.
    pub fn message(&self) -> String {
        let verb = if self.dry_run {
            "[DRY RUN] Would compress"
        } else {
            "Compressed"
        };
        let mut message = format!(
            "{} {}/{} video files\nSpace saved: **{} GB**\nDuration: {:.1} min",
            verb,
            self.succeeded,
            self.total,
            format_gb(self.bytes_saved),
            self.duration_secs() / 60.0
        );
        if self.failed > 0 {
            message.push_str(&format!("\nFailed: {}", self.failed));
        }
        if self.data_loss_risk > 0 {
            message.push_str(&format!(
                "\nDATA LOSS RISK: {} file(s) need manual checking, see logs",
                self.data_loss_risk
            ));
        }
        message
    }
}

/// Bytes as gigabytes (GiB) with two decimals.
pub fn format_gb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_GB)
}

/// Notification text for one replaced file.
pub fn success_message(outcome: &OutcomeRecord) -> String {
    let name = outcome
        .matched
        .as_deref()
        .unwrap_or(&outcome.file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "Compressed {}\n{} GB -> {} GB (saved **{} GB**)",
        name,
        format_gb(outcome.original_size_bytes),
        format_gb(outcome.compressed_size_bytes),
        format_gb(outcome.space_saved_bytes)
    )
}
