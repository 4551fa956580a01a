//! Parsing of ffmpeg `-progress` output.
//!
//! ffmpeg writes blocks of `key=value` lines. Only the keys needed for
//! milestone reporting are recognised; everything else is ignored.

use regex_lite::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use super::types::TranscodeProgress;

static SPEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^speed=\s*(\d+(?:\.\d+)?)x$").expect("valid speed regex"));

/// A recognised line of progress output.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressSignal {
    /// Seconds of output written so far.
    OutTime(f64),
    /// Encoding speed, e.g. "1.5x".
    Speed(String),
    /// ffmpeg finished writing progress.
    End,
}

/// Parses a single progress line.
///
/// `out_time_ms` is in microseconds despite its name, same as `out_time_us`.
pub fn parse_progress_line(line: &str) -> Option<ProgressSignal> {
    let line = line.trim();
    let (key, value) = line.split_once('=')?;

    match key {
        "out_time_us" | "out_time_ms" => {
            let micros = value.trim().parse::<i64>().ok()?;
            if micros < 0 {
                return None;
            }
            Some(ProgressSignal::OutTime(micros as f64 / 1_000_000.0))
        }
        "speed" => SPEED_RE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| ProgressSignal::Speed(format!("{}x", m.as_str()))),
        "progress" if value.trim() == "end" => Some(ProgressSignal::End),
        _ => None,
    }
}

/// Turns a stream of progress signals into 10% milestone updates.
#[derive(Debug)]
pub struct ProgressTracker {
    total_secs: Option<f64>,
    next_threshold: f64,
    speed: Option<String>,
}

impl ProgressTracker {
    /// Percentage step between reported milestones.
    pub const STEP: f64 = 10.0;

    pub fn new(total_secs: Option<f64>) -> Self {
        Self {
            total_secs,
            next_threshold: Self::STEP,
            speed: None,
        }
    }

    /// Feeds one signal. Returns one update per milestone crossed.
    ///
    /// Each update's `percent` is the milestone itself; `processed_secs` and
    /// `eta_secs` describe the position just observed. Nothing is reported
    /// when the total duration is unknown or not positive.
    pub fn observe(&mut self, signal: ProgressSignal, elapsed: Duration) -> Vec<TranscodeProgress> {
        let processed = match signal {
            ProgressSignal::OutTime(secs) => secs,
            ProgressSignal::Speed(speed) => {
                self.speed = Some(speed);
                return Vec::new();
            }
            ProgressSignal::End => return Vec::new(),
        };

        let Some(total) = self.total_secs.filter(|t| t.is_finite() && *t > 0.0) else {
            return Vec::new();
        };
        let percent = (processed / total * 100.0).min(100.0);
        let eta = eta_secs(elapsed, percent);

        let mut updates = Vec::new();
        while self.next_threshold <= percent {
            updates.push(TranscodeProgress {
                percent: self.next_threshold,
                processed_secs: processed,
                total_secs: total,
                eta_secs: eta,
                speed: self.speed.clone(),
            });
            self.next_threshold += Self::STEP;
        }
        updates
    }
}

/// Remaining time assuming a constant rate: `elapsed * (100 - pct) / pct`.
fn eta_secs(elapsed: Duration, percent: f64) -> f64 {
    if percent <= 0.0 {
        return 0.0;
    }
    elapsed.as_secs_f64() * (100.0 - percent) / percent
}
