//! FFmpeg-based engine implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::error::EngineError;
use super::progress::{parse_progress_line, ProgressTracker};
use super::traits::MediaEngine;
use super::types::{TranscodeJob, TranscodeProgress, TranscodeResult, HEVC};

/// Lines of ffmpeg stderr kept for failure diagnostics.
const STDERR_TAIL_LINES: usize = 40;

/// FFmpeg-based engine implementation.
pub struct FfmpegEngine {
    config: EngineConfig,
}

impl FfmpegEngine {
    /// Creates a new FFmpeg engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Builds ffmpeg arguments for an HEVC re-encode.
    ///
    /// Video is re-encoded, every audio and subtitle stream is copied, and
    /// ffmpeg aborts on the first decode error. Paths are passed through as
    /// raw OS strings so non-UTF-8 file names survive.
    fn build_transcode_args(job: &TranscodeJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-hide_banner",
            "-nostdin",
            "-y",
            "-err_detect",
            "aggressive",
            "-i",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(job.source.as_os_str().to_owned());

        args.extend(
            [
                "-map", "0:v:0", "-map", "0:a?", "-map", "0:s?", "-c:v", HEVC.encoder, "-preset",
            ]
            .iter()
            .map(OsString::from),
        );
        args.push(OsString::from(&job.preset));
        args.extend([OsString::from("-crf"), OsString::from(job.crf.to_string())]);

        args.extend(
            [
                "-c:a",
                "copy",
                "-c:s",
                "copy",
                "-xerror",
                "-loglevel",
                "error",
                "-nostats",
                "-progress",
                "pipe:1",
            ]
            .iter()
            .map(OsString::from),
        );

        args.push(job.destination.as_os_str().to_owned());
        args
    }

    /// Builds ffmpeg arguments that decode the head of a file to nowhere.
    fn build_decode_sample_args(path: &Path, secs: u32) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-v", "error", "-xerror", "-t"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(OsString::from(secs.to_string()));
        args.push(OsString::from("-i"));
        args.push(path.as_os_str().to_owned());
        args.extend(["-f", "null", "-"].iter().map(OsString::from));
        args
    }

    /// Parses `stream=codec_name` output. `N/A` and blanks are absent.
    fn parse_codec_output(output: &str) -> Option<String> {
        let codec = output.lines().map(str::trim).find(|l| !l.is_empty())?;
        if codec.eq_ignore_ascii_case("n/a") {
            return None;
        }
        Some(codec.to_ascii_lowercase())
    }

    /// Parses `format=duration` output. Only finite numbers count.
    fn parse_duration_output(output: &str) -> Option<f64> {
        output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())?
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
    }

    fn ffmpeg_spawn_error(&self, e: std::io::Error) -> EngineError {
        if e.kind() == std::io::ErrorKind::NotFound {
            EngineError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            EngineError::Io(e)
        }
    }

    /// Runs ffprobe and returns stdout, or `None` on any failure.
    async fn run_ffprobe(&self, args: &[&str], path: &Path) -> Option<String> {
        let output = Command::new(&self.config.ffprobe_path)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match timeout(Duration::from_secs(self.config.probe_timeout_secs), output).await {
            Ok(Ok(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => {
                debug!(
                    path = %path.display(),
                    code = ?output.status.code(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "ffprobe exited with failure"
                );
                None
            }
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "Failed to run ffprobe");
                None
            }
            Err(_) => {
                warn!(
                    path = %path.display(),
                    timeout_secs = self.config.probe_timeout_secs,
                    "ffprobe timed out"
                );
                None
            }
        }
    }
}

/// Drains a pipe to EOF, keeping only the last lines.
///
/// Lines are decoded lossily so a non-UTF-8 line never stops the drain.
async fn collect_tail<R>(pipe: R) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        let line = String::from_utf8_lossy(&buf);
        tail.push_back(line.trim_end_matches(['\n', '\r']).to_string());
    }
    Vec::from(tail).join("\n")
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe_codec(&self, path: &Path) -> Option<String> {
        let output = self
            .run_ffprobe(
                &[
                    "-v",
                    "error",
                    "-select_streams",
                    "v:0",
                    "-show_entries",
                    "stream=codec_name",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                ],
                path,
            )
            .await?;
        Self::parse_codec_output(&output)
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let output = self
            .run_ffprobe(
                &[
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                ],
                path,
            )
            .await?;
        Self::parse_duration_output(&output)
    }

    async fn transcode(
        &self,
        job: &TranscodeJob,
        progress_tx: Option<mpsc::Sender<TranscodeProgress>>,
    ) -> Result<TranscodeResult, EngineError> {
        if !job.source.exists() {
            return Err(EngineError::InputNotFound {
                path: job.source.clone(),
            });
        }

        let start = Instant::now();
        let args = Self::build_transcode_args(job);
        debug!(ffmpeg = %self.config.ffmpeg_path.display(), ?args, "Starting ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.ffmpeg_spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::transcode_failed("ffmpeg stdout not captured", None))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::transcode_failed("ffmpeg stderr not captured", None))?;

        // Drained concurrently so a chatty stderr can never block the encoder.
        let stderr_task = tokio::spawn(collect_tail(stderr));

        let mut lines = BufReader::new(stdout).lines();
        let mut tracker = ProgressTracker::new(job.total_duration);
        let timeout_secs = self.config.transcode_timeout_secs;

        let result = timeout(Duration::from_secs(timeout_secs), async {
            while let Some(line) = lines.next_line().await? {
                let Some(signal) = parse_progress_line(&line) else {
                    continue;
                };
                for update in tracker.observe(signal, start.elapsed()) {
                    info!(
                        file = %job.source.display(),
                        percent = update.percent.round() as u32,
                        eta_secs = update.eta_secs.round() as u64,
                        speed = update.speed.as_deref().unwrap_or("?"),
                        "Transcode progress"
                    );
                    if let Some(ref tx) = progress_tx {
                        // Non-blocking send
                        let _ = tx.try_send(update);
                    }
                }
            }
            child.wait().await
        })
        .await;

        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                stderr_task.abort();
                return Err(EngineError::Io(e));
            }
            Err(_) => {
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(EngineError::Timeout { timeout_secs });
            }
        };

        let stderr_tail = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(EngineError::transcode_failed(
                format!("ffmpeg exited with code: {:?}", status.code()),
                non_empty(stderr_tail),
            ));
        }

        let output_meta = tokio::fs::metadata(&job.destination)
            .await
            .map_err(|_| EngineError::transcode_failed("Output file not created", None))?;

        Ok(TranscodeResult {
            output_path: job.destination.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn decode_sample(&self, path: &Path, secs: u32) -> Result<(), EngineError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .args(Self::build_decode_sample_args(path, secs))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let timeout_secs = self.config.probe_timeout_secs;
        let output = timeout(Duration::from_secs(timeout_secs), output)
            .await
            .map_err(|_| EngineError::Timeout { timeout_secs })?
            .map_err(|e| self.ffmpeg_spawn_error(e))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(EngineError::decode_failed(if stderr.is_empty() {
                format!("ffmpeg exited with code: {:?}", output.status.code())
            } else {
                stderr
            }));
        }
        // `-v error` keeps stderr silent unless something is wrong.
        if !stderr.is_empty() {
            return Err(EngineError::decode_failed(stderr));
        }

        Ok(())
    }

    async fn validate(&self) -> Result<(), EngineError> {
        // Check ffmpeg exists
        Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.ffmpeg_spawn_error(e))?;

        // Check ffprobe exists
        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EngineError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(EngineError::Io(e));
        }

        Ok(())
    }
}
