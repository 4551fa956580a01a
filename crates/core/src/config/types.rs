use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::engine::EngineConfig;
use crate::verifier::VerifyConfig;

/// Root configuration.
///
/// Field names double as the environment variable names the service has
/// always been configured with (`DOWNLOADS_DIR`, `COMPRESSION_CRF`, ...).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Intake tree scanned for freshly downloaded videos.
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
    /// First library root searched for a matching file.
    #[serde(default = "default_movies_dir")]
    pub movies_dir: PathBuf,
    /// Second library root searched for a matching file.
    #[serde(default = "default_shows_dir")]
    pub shows_dir: PathBuf,
    /// x265 constant rate factor.
    #[serde(default = "default_crf")]
    pub compression_crf: u8,
    /// x265 speed preset.
    #[serde(default = "default_preset")]
    pub compression_preset: String,
    /// Preview mode: estimate savings, never touch files or run the encoder.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_webhook_url: Option<String>,
    #[serde(default = "default_plex_url")]
    pub plex_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plex_token: Option<String>,
    /// Replacement only happens when compressed/original is at or below this.
    #[serde(default = "default_min_compression_ratio")]
    pub min_compression_ratio: f64,
    /// Backing file of the single-instance run lock.
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,
    /// Persistent JSON log, appended to on every run.
    #[serde(default = "default_log_file", skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
            movies_dir: default_movies_dir(),
            shows_dir: default_shows_dir(),
            compression_crf: default_crf(),
            compression_preset: default_preset(),
            dry_run: false,
            discord_webhook_url: None,
            plex_url: default_plex_url(),
            plex_token: None,
            min_compression_ratio: default_min_compression_ratio(),
            lock_file: default_lock_file(),
            log_file: default_log_file(),
            engine: EngineConfig::default(),
            verify: VerifyConfig::default(),
        }
    }
}

impl Config {
    /// Library roots in search order.
    pub fn library_roots(&self) -> [PathBuf; 2] {
        [self.movies_dir.clone(), self.shows_dir.clone()]
    }

    /// Blank optional strings mean "not configured".
    pub(crate) fn normalize(mut self) -> Self {
        self.discord_webhook_url = non_empty(self.discord_webhook_url);
        self.plex_token = non_empty(self.plex_token);
        self.log_file = self
            .log_file
            .filter(|p| !p.as_os_str().is_empty());
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("/data/Downloads")
}

fn default_movies_dir() -> PathBuf {
    PathBuf::from("/data/Movies")
}

fn default_shows_dir() -> PathBuf {
    PathBuf::from("/data/Shows")
}

fn default_crf() -> u8 {
    23
}

fn default_preset() -> String {
    "slow".to_string()
}

fn default_plex_url() -> String {
    "http://plex:32400".to_string()
}

fn default_min_compression_ratio() -> f64 {
    0.8
}

fn default_lock_file() -> PathBuf {
    std::env::temp_dir().join("squeeze.lock")
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("/logs/compressor.log"))
}

/// Accepts a real boolean or any casing of "true"/"false" (plus 1/0, yes/no).
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i != 0),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean flag: {}",
                other
            ))),
        },
    }
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub downloads_dir: PathBuf,
    pub movies_dir: PathBuf,
    pub shows_dir: PathBuf,
    pub compression_crf: u8,
    pub compression_preset: String,
    pub dry_run: bool,
    pub min_compression_ratio: f64,
    pub discord_webhook_configured: bool,
    pub plex_url: String,
    pub plex_token_configured: bool,
    pub lock_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub engine: EngineConfig,
    pub verify: VerifyConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            downloads_dir: config.downloads_dir.clone(),
            movies_dir: config.movies_dir.clone(),
            shows_dir: config.shows_dir.clone(),
            compression_crf: config.compression_crf,
            compression_preset: config.compression_preset.clone(),
            dry_run: config.dry_run,
            min_compression_ratio: config.min_compression_ratio,
            discord_webhook_configured: config.discord_webhook_url.is_some(),
            plex_url: config.plex_url.clone(),
            plex_token_configured: config.plex_token.is_some(),
            lock_file: config.lock_file.clone(),
            log_file: config.log_file.clone(),
            engine: config.engine.clone(),
            verify: config.verify.clone(),
        }
    }
}
