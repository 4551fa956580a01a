use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variables read without a prefix, as the service has always
/// been deployed with them.
const LEGACY_ENV_KEYS: &[&str] = &[
    "DOWNLOADS_DIR",
    "MOVIES_DIR",
    "SHOWS_DIR",
    "COMPRESSION_CRF",
    "COMPRESSION_PRESET",
    "DRY_RUN",
    "DISCORD_WEBHOOK_URL",
    "PLEX_URL",
    "PLEX_TOKEN",
    "MIN_COMPRESSION_RATIO",
    "LOCK_FILE",
    "LOG_FILE",
];

/// Load configuration: defaults, then the optional TOML file, then legacy
/// environment variables, then `SQUEEZE_`-prefixed overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        // Older deployments passed the Plex token as PLEX_CLAIM.
        .merge(
            Env::raw()
                .only(&["PLEX_CLAIM"])
                .map(|_| "plex_token".into()),
        )
        .merge(Env::raw().only(LEGACY_ENV_KEYS))
        .merge(Env::prefixed("SQUEEZE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config.normalize())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str::<Config>(toml_str)
        .map(Config::normalize)
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
