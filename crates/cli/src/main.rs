mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use squeeze_core::{
    load_config, validate_config, Config, DiscordNotifier, FfmpegEngine, FsPlacer,
    LibraryRefresher, NotificationLevel, Notifier, PlexRefresher, RunCoordinator,
    RunReport, SanitizedConfig,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit code for a completed run or one skipped because another holds the lock.
const EXIT_OK: i32 = 0;
/// Exit code for an interrupted run or a fatal error.
const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let config_path = std::env::var_os("SQUEEZE_CONFIG").map(PathBuf::from);
    let loaded = load_config(config_path.as_deref());

    // Logging needs the log file path, so it starts even if loading failed.
    logging::init(loaded.as_ref().ok().and_then(|c| c.log_file.as_deref()));
    info!(version = VERSION, "Starting squeeze");

    let config = loaded.with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load config".to_string(),
    })?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    info!(config = %sanitized, "Configuration loaded");

    let config = Arc::new(config);
    let notifier = build_notifier(&config);

    // The coordinator checks for ffmpeg/ffprobe once it holds the run lock.
    let engine = Arc::new(FfmpegEngine::new(config.engine.clone()));
    let mut coordinator = RunCoordinator::new(Arc::clone(&config), engine, Arc::new(FsPlacer::new()));
    if let Some(notifier) = notifier.clone() {
        coordinator = coordinator.with_notifier(notifier);
    }
    if let Some(refresher) = build_refresher(&config) {
        coordinator = coordinator.with_refresher(refresher);
    }

    // Dropping the run future on interrupt kills any ffmpeg child and
    // releases the run lock.
    let run = Box::pin(coordinator.run());
    tokio::select! {
        result = run => match result {
            Ok(RunReport::Completed(summary)) => {
                info!(
                    run_id = %summary.run_id,
                    succeeded = summary.succeeded,
                    total = summary.total,
                    "Run complete"
                );
                Ok(EXIT_OK)
            }
            Ok(RunReport::Skipped) => Ok(EXIT_OK),
            Err(e) => {
                notify_fatal(notifier.as_ref(), &e.to_string()).await;
                Err(e).context("Run aborted")
            }
        },
        _ = shutdown_signal() => {
            warn!("Interrupted, run abandoned");
            Ok(EXIT_FAILURE)
        }
    }
}

fn build_notifier(config: &Config) -> Option<Arc<dyn Notifier>> {
    let Some(url) = &config.discord_webhook_url else {
        info!("Discord webhook not configured, notifications disabled");
        return None;
    };
    match DiscordNotifier::new(url.as_str()) {
        Ok(notifier) => Some(Arc::new(notifier)),
        Err(e) => {
            warn!(error = %e, "Failed to create Discord notifier, notifications disabled");
            None
        }
    }
}

fn build_refresher(config: &Config) -> Option<Arc<dyn LibraryRefresher>> {
    let Some(token) = &config.plex_token else {
        info!("Plex token not configured, library refresh disabled");
        return None;
    };
    match PlexRefresher::new(config.plex_url.as_str(), token.as_str()) {
        Ok(refresher) => Some(Arc::new(refresher)),
        Err(e) => {
            warn!(error = %e, "Failed to create Plex client, library refresh disabled");
            None
        }
    }
}

async fn notify_fatal(notifier: Option<&Arc<dyn Notifier>>, message: &str) {
    let Some(notifier) = notifier else {
        return;
    };
    if let Err(e) = notifier
        .notify(NotificationLevel::Error, &format!("Fatal error: {}", message))
        .await
    {
        warn!(error = %e, "Failed to send fatal error notification");
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
