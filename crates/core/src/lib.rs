pub mod config;
pub mod coordinator;
pub mod engine;
pub mod library;
pub mod lock;
pub mod notify;
pub mod placer;
pub mod processor;
pub mod testing;
pub mod verifier;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use coordinator::{CoordinatorError, RunCoordinator, RunReport, RunSummary};
pub use engine::{FfmpegEngine, MediaEngine};
pub use notify::{DiscordNotifier, LibraryRefresher, NotificationLevel, Notifier, PlexRefresher};
pub use placer::{FsPlacer, Placer};
pub use processor::{OutcomeRecord, ProtocolState, ReplacementProcessor};
