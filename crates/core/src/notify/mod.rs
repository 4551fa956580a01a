//! Outbound notifications: chat webhook messages and media-server rescans.
//!
//! Both are best-effort. Implementations return errors so callers can log
//! them, but nothing in the pipeline waits on or fails because of them.

mod discord;
mod error;
mod plex;
mod traits;

#[cfg(test)]
mod test_server;

pub use discord::DiscordNotifier;
pub use error::NotifyError;
pub use plex::PlexRefresher;
pub use traits::{LibraryRefresher, NotificationLevel, Notifier};

use std::time::Duration;

/// Timeout for every outbound notification request.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);
