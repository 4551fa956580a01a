use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

impl NotificationLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Error => "❌",
        }
    }
}

/// Sends a human-readable message somewhere people will see it.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, level: NotificationLevel, message: &str) -> Result<(), NotifyError>;
}

/// Asks a media server to rescan its libraries.
#[async_trait]
pub trait LibraryRefresher: Send + Sync {
    fn name(&self) -> &str;

    async fn refresh(&self) -> Result<(), NotifyError>;
}
