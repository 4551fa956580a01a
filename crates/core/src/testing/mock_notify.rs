//! Mock notifier and library refresher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notify::{LibraryRefresher, NotificationLevel, NotifyError, Notifier};

/// Notifier that records every message it is asked to send.
#[derive(Debug)]
pub struct MockNotifier {
    messages: Arc<RwLock<Vec<(NotificationLevel, String)>>>,
    attempts: Arc<RwLock<usize>>,
    fail: Arc<RwLock<bool>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            attempts: Arc::new(RwLock::new(0)),
            fail: Arc::new(RwLock::new(false)),
        }
    }

    /// Make every send fail. Failed sends are counted but not recorded.
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Messages delivered so far.
    pub async fn messages(&self) -> Vec<(NotificationLevel, String)> {
        self.messages.read().await.clone()
    }

    /// Sends attempted, including failed ones.
    pub async fn attempts(&self) -> usize {
        *self.attempts.read().await
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn notify(&self, level: NotificationLevel, message: &str) -> Result<(), NotifyError> {
        *self.attempts.write().await += 1;
        if *self.fail.read().await {
            return Err(NotifyError::Status {
                status: 500,
                message: "mock failure".to_string(),
            });
        }
        self.messages
            .write()
            .await
            .push((level, message.to_string()));
        Ok(())
    }
}

/// Refresher that counts rescan requests.
#[derive(Debug)]
pub struct MockRefresher {
    refreshes: Arc<RwLock<usize>>,
    fail: Arc<RwLock<bool>>,
}

impl Default for MockRefresher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRefresher {
    pub fn new() -> Self {
        Self {
            refreshes: Arc::new(RwLock::new(0)),
            fail: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Refreshes requested, including failed ones.
    pub async fn refresh_count(&self) -> usize {
        *self.refreshes.read().await
    }
}

#[async_trait]
impl LibraryRefresher for MockRefresher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn refresh(&self) -> Result<(), NotifyError> {
        *self.refreshes.write().await += 1;
        if *self.fail.read().await {
            return Err(NotifyError::Status {
                status: 401,
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}
