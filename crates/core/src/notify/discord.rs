//! Discord-compatible webhook notifier.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::error::NotifyError;
use super::traits::{NotificationLevel, Notifier};
use super::NOTIFY_TIMEOUT;

/// Title line shown above every message.
const TITLE: &str = "**Media Compressor**";

#[derive(Debug, Serialize)]
struct WebhookPayload {
    content: String,
}

/// Posts messages to a Discord webhook URL.
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    /// Create a notifier for the given webhook URL.
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        Self::with_client(client, webhook_url)
    }

    /// Create a notifier using an existing HTTP client.
    pub fn with_client(client: Client, webhook_url: impl Into<String>) -> Result<Self, NotifyError> {
        let webhook_url = webhook_url.into();
        if webhook_url.trim().is_empty() {
            return Err(NotifyError::NotConfigured(
                "webhook URL is required".to_string(),
            ));
        }
        Ok(Self {
            client,
            webhook_url,
        })
    }

    fn payload(level: NotificationLevel, message: &str) -> WebhookPayload {
        WebhookPayload {
            content: format!("{} {}\n{}", level.icon(), TITLE, message),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn notify(&self, level: NotificationLevel, message: &str) -> Result<(), NotifyError> {
        debug!(?level, "Sending webhook notification");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::payload(level, message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }
}
