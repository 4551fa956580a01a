//! Plex library refresh.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::error::NotifyError;
use super::traits::LibraryRefresher;
use super::NOTIFY_TIMEOUT;

/// Triggers a rescan of every Plex library section.
pub struct PlexRefresher {
    client: Client,
    base_url: String,
    token: String,
}

impl PlexRefresher {
    /// Create a refresher for the server at `base_url`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        Self::with_client(client, base_url, token)
    }

    /// Create a refresher using an existing HTTP client.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(NotifyError::NotConfigured("Plex token is required".to_string()));
        }
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn refresh_url(&self) -> String {
        format!("{}/library/sections/all/refresh", self.base_url)
    }
}

#[async_trait]
impl LibraryRefresher for PlexRefresher {
    fn name(&self) -> &str {
        "plex"
    }

    async fn refresh(&self) -> Result<(), NotifyError> {
        let url = self.refresh_url();
        debug!(url = %url, "Requesting Plex library refresh");

        let response = self
            .client
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }
}
