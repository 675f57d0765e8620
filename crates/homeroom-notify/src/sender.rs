//! The "send text to address" primitive.

use async_trait::async_trait;
use tracing::debug;

use homeroom_core::config::GatewayConfig;

use crate::error::{NotifyError, Result};

/// Outbound delivery seam.
///
/// The notifier only ever talks to this trait; the chat transport behind it
/// is someone else's problem. Tests substitute a recording mock.
#[async_trait]
pub trait TextSender: Send + Sync {
    async fn send_text(&self, address: &str, text: &str) -> Result<()>;
}

/// Production sender: POSTs each delivery to the messaging gateway bridge.
///
/// Body shape: `{"address": "...", "text": "..."}` with an optional bearer
/// token. Non-2xx responses count as delivery failures.
pub struct WebhookSender {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl WebhookSender {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl TextSender for WebhookSender {
    async fn send_text(&self, address: &str, text: &str) -> Result<()> {
        let mut request = self.client.post(&self.url).json(&serde_json::json!({
            "address": address,
            "text": text,
        }));
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;
        response
            .error_for_status()
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        debug!(%address, "gateway accepted delivery");
        Ok(())
    }
}
