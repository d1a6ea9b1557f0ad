//! HTTP client for the form relay

use super::{FeedbackError, FeedbackForm};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://formspree.io/f/mvgebapo";

/// Relay endpoint settings
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    pub endpoint: String,
    /// Extra recipient copied on every submission
    pub recipient: Option<String>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            recipient: None,
        }
    }
}

impl FeedbackConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            endpoint: lookup("FEEDBACK_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            recipient: lookup("FEEDBACK_RECIPIENT").filter(|r| !r.trim().is_empty()),
        }
    }
}

pub struct FeedbackRelay {
    client: Client,
    config: FeedbackConfig,
}

impl FeedbackRelay {
    pub fn new(config: FeedbackConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    /// Validate and forward `form`
    pub async fn submit(&self, form: &FeedbackForm) -> Result<(), FeedbackError> {
        form.validate()?;

        let fields = form.relay_fields(self.config.recipient.as_deref());
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Accept", "application/json")
            .form(&fields)
            .send()
            .await
            .map_err(|e| FeedbackError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Feedback relay rejected submission");
            return Err(FeedbackError::Rejected(status.as_u16()));
        }

        tracing::info!(category = form.category.as_str(), "Feedback forwarded");
        Ok(())
    }
}
