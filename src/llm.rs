//! LLM provider abstraction
//!
//! Provides a common interface for the completion backends the narrator
//! chat can talk to.

mod config;
mod deepseek;
mod error;
mod gemini;
mod types;

pub use config::{Backend, ConfigError, LlmConfig};
pub use deepseek::DeepSeekService;
pub use error::{LlmError, LlmErrorKind};
pub use gemini::GeminiService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Cheap authenticated call used to report whether the key works
    async fn check_credentials(&self) -> Result<(), LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    status = ?e.status,
                    error = %e.message,
                    "LLM request failed"
                );
            }
        }

        result
    }

    async fn check_credentials(&self) -> Result<(), LlmError> {
        let result = self.inner.check_credentials().await;
        if let Err(e) = &result {
            tracing::warn!(model = %self.model_id, kind = ?e.kind, error = %e.message, "Credential check failed");
        }
        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
