//! API request and response types

use crate::chat::{
    ChatContext, ContextKind, CreatureInfo, DispatchOutcome, FallbackReason, HistoryEntry,
    ReplySource,
};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub context: ContextKind,
    #[serde(default)]
    pub creature: Option<CreatureInfo>,
}

impl ChatRequest {
    pub fn chat_context(&self) -> ChatContext {
        match self.context {
            ContextKind::Notes => ChatContext::notes(self.creature.clone()),
            ContextKind::Board => ChatContext::Board,
        }
    }
}

/// Response for a chat message
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    /// `remote` or `fallback`
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

impl From<DispatchOutcome> for ChatResponse {
    fn from(outcome: DispatchOutcome) -> Self {
        let (source, fallback) = match outcome.source {
            ReplySource::Remote => ("remote", None),
            ReplySource::Fallback(reason) => ("fallback", Some(reason)),
        };
        Self {
            reply: outcome.text,
            source,
            fallback,
        }
    }
}

/// Response with a conversation's visible history
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<HistoryEntry>,
}

/// Result of probing the configured completion backend
#[derive(Debug, Serialize)]
pub struct BackendStatusResponse {
    pub backend: String,
    pub configured: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub message: String,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
