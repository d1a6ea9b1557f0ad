//! Sends user messages to the completion backend, falling back to canned lines

use super::context::ChatContext;
use super::fallback;
use super::session::{Clock, HistoryEntry, SessionStore, SystemClock, DEFAULT_IDLE_SECS};
use crate::llm::{LlmError, LlmErrorKind, LlmRequest, LlmService, SamplingParams};
use chrono::Duration;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default number of trailing transcript messages sent upstream
pub const DEFAULT_HISTORY_WINDOW: usize = 8;

/// Dispatcher tuning
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub history_window: usize,
    pub idle_threshold: Duration,
    pub sampling: SamplingParams,
    /// Seed for the no-keyword fallback pick; entropy when `None`
    pub fallback_seed: Option<u64>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            idle_threshold: Duration::seconds(DEFAULT_IDLE_SECS),
            sampling: SamplingParams::default(),
            fallback_seed: None,
        }
    }
}

/// Why a reply came from the fallback table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "status", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No API key configured; no request was made
    MissingCredential,
    /// Connection, timeout or body read failure
    Transport,
    /// The backend answered with a non-success status
    HttpStatus(u16),
    /// 2xx with no usable text
    EmptyResponse,
    /// 2xx that could not be parsed
    MalformedResponse,
}

impl From<&LlmError> for FallbackReason {
    fn from(e: &LlmError) -> Self {
        if let Some(status) = e.status {
            return FallbackReason::HttpStatus(status);
        }
        match e.kind {
            LlmErrorKind::EmptyResponse => FallbackReason::EmptyResponse,
            LlmErrorKind::Unknown => FallbackReason::MalformedResponse,
            _ => FallbackReason::Transport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Remote,
    Fallback(FallbackReason),
}

/// Reply text tagged with the path that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub text: String,
    pub source: ReplySource,
}

impl DispatchOutcome {
    fn remote(text: String) -> Self {
        Self {
            text,
            source: ReplySource::Remote,
        }
    }

    fn fallback(text: String, reason: FallbackReason) -> Self {
        Self {
            text,
            source: ReplySource::Fallback(reason),
        }
    }
}

struct Inner {
    store: SessionStore,
    rng: StdRng,
}

/// Owns the session store and talks to the configured backend
pub struct ChatDispatcher {
    inner: Mutex<Inner>,
    backend: Option<Arc<dyn LlmService>>,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
}

impl ChatDispatcher {
    pub fn new(backend: Option<Arc<dyn LlmService>>, config: DispatcherConfig) -> Self {
        Self::with_clock(backend, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        backend: Option<Arc<dyn LlmService>>,
        config: DispatcherConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rng = match config.fallback_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            inner: Mutex::new(Inner {
                store: SessionStore::new(config.idle_threshold),
                rng,
            }),
            backend,
            clock,
            config,
        }
    }

    pub fn backend(&self) -> Option<&Arc<dyn LlmService>> {
        self.backend.as_ref()
    }

    /// Send `user_message` and return the reply text.
    ///
    /// Never fails: every error path yields a fallback line.
    pub async fn send_text(
        &self,
        conversation_id: &str,
        user_message: &str,
        context: &ChatContext,
    ) -> String {
        self.send(conversation_id, user_message, context).await.text
    }

    /// Send `user_message` and report which path produced the reply.
    ///
    /// On success the transcript grows by the user message and the reply.
    /// On failure the user message is rolled back, so the stored transcript
    /// is unchanged; fallback lines are never stored.
    pub async fn send(
        &self,
        conversation_id: &str,
        user_message: &str,
        context: &ChatContext,
    ) -> DispatchOutcome {
        let Some(backend) = self.backend.clone() else {
            let mut inner = self.inner.lock().await;
            let now = self.clock.now();
            inner.store.evict_idle(now);
            // Keep the opening line available to history even offline
            inner.store.get_or_create(conversation_id, context, now);

            tracing::warn!(
                conversation_id,
                context = context.kind().as_str(),
                "No chat API key configured, answering from fallback table"
            );
            let text = fallback::respond(
                user_message,
                context.kind(),
                context.creature_name(),
                &mut inner.rng,
            );
            return DispatchOutcome::fallback(text, FallbackReason::MissingCredential);
        };

        let (request, user_index) = {
            let mut inner = self.inner.lock().await;
            let now = self.clock.now();
            inner.store.evict_idle(now);
            let session = inner.store.get_or_create(conversation_id, context, now);
            let user_index = session.push_user(user_message);
            let request = LlmRequest {
                messages: session.recent(self.config.history_window).to_vec(),
                sampling: self.config.sampling,
            };
            (request, user_index)
        };

        tracing::debug!(
            conversation_id,
            context = context.kind().as_str(),
            messages = request.messages.len(),
            model = backend.model_id(),
            "Sending chat message"
        );

        let result = backend.complete(&request).await;
        let mut inner = self.inner.lock().await;

        match result {
            Ok(response) => {
                match inner.store.get_mut(conversation_id) {
                    Some(session) => {
                        session.push_assistant(response.text.clone());
                        session.touch(self.clock.now());
                    }
                    None => {
                        tracing::warn!(conversation_id, "Session dropped while awaiting reply");
                    }
                }
                DispatchOutcome::remote(response.text)
            }
            Err(e) => {
                if let Some(session) = inner.store.get_mut(conversation_id) {
                    session.rollback_user(user_index, user_message);
                }
                let reason = FallbackReason::from(&e);
                tracing::warn!(
                    conversation_id,
                    reason = ?reason,
                    error = %e,
                    "Chat backend failed, answering from fallback table"
                );
                let text = fallback::respond(
                    user_message,
                    context.kind(),
                    context.creature_name(),
                    &mut inner.rng,
                );
                DispatchOutcome::fallback(text, reason)
            }
        }
    }

    /// Run the idle sweep now
    pub async fn evict_idle(&self) -> usize {
        let now = self.clock.now();
        self.inner.lock().await.store.evict_idle(now)
    }

    /// UI history for a conversation, empty if unknown or idle
    pub async fn history(&self, conversation_id: &str) -> Vec<HistoryEntry> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;
        inner.store.evict_idle(now);
        inner.store.history(conversation_id)
    }

    pub async fn clear(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;
        inner.store.evict_idle(now);
        inner.store.clear();
    }

    /// Read-only access to the store
    #[cfg(test)]
    pub async fn with_store<R>(&self, f: impl FnOnce(&SessionStore) -> R) -> R {
        f(&self.inner.lock().await.store)
    }
}
