//! In-process chat sessions keyed by conversation id

use super::context::ChatContext;
use crate::llm::{LlmMessage, MessageRole};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Default idle threshold (3 hours) after which a session is evicted
pub const DEFAULT_IDLE_SECS: i64 = 3 * 60 * 60;

/// Source of "now" for eviction decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One conversation transcript
#[derive(Debug, Clone)]
pub struct Session {
    transcript: Vec<LlmMessage>,
    last_touched: DateTime<Utc>,
}

impl Session {
    fn new(context: &ChatContext, now: DateTime<Utc>) -> Self {
        Self {
            transcript: vec![
                LlmMessage::system(context.system_prompt()),
                LlmMessage::assistant(context.opening_line()),
            ],
            last_touched: now,
        }
    }

    pub fn transcript(&self) -> &[LlmMessage] {
        &self.transcript
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_touched = now;
    }

    /// Append a user message and return its position for a later rollback
    pub fn push_user(&mut self, content: impl Into<String>) -> usize {
        self.transcript.push(LlmMessage::user(content));
        self.len() - 1
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.transcript.push(LlmMessage::assistant(content));
    }

    /// Remove the user message appended at `index`.
    ///
    /// Concurrent rollbacks can shift the message left, so the nearest
    /// matching user message at or before `index` is removed. Returns false
    /// if none is found (the session was cleared and rebuilt meanwhile).
    pub fn rollback_user(&mut self, index: usize, content: &str) -> bool {
        if self.is_empty() {
            return false;
        }
        let upper = index.min(self.transcript.len() - 1);
        let found = self.transcript[..=upper]
            .iter()
            .rposition(|m| m.role == MessageRole::User && m.content == content);
        match found {
            Some(pos) => {
                self.transcript.remove(pos);
                true
            }
            None => false,
        }
    }

    /// The last `window` messages, the slice sent upstream
    pub fn recent(&self, window: usize) -> &[LlmMessage] {
        let start = self.transcript.len().saturating_sub(window);
        &self.transcript[start..]
    }

    fn is_idle(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now - self.last_touched > threshold
    }
}

/// UI-facing view of a transcript message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub role: &'static str,
    pub text: String,
}

/// All live sessions
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
    idle_threshold: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_IDLE_SECS))
    }
}

impl SessionStore {
    pub fn new(idle_threshold: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            idle_threshold,
        }
    }

    /// Drop every session idle for longer than the threshold.
    ///
    /// Returns the number of evicted sessions.
    pub fn evict_idle(&mut self, now: DateTime<Utc>) -> usize {
        if self.is_empty() {
            return 0;
        }
        let threshold = self.idle_threshold;
        let before = self.len();
        self.sessions.retain(|_, s| !s.is_idle(now, threshold));
        let evicted = before - self.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.len(), "Evicted idle chat sessions");
        }
        evicted
    }

    /// Existing session for `conversation_id`, or a fresh one built from `context`.
    ///
    /// The context only matters on creation; an existing session keeps the
    /// prompt it was created with.
    pub fn get_or_create(
        &mut self,
        conversation_id: &str,
        context: &ChatContext,
        now: DateTime<Utc>,
    ) -> &mut Session {
        self.sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(
                    conversation_id,
                    context = context.kind().as_str(),
                    "Created chat session"
                );
                Session::new(context, now)
            })
    }

    pub fn get(&self, conversation_id: &str) -> Option<&Session> {
        self.sessions.get(conversation_id)
    }

    pub fn get_mut(&mut self, conversation_id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(conversation_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&mut self) {
        let dropped = self.len();
        self.sessions.clear();
        tracing::info!(dropped, "Cleared all chat sessions");
    }

    /// Transcript without the system message, roles mapped to `user`/`model`
    pub fn history(&self, conversation_id: &str) -> Vec<HistoryEntry> {
        let Some(session) = self.get(conversation_id) else {
            return Vec::new();
        };

        session
            .transcript()
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .enumerate()
            .map(|(index, m)| HistoryEntry {
                id: format!("hist-{index}"),
                role: if m.role == MessageRole::Assistant {
                    "model"
                } else {
                    "user"
                },
                text: m.content.clone(),
            })
            .collect()
    }
}
