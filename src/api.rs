//! HTTP API for the bestiary UI

mod handlers;
mod types;

pub use handlers::create_router;

use crate::chat::ChatDispatcher;
use crate::feedback::FeedbackRelay;
use crate::llm::Backend;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatDispatcher>,
    pub feedback: Arc<FeedbackRelay>,
    pub backend: Backend,
}

impl AppState {
    pub fn new(chat: ChatDispatcher, feedback: FeedbackRelay, backend: Backend) -> Self {
        Self {
            chat: Arc::new(chat),
            feedback: Arc::new(feedback),
            backend,
        }
    }
}
