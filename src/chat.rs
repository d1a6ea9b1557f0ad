//! Narrator chat: sessions, dispatch to the completion backend, fallbacks

mod context;
mod dispatcher;
mod fallback;
mod session;

pub use context::{ChatContext, ContextKind, CreatureInfo};
pub use dispatcher::{ChatDispatcher, DispatchOutcome, DispatcherConfig, FallbackReason, ReplySource};
pub use session::HistoryEntry;
#[cfg(test)]
pub use session::Clock;
