//! Bestiary chat backend
//!
//! Serves the bestiary's narrator chat, proxying to a hosted completion
//! backend with canned fallback replies, and relays reader feedback.

mod api;
mod chat;
mod config;
mod feedback;
mod llm;
#[cfg(test)]
mod testing;

use api::{create_router, AppState};
use chat::ChatDispatcher;
use config::AppConfig;
use feedback::FeedbackRelay;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bestiary_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;
    let backend = config.llm.backend;

    let service = config.llm.build_service();
    match &service {
        Some(service) => tracing::info!(
            backend = %backend,
            model = service.model_id(),
            "Chat backend configured"
        ),
        None => tracing::warn!(
            backend = %backend,
            "No chat API key configured. Set {} to enable the narrator; replies will come from the fallback table.",
            backend.api_key_env_var()
        ),
    }

    let chat = ChatDispatcher::new(service, config.chat);
    let feedback = FeedbackRelay::new(config.feedback);
    let state = AppState::new(chat, feedback, backend);

    // Sessions nobody touches again are only dropped by this sweep
    let sweeper = state.chat.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let evicted = sweeper.evict_idle().await;
            if evicted > 0 {
                tracing::info!(evicted, "Swept idle chat sessions");
            }
        }
    });

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Bestiary chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
