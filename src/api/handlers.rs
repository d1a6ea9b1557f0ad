//! HTTP request handlers

use super::types::{
    BackendStatusResponse, ChatRequest, ChatResponse, ErrorResponse, HistoryResponse,
    SuccessResponse,
};
use super::AppState;
use crate::feedback::{FeedbackError, FeedbackForm};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Narrator chat
        .route("/api/chat/clear", post(clear_sessions))
        .route("/api/chat/:id", post(send_chat))
        .route("/api/chat/:id/text", post(send_chat_text))
        .route("/api/chat/:id/history", get(get_history))
        // Backend diagnostics
        .route("/api/backend/status", get(backend_status))
        // Feedback relay
        .route("/api/feedback", post(submit_feedback))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }

    let context = req.chat_context();
    let outcome = state.chat.send(&id, &req.message, &context).await;
    Ok(Json(ChatResponse::from(outcome)))
}

/// Same as `send_chat`, answering with the bare reply text
async fn send_chat_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<String, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }

    let context = req.chat_context();
    Ok(state.chat.send_text(&id, &req.message, &context).await)
}

async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        messages: state.chat.history(&id).await,
    })
}

async fn clear_sessions(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.chat.clear().await;
    Json(SuccessResponse { success: true })
}

// ============================================================
// Backend diagnostics
// ============================================================

async fn backend_status(State(state): State<AppState>) -> Json<BackendStatusResponse> {
    let backend = state.backend.to_string();

    let Some(service) = state.chat.backend() else {
        return Json(BackendStatusResponse {
            message: format!("{} is not set", state.backend.api_key_env_var()),
            backend,
            configured: false,
            valid: false,
            model: None,
        });
    };

    let model = Some(service.model_id().to_string());
    match service.check_credentials().await {
        Ok(()) => Json(BackendStatusResponse {
            backend,
            configured: true,
            valid: true,
            model,
            message: "API key is valid".to_string(),
        }),
        Err(e) => Json(BackendStatusResponse {
            backend,
            configured: true,
            valid: false,
            model,
            message: e.message,
        }),
    }
}

// ============================================================
// Feedback
// ============================================================

async fn submit_feedback(
    State(state): State<AppState>,
    Json(form): Json<FeedbackForm>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.feedback.submit(&form).await.map_err(|e| match e {
        FeedbackError::Validation(_) => AppError::BadRequest(e.to_string()),
        FeedbackError::Transport(_) | FeedbackError::Rejected(_) => {
            AppError::BadGateway(e.to_string())
        }
    })?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("bestiary-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
