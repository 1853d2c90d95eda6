//! REST API server for the deposit-insurance assistant
//!
//! Exposes the pipeline via HTTP. Internal failures never surface as raw
//! errors: every processed question comes back HTTP 200 with the filtered
//! response and the action taken, for observability.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::models::{Action, Intent};
use crate::pipeline::Assistant;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub intent: Intent,
    pub action: Action,
    pub confidence: f32,
    pub llm_used: bool,
    pub request_id: Uuid,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub assistant: Arc<Assistant>,
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/ask", post(ask_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ask_handler(
    State(state): State<ApiState>,
    Json(request): Json<AskRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let question = request.question.trim();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("question is required".to_string())),
        );
    }

    info!(len = question.len(), "Incoming question");

    let result = state.assistant.process(question).await;

    let body = AskResponse {
        answer: result.response,
        intent: result.intent,
        action: result.action,
        confidence: result.confidence,
        llm_used: result.llm_used,
        request_id: result.request_id,
    };

    (StatusCode::OK, Json(ApiResponse::success(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_envelope() {
        let ok = ApiResponse::success(serde_json::json!({"answer": "tekst"}));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let err = ApiResponse::error("question is required".to_string());
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("question is required"));
    }
}
