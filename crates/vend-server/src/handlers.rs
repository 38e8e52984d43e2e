use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use vend_core::ids::SessionId;
use vend_payments::webhook::{self, DEFAULT_TOLERANCE};

use crate::server::AppState;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// `POST /chat` — run one orchestrated chat turn.
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let session_id = request
        .session_id
        .map(SessionId::from_raw)
        .unwrap_or_else(SessionId::fallback);

    match state.orchestrator.run_turn(&session_id, &request.message).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(ChatResponse {
                response: reply,
                session_id: session_id.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, kind = e.error_kind(), session_id = %session_id, "chat turn failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

/// `POST /webhook` — verified payment-provider event delivery.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return error_response(StatusCode::BAD_REQUEST, "missing signature header");
    };

    if let Err(e) = webhook::verify_signature(
        &body,
        signature,
        state.webhook_secret.expose_secret(),
        DEFAULT_TOLERANCE,
        chrono::Utc::now().timestamp(),
    ) {
        warn!(error = %e, "webhook signature rejected");
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let event = match webhook::parse_event(&body) {
        Ok(event) => event,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    if event.event_type == "checkout.session.completed" {
        // Order persistence and customer notification are not implemented;
        // the fulfillment intent is recorded in the log.
        info!(
            checkout_session = event.object_id().unwrap_or("unknown"),
            product_id = event.metadata("product_id").unwrap_or("unknown"),
            "checkout completed, fulfillment pending"
        );
    }

    (StatusCode::OK, Json(serde_json::json!({ "status": "success" }))).into_response()
}

/// `GET /health`.
pub async fn health() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "healthy" }))).into_response()
}
