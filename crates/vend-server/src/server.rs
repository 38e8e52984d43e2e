use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use secrecy::SecretString;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use vend_engine::ChatOrchestrator;

use crate::handlers;

/// Server configuration.
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub webhook_secret: SecretString,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/webhook", post(handlers::webhook))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Permissive cross-origin policy: any origin, content-type header,
/// GET/POST/OPTIONS.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}

/// Bind and serve. Returns a handle that keeps the server task alive.
pub async fn start(config: ServerConfig, state: AppState) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "server started");

    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use vend_core::catalog::ProductCatalog;
    use vend_core::ids::ToolCallId;
    use vend_core::messages::{AssistantMessage, ToolCall};
    use vend_engine::tools::sales_registry;
    use vend_engine::SALES_ASSISTANT_PROMPT;
    use vend_llm::mock::MockProvider;
    use vend_payments::mock::MockGateway;
    use vend_payments::webhook::sign_payload;
    use vend_store::InMemorySessionStore;

    const WEBHOOK_SECRET: &str = "whsec_test_secret";

    fn test_state(provider: MockProvider) -> AppState {
        let store = Arc::new(InMemorySessionStore::new(SALES_ASSISTANT_PROMPT));
        let registry = sales_registry(
            Arc::new(ProductCatalog::gift_cards()),
            Arc::new(MockGateway::new()),
        );
        AppState {
            orchestrator: Arc::new(ChatOrchestrator::new(
                Arc::new(provider),
                store,
                Arc::new(registry),
            )),
            webhook_secret: SecretString::from(WEBHOOK_SECRET),
        }
    }

    async fn serve(provider: MockProvider) -> ServerHandle {
        start(ServerConfig { port: 0 }, test_state(provider))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let handle = serve(MockProvider::replies(&[])).await;
        let url = format!("http://127.0.0.1:{}/health", handle.port);

        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn chat_round_trip_with_default_session() {
        let handle = serve(MockProvider::replies(&["Hello! We sell gift cards."])).await;
        let url = format!("http://127.0.0.1:{}/chat", handle.port);

        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({ "message": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["response"], "Hello! We sell gift cards.");
        assert_eq!(body["session_id"], "default");
    }

    #[tokio::test]
    async fn chat_echoes_supplied_session_id() {
        let handle = serve(MockProvider::replies(&["ok"])).await;
        let url = format!("http://127.0.0.1:{}/chat", handle.port);

        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({ "message": "hi", "session_id": "visitor-7" }))
            .send()
            .await
            .unwrap();

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["session_id"], "visitor-7");
    }

    #[tokio::test]
    async fn chat_tool_flow_end_to_end() {
        let provider = MockProvider::new(vec![
            Ok(AssistantMessage::with_tool_calls(
                None,
                vec![ToolCall {
                    id: ToolCallId::from_raw("call_1"),
                    name: "list_products".into(),
                    arguments: "{}".into(),
                }],
            )),
            Ok(AssistantMessage::text("We have three gift cards.")),
        ]);
        let handle = serve(provider).await;
        let url = format!("http://127.0.0.1:{}/chat", handle.port);

        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({ "message": "what do you sell?" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["response"], "We have three gift cards.");
    }

    #[tokio::test]
    async fn chat_failure_yields_500_with_error_body() {
        // No responses configured: the first model query fails.
        let handle = serve(MockProvider::new(vec![])).await;
        let url = format!("http://127.0.0.1:{}/chat", handle.port);

        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({ "message": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn webhook_accepts_valid_signature() {
        let handle = serve(MockProvider::replies(&[])).await;
        let url = format!("http://127.0.0.1:{}/webhook", handle.port);

        let payload = br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_1","metadata":{"product_id":"gift_card_25"}}}}"#;
        let header = sign_payload(payload, WEBHOOK_SECRET, chrono::Utc::now().timestamp());

        let resp = reqwest::Client::new()
            .post(&url)
            .header(handlers::SIGNATURE_HEADER, header)
            .body(payload.to_vec())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn webhook_ignores_unhandled_event_types() {
        let handle = serve(MockProvider::replies(&[])).await;
        let url = format!("http://127.0.0.1:{}/webhook", handle.port);

        let payload = br#"{"type":"invoice.paid","data":{"object":{"id":"in_1"}}}"#;
        let header = sign_payload(payload, WEBHOOK_SECRET, chrono::Utc::now().timestamp());

        let resp = reqwest::Client::new()
            .post(&url)
            .header(handlers::SIGNATURE_HEADER, header)
            .body(payload.to_vec())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn webhook_rejects_bad_signature() {
        let handle = serve(MockProvider::replies(&[])).await;
        let url = format!("http://127.0.0.1:{}/webhook", handle.port);

        let payload = br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#;
        let header = sign_payload(payload, "whsec_wrong_secret", chrono::Utc::now().timestamp());

        let resp = reqwest::Client::new()
            .post(&url)
            .header(handlers::SIGNATURE_HEADER, header)
            .body(payload.to_vec())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn webhook_rejects_missing_signature_header() {
        let handle = serve(MockProvider::replies(&[])).await;
        let url = format!("http://127.0.0.1:{}/webhook", handle.port);

        let resp = reqwest::Client::new()
            .post(&url)
            .body(r#"{"type":"checkout.session.completed"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn responses_carry_permissive_cors_headers() {
        let handle = serve(MockProvider::replies(&[])).await;
        let url = format!("http://127.0.0.1:{}/health", handle.port);

        let resp = reqwest::Client::new()
            .get(&url)
            .header("Origin", "https://storefront.example.com")
            .send()
            .await
            .unwrap();

        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
