mod config;

use std::sync::Arc;

use vend_core::catalog::ProductCatalog;
use vend_engine::tools::sales_registry;
use vend_engine::{ChatOrchestrator, SALES_ASSISTANT_PROMPT};
use vend_llm::OpenAiProvider;
use vend_payments::{KeyMode, StripeGateway};
use vend_server::{AppState, ServerConfig};
use vend_store::InMemorySessionStore;

use config::Config;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting vend sales assistant");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            std::process::exit(1);
        }
    };

    match config.stripe_key_mode {
        KeyMode::Test => tracing::info!("payment key is a test-mode key"),
        KeyMode::Live => {
            tracing::warn!("payment key is a LIVE key, real charges will be created")
        }
    }

    let catalog = Arc::new(ProductCatalog::gift_cards());
    let store = Arc::new(InMemorySessionStore::new(SALES_ASSISTANT_PROMPT));
    let gateway = Arc::new(StripeGateway::new(config.stripe_secret_key));
    let provider = Arc::new(OpenAiProvider::new(
        config.openai_api_key,
        config.openai_model.as_deref(),
    ));

    let registry = sales_registry(catalog, gateway);
    let orchestrator = Arc::new(ChatOrchestrator::new(provider, store, Arc::new(registry)));

    let state = AppState {
        orchestrator,
        webhook_secret: config.stripe_webhook_secret,
    };

    let server_config = ServerConfig { port: config.port };
    let handle = match vend_server::start(server_config, state).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind server");
            std::process::exit(1);
        }
    };

    tracing::info!(port = handle.port, "vend ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");

    tracing::info!("Shutting down");
}
