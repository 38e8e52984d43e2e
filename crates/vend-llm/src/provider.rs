use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use vend_core::errors::GatewayError;
use vend_core::messages::{AssistantMessage, Message};
use vend_core::tools::ToolDefinition;

use crate::wire;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Whether the model may decide to call tools for this completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolChoice {
    /// Model decides; tool definitions are sent.
    Auto,
    /// Tools are omitted from the request entirely.
    None,
}

/// Trait implemented by each chat-completion provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AssistantMessage, GatewayError>;
}

/// Non-streaming client for an OpenAI-compatible chat-completions API.
pub struct OpenAiProvider {
    client: Client,
    api_key: SecretString,
    model: String,
    api_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: SecretString, model: Option<&str>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            api_key,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            api_url: API_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (proxies, compatible APIs).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, messages, tools), fields(model = %self.model, messages = messages.len()))]
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AssistantMessage, GatewayError> {
        let (tools, choice) = match tool_choice {
            ToolChoice::Auto => (tools, Some("auto")),
            ToolChoice::None => (&[][..], None),
        };
        let body = wire::build_request_body(&self.model, messages, tools, choice);

        let resp = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, body));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        wire::parse_completion(&text)
    }
}
