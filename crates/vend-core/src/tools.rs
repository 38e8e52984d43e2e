use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tool definition sent to the model provider as part of the request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

/// Serialized payload a tool hands back to the orchestrator.
///
/// Validation failures and upstream provider faults are reported as
/// `is_error` payloads, never as `Err` — only argument-shape problems
/// escape through [`ToolError`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolReply {
    pub content: String,
    pub is_error: bool,
}

impl ToolReply {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Structured `{"error": …}` payload.
    pub fn error_payload(message: impl AsRef<str>) -> Self {
        Self {
            content: serde_json::json!({ "error": message.as_ref() }).to_string(),
            is_error: true,
        }
    }
}

/// Trait implemented by each tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> serde_json::Value;

    async fn execute(&self, args: serde_json::Value) -> Result<ToolReply, ToolError>;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters_schema: self.parameters_schema(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}
