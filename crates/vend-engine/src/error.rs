use vend_core::errors::GatewayError;
use vend_store::StoreError;

/// Failures that abort a chat turn and surface as a generic server error.
/// Tool validation problems and provider faults never take this path —
/// they become structured payloads inside the conversation instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("model query failed: {0}")]
    Gateway(#[from] GatewayError),
    #[error("malformed arguments for tool {tool}: {reason}")]
    BadToolArguments { tool: String, reason: String },
    #[error("tool {tool} failed: {reason}")]
    ToolFailed { tool: String, reason: String },
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Gateway(_) => "gateway",
            Self::BadToolArguments { .. } => "bad_tool_arguments",
            Self::ToolFailed { .. } => "tool_failed",
            Self::Store(_) => "store",
        }
    }
}
