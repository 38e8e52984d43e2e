use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use vend_core::messages::ToolCall;
use vend_core::tools::ToolError;

use crate::error::EngineError;
use crate::registry::ToolRegistry;

/// Executes one requested tool call and serializes its outcome.
///
/// An unknown tool name is a model mistake, answered with a structured
/// error payload the model can read. A malformed argument blob or a tool
/// bug is an orchestration-level failure and aborts the turn.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, call: &ToolCall) -> Result<String, EngineError> {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, "model requested an unregistered tool");
            return Ok(
                serde_json::json!({ "error": format!("Unknown tool: {}", call.name) }).to_string(),
            );
        };

        let args: Value = if call.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.arguments).map_err(|e| EngineError::BadToolArguments {
                tool: call.name.clone(),
                reason: e.to_string(),
            })?
        };

        debug!(tool = %call.name, call_id = %call.id, "executing tool");

        match tool.execute(args).await {
            Ok(reply) => {
                if reply.is_error {
                    debug!(tool = %call.name, "tool returned an error payload");
                }
                Ok(reply.content)
            }
            Err(ToolError::InvalidArguments(reason)) => Err(EngineError::BadToolArguments {
                tool: call.name.clone(),
                reason,
            }),
            Err(ToolError::ExecutionFailed(reason)) => Err(EngineError::ToolFailed {
                tool: call.name.clone(),
                reason,
            }),
        }
    }
}
