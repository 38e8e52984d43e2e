//! Conversion between the internal message model and the chat-completions
//! wire format.

use serde::Deserialize;
use serde_json::{json, Value};

use vend_core::errors::GatewayError;
use vend_core::ids::ToolCallId;
use vend_core::messages::{AssistantMessage, Message, ToolCall};
use vend_core::tools::ToolDefinition;

/// Build the JSON request body for a completion call.
pub fn build_request_body(
    model: &str,
    messages: &[Message],
    tools: &[ToolDefinition],
    tool_choice: Option<&str>,
) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages.iter().map(message_to_wire).collect::<Vec<_>>(),
    });

    if !tools.is_empty() {
        body["tools"] = Value::Array(tools.iter().map(tool_to_wire).collect());
    }
    if let Some(choice) = tool_choice {
        body["tool_choice"] = Value::String(choice.to_string());
    }

    body
}

fn message_to_wire(message: &Message) -> Value {
    match message {
        Message::System { content } => json!({ "role": "system", "content": content }),
        Message::User { content } => json!({ "role": "user", "content": content }),
        Message::Assistant(msg) => {
            let mut wire = json!({ "role": "assistant", "content": msg.content });
            if !msg.tool_calls.is_empty() {
                wire["tool_calls"] = Value::Array(
                    msg.tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id.as_str(),
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments,
                                },
                            })
                        })
                        .collect(),
                );
            }
            wire
        }
        Message::Tool(msg) => json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id.as_str(),
            "content": msg.content,
        }),
    }
}

fn tool_to_wire(def: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": def.name,
            "description": def.description,
            "parameters": def.parameters_schema,
        },
    })
}

// --- Response parsing ---

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireAssistant,
}

#[derive(Deserialize)]
struct WireAssistant {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

/// Parse a completion response body into an assistant message.
pub fn parse_completion(body: &str) -> Result<AssistantMessage, GatewayError> {
    let completion: Completion = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::MalformedResponse("response has no choices".into()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|call| ToolCall {
            id: ToolCallId::from_raw(call.id),
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    Ok(AssistantMessage::with_tool_calls(
        choice.message.content,
        tool_calls,
    ))
}
