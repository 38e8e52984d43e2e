use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use vend_core::errors::GatewayError;
use vend_core::messages::{AssistantMessage, Message};
use vend_core::tools::ToolDefinition;

use crate::provider::{ChatProvider, ToolChoice};

/// What a [`MockProvider`] saw on one `complete()` call.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub message_count: usize,
    pub tool_count: usize,
    pub tool_choice: ToolChoice,
}

/// Provider returning pre-programmed responses in sequence, for
/// deterministic testing without API calls.
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<AssistantMessage, GatewayError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    pub fn new(responses: Vec<Result<AssistantMessage, GatewayError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Convenience: a sequence of plain text replies.
    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(AssistantMessage::text(*t))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Requests observed so far, in call order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AssistantMessage, GatewayError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().push(RecordedRequest {
            message_count: messages.len(),
            tool_count: tools.len(),
            tool_choice,
        });

        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(GatewayError::InvalidRequest(format!(
                "MockProvider: no response configured for call {idx}"
            )))
        })
    }
}
