use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, instrument, warn};

use vend_core::ids::SessionId;
use vend_core::messages::Message;
use vend_llm::{ChatProvider, ToolChoice};
use vend_store::SessionStore;

use crate::dispatch::Dispatcher;
use crate::error::EngineError;
use crate::registry::ToolRegistry;

/// System message seeded into every fresh session.
pub const SALES_ASSISTANT_PROMPT: &str = "\
You are a helpful sales assistant for a gift card store.

Help users browse and purchase gift cards. When they want to buy something:
1. Use the create_checkout_session function to generate a payment link
2. The function will return a JSON with \"checkout_url\"
3. Share that URL with the user in a friendly way

Important: When you receive the checkout URL, present it to the user like this:
\"Great! I've created your checkout session. Click here to complete your payment: [URL]\"

Always be friendly and helpful!";

/// Owns the request/response cycle of one chat turn: append user input,
/// query the model, dispatch any requested tool calls in order, re-query
/// for the final answer.
pub struct ChatOrchestrator {
    provider: Arc<dyn ChatProvider>,
    store: Arc<dyn SessionStore>,
    registry: Arc<ToolRegistry>,
    dispatcher: Dispatcher,
    /// Per-session turn gates: one turn at a time per session, so
    /// interleaved requests cannot corrupt the call/result pairing.
    turn_gates: DashMap<SessionId, Arc<tokio::sync::Mutex<()>>>,
}

impl ChatOrchestrator {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        store: Arc<dyn SessionStore>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            store,
            registry: Arc::clone(&registry),
            dispatcher: Dispatcher::new(registry),
            turn_gates: DashMap::new(),
        }
    }

    fn turn_gate(&self, session_id: &SessionId) -> Arc<tokio::sync::Mutex<()>> {
        let entry = self
            .turn_gates
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())));
        Arc::clone(entry.value())
    }

    /// Run one chat turn and return the assistant's final reply text.
    ///
    /// The session retains whatever was appended before a failure (no
    /// rollback); the next turn starts by truncating any unmatched
    /// tool-call tail a failed turn left behind.
    #[instrument(skip(self, user_text), fields(session_id = %session_id))]
    pub async fn run_turn(
        &self,
        session_id: &SessionId,
        user_text: &str,
    ) -> Result<String, EngineError> {
        let gate = self.turn_gate(session_id);
        let _turn = gate.lock().await;

        let dropped = self.store.repair(session_id)?;
        if dropped > 0 {
            warn!(dropped, "truncated unmatched tool-call tail from a failed turn");
        }

        self.store.append(session_id, Message::user(user_text))?;

        let history = self.store.get_or_create(session_id)?;
        let definitions = self.registry.definitions();
        let first = self
            .provider
            .complete(&history, &definitions, ToolChoice::Auto)
            .await?;

        let calls = first.tool_calls.clone();
        self.store.append(session_id, Message::Assistant(first.clone()))?;

        if calls.is_empty() {
            return Ok(first.text_content());
        }

        info!(count = calls.len(), "model requested tool calls");

        // One result per requested call, strictly in request order.
        for call in &calls {
            let payload = self.dispatcher.dispatch(call).await?;
            self.store
                .append(session_id, Message::tool_result(call.id.clone(), payload))?;
        }

        let history = self.store.get_or_create(session_id)?;
        let second = self
            .provider
            .complete(&history, &[], ToolChoice::None)
            .await?;

        let reply = second.text_content();
        self.store
            .append(session_id, Message::assistant_text(&reply))?;

        Ok(reply)
    }
}
