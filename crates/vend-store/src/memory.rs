use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use vend_core::ids::SessionId;
use vend_core::messages::Message;

use crate::error::StoreError;
use crate::SessionStore;

/// Process-lifetime session store. Sessions are created lazily, seeded
/// with the system message, and never evicted.
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, Arc<Mutex<Vec<Message>>>>,
    system_prompt: String,
}

impl InMemorySessionStore {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            sessions: DashMap::new(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn slot(&self, id: &SessionId) -> Arc<Mutex<Vec<Message>>> {
        let entry = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(vec![Message::system(&self.system_prompt)])));
        Arc::clone(entry.value())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, id: &SessionId) -> Result<Vec<Message>, StoreError> {
        Ok(self.slot(id).lock().clone())
    }

    fn append(&self, id: &SessionId, message: Message) -> Result<(), StoreError> {
        self.slot(id).lock().push(message);
        Ok(())
    }

    fn len(&self, id: &SessionId) -> Result<usize, StoreError> {
        Ok(self
            .sessions
            .get(id)
            .map(|slot| slot.lock().len())
            .unwrap_or(0))
    }

    fn repair(&self, id: &SessionId) -> Result<usize, StoreError> {
        let Some(slot) = self.sessions.get(id).map(|s| Arc::clone(s.value())) else {
            return Ok(0);
        };
        let mut messages = slot.lock();
        Ok(repair_tail(&mut messages))
    }
}

/// Truncate the history back to the last coherent point: it must not end
/// with an assistant tool-call message whose calls lack results, nor with
/// tool messages that answer nothing.
fn repair_tail(messages: &mut Vec<Message>) -> usize {
    let mut removed = 0;

    loop {
        let mut start = messages.len();
        while start > 0 && matches!(messages[start - 1], Message::Tool(_)) {
            start -= 1;
        }
        let trailing_tools = messages.len() - start;

        if start == 0 {
            removed += trailing_tools;
            messages.clear();
            break;
        }

        match &messages[start - 1] {
            Message::Assistant(msg) if msg.has_tool_calls() => {
                let requested: HashSet<&str> =
                    msg.tool_calls.iter().map(|c| c.id.as_str()).collect();
                let answered: HashSet<&str> = messages[start..]
                    .iter()
                    .filter_map(|m| match m {
                        Message::Tool(t) => Some(t.tool_call_id.as_str()),
                        _ => None,
                    })
                    .collect();
                if requested == answered {
                    break;
                }
                let keep = start - 1;
                removed += messages.len() - keep;
                messages.truncate(keep);
            }
            _ if trailing_tools > 0 => {
                removed += trailing_tools;
                messages.truncate(start);
            }
            _ => break,
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use vend_core::ids::ToolCallId;
    use vend_core::messages::{AssistantMessage, ToolCall};

    const PROMPT: &str = "You are a helpful sales assistant.";

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(PROMPT)
    }

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: ToolCallId::from_raw(id),
            name: "list_products".into(),
            arguments: "{}".into(),
        }
    }

    fn assistant_with_calls(ids: &[&str]) -> Message {
        Message::Assistant(AssistantMessage::with_tool_calls(
            None,
            ids.iter().map(|id| call(id)).collect(),
        ))
    }

    #[test]
    fn fresh_session_seeded_with_single_system_message() {
        let store = store();
        let id = SessionId::from_raw("fresh");
        let messages = store.get_or_create(&id).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            &messages[0],
            Message::System { content } if content == PROMPT
        ));
    }

    #[test]
    fn repeated_access_does_not_reseed() {
        let store = store();
        let id = SessionId::from_raw("s");
        store.get_or_create(&id).unwrap();
        store.append(&id, Message::user("hi")).unwrap();
        let messages = store.get_or_create(&id).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn append_creates_and_seeds() {
        let store = store();
        let id = SessionId::from_raw("s");
        store.append(&id, Message::user("hi")).unwrap();
        let messages = store.get_or_create(&id).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(&messages[0], Message::System { .. }));
        assert!(matches!(&messages[1], Message::User { .. }));
    }

    #[test]
    fn sessions_are_isolated() {
        let store = store();
        store
            .append(&SessionId::from_raw("a"), Message::user("for a"))
            .unwrap();
        store
            .append(&SessionId::from_raw("b"), Message::user("for b"))
            .unwrap();
        assert_eq!(store.session_count(), 2);
        assert_eq!(store.len(&SessionId::from_raw("a")).unwrap(), 2);
        assert_eq!(store.len(&SessionId::from_raw("b")).unwrap(), 2);
    }

    #[test]
    fn len_of_unknown_session_is_zero() {
        assert_eq!(store().len(&SessionId::from_raw("nope")).unwrap(), 0);
    }

    #[test]
    fn repair_of_unknown_session_is_noop() {
        assert_eq!(store().repair(&SessionId::from_raw("nope")).unwrap(), 0);
    }

    #[test]
    fn repair_keeps_coherent_history() {
        let store = store();
        let id = SessionId::from_raw("s");
        store.append(&id, Message::user("hi")).unwrap();
        store.append(&id, assistant_with_calls(&["call_1"])).unwrap();
        store
            .append(&id, Message::tool_result(ToolCallId::from_raw("call_1"), "{}"))
            .unwrap();
        store.append(&id, Message::assistant_text("done")).unwrap();

        assert_eq!(store.repair(&id).unwrap(), 0);
        assert_eq!(store.len(&id).unwrap(), 5);
    }

    #[test]
    fn repair_keeps_fully_answered_tail() {
        let store = store();
        let id = SessionId::from_raw("s");
        store.append(&id, Message::user("hi")).unwrap();
        store
            .append(&id, assistant_with_calls(&["call_1", "call_2"]))
            .unwrap();
        store
            .append(&id, Message::tool_result(ToolCallId::from_raw("call_1"), "{}"))
            .unwrap();
        store
            .append(&id, Message::tool_result(ToolCallId::from_raw("call_2"), "{}"))
            .unwrap();

        assert_eq!(store.repair(&id).unwrap(), 0);
        assert_eq!(store.len(&id).unwrap(), 4);
    }

    #[test]
    fn repair_drops_unanswered_tool_calls() {
        let store = store();
        let id = SessionId::from_raw("s");
        store.append(&id, Message::user("hi")).unwrap();
        store
            .append(&id, assistant_with_calls(&["call_1", "call_2"]))
            .unwrap();
        // Only the first call got a result before the turn died.
        store
            .append(&id, Message::tool_result(ToolCallId::from_raw("call_1"), "{}"))
            .unwrap();

        assert_eq!(store.repair(&id).unwrap(), 2);
        let messages = store.get_or_create(&id).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages.last(), Some(Message::User { .. })));
    }

    #[test]
    fn repair_drops_bare_tool_call_request() {
        let store = store();
        let id = SessionId::from_raw("s");
        store.append(&id, Message::user("hi")).unwrap();
        store.append(&id, assistant_with_calls(&["call_1"])).unwrap();

        assert_eq!(store.repair(&id).unwrap(), 1);
        assert_eq!(store.len(&id).unwrap(), 2);
    }

    #[test]
    fn repair_drops_orphan_tool_results() {
        let store = store();
        let id = SessionId::from_raw("s");
        store.append(&id, Message::user("hi")).unwrap();
        store
            .append(&id, Message::tool_result(ToolCallId::from_raw("call_9"), "{}"))
            .unwrap();

        assert_eq!(store.repair(&id).unwrap(), 1);
        assert!(matches!(
            store.get_or_create(&id).unwrap().last(),
            Some(Message::User { .. })
        ));
    }

    #[test]
    fn repair_drops_result_for_wrong_call_id() {
        let store = store();
        let id = SessionId::from_raw("s");
        store.append(&id, Message::user("hi")).unwrap();
        store.append(&id, assistant_with_calls(&["call_1"])).unwrap();
        store
            .append(&id, Message::tool_result(ToolCallId::from_raw("call_9"), "{}"))
            .unwrap();

        // Mismatched pairing: both the request and the stray result go.
        assert_eq!(store.repair(&id).unwrap(), 2);
        assert_eq!(store.len(&id).unwrap(), 2);
    }

    #[test]
    fn repair_unwinds_repeated_broken_tails() {
        let store = store();
        let id = SessionId::from_raw("s");
        store.append(&id, Message::user("hi")).unwrap();
        store.append(&id, assistant_with_calls(&["call_1"])).unwrap();
        store
            .append(&id, Message::tool_result(ToolCallId::from_raw("call_1"), "{}"))
            .unwrap();
        store.append(&id, assistant_with_calls(&["call_2"])).unwrap();

        // The dangling second request goes; the answered first exchange stays.
        assert_eq!(store.repair(&id).unwrap(), 1);
        assert_eq!(store.len(&id).unwrap(), 3);
    }
}
