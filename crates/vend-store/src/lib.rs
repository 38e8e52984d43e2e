pub mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::InMemorySessionStore;

use vend_core::ids::SessionId;
use vend_core::messages::Message;

/// Store of per-session ordered message histories.
///
/// Backings are pluggable (in-memory for tests and the reference
/// deployment, a persistent store behind the same contract for anything
/// that must survive a restart). Individual operations are atomic;
/// whole-turn exclusion is the orchestrator's job.
pub trait SessionStore: Send + Sync {
    /// Snapshot of the session's history, creating and seeding it with
    /// the system message on first access.
    fn get_or_create(&self, id: &SessionId) -> Result<Vec<Message>, StoreError>;

    /// Append one message, creating the session if needed.
    fn append(&self, id: &SessionId, message: Message) -> Result<(), StoreError>;

    /// Number of messages in the session (0 when it does not exist yet).
    fn len(&self, id: &SessionId) -> Result<usize, StoreError>;

    /// Truncate trailing messages left behind by a failed turn so the
    /// history never ends with tool calls that lack results. Returns the
    /// number of messages dropped.
    fn repair(&self, id: &SessionId) -> Result<usize, StoreError>;
}
