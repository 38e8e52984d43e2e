pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod tools;

pub use dispatch::Dispatcher;
pub use error::EngineError;
pub use orchestrator::{ChatOrchestrator, SALES_ASSISTANT_PROMPT};
pub use registry::ToolRegistry;
