//! Application layer: tool execution and conversation orchestration.

mod executor;
mod orchestrator;

pub use executor::{ToolExecutor, UnhandledToolError};
pub use orchestrator::{ChatOrchestrator, ChatOutcome, TRUNCATION_MESSAGE};
