//! Conversation domain: messages, roles, and tool calls.

mod message;
mod tool_call;

pub use message::{ChatMessage, MessageRole};
pub use tool_call::ToolCall;
