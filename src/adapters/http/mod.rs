//! HTTP adapter: the chat API surface.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{AppState, SYSTEM_PROMPT};
pub use routes::api_router;
