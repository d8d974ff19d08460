//! Ollama adapter.

mod chat_model;

pub use chat_model::OllamaChatModel;
