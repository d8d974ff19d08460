//! Adapters: concrete implementations of the ports.

pub mod extract;
pub mod files;
pub mod http;
pub mod ollama;
pub mod tableau;
