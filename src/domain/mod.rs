//! Domain layer: conversation model and tool catalog.

pub mod chat;
pub mod tools;
