//! Tableau Assistant - AI-powered Tableau Server operations.
//!
//! This crate exposes Tableau Server dataset operations (upload, existence
//! checks, listing, Excel/CSV to Hyper conversion) through a conversational
//! HTTP API backed by a local Ollama model with tool calling.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
