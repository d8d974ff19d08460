//! Ports: trait interfaces to external collaborators.

mod chat_model;
mod converter;
mod dataset_service;
mod file_resolver;

pub use chat_model::{ChatModel, ChatModelError};
pub use converter::{ConversionReport, ConvertError, ExtractConverter};
pub use dataset_service::{DatasetCheck, DatasetInfo, DatasetService, DatasetServiceError};
pub use file_resolver::{FileResolver, ResolveError};
