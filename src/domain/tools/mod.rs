//! Tool catalog domain: definitions, registry, and result envelope.

mod definition;
mod registry;
mod result;

pub use definition::ToolDefinition;
pub use registry::{
    ToolRegistry, CHECK_DATASET, CONVERT_EXCEL_TO_HYPER, LIST_DATASETS, UPLOAD_DATASET,
};
pub use result::ToolResult;
