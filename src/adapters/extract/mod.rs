//! Extract conversion adapter.

mod converter;

pub use converter::ArrowExtractConverter;
