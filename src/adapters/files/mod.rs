//! Local filesystem adapter.

mod resolver;

pub use resolver::DirectoryFileResolver;
