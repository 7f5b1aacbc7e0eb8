//! Document Reader Module
//!
//! - BufferedSource: refilling byte source with backtracking-safe scans
//! - DocumentReader: configuration-driven recursive descent

pub mod buffered;
pub mod document;

pub use buffered::BufferedSource;
pub use document::{read_document, DocumentReader, ReaderOptions};
