//! Core parsing primitives
//!
//! - Scanner: name classes and memchr-based delimiter search
//! - Entities: the four named references and output escaping
//! - Namespace: prefix table, global or scoped

pub mod entities;
pub mod namespace;
pub mod scanner;
