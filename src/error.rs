//! Error types for document mapping.
//!
//! Structural and I/O errors abort a read. A tag or attribute with no
//! configuration entry is not an error and never shows up here.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for xmlmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all xmlmap operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Unexpected token or malformed markup
    #[error("{message} at line {line}, offset {offset}")]
    Structural {
        /// What was expected or found
        message: String,
        /// 1-based line of the failure
        line: usize,
        /// Absolute byte offset of the failure
        offset: u64,
    },

    /// Failed to open an input file
    #[error("failed to open '{path}': {source}")]
    FileOpen {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Read failure on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A binding target rejected a call
    #[error("binding '{path}' failed: {message}")]
    Binding {
        /// Binding path that was invoked
        path: String,
        /// Target-supplied reason
        message: String,
    },

    /// Configuration document is well formed but not a usable configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Template walk went deeper than the configured guard
    #[error("template nesting exceeds {depth} levels")]
    TemplateDepth {
        /// The guard that was exceeded
        depth: usize,
    },
}

impl Error {
    /// Creates a new structural error
    pub fn structural(message: impl Into<String>, line: usize, offset: u64) -> Self {
        Self::Structural {
            message: message.into(),
            line,
            offset,
        }
    }

    /// Creates a new file open error
    pub fn file_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }

    /// Creates a new binding error
    pub fn binding(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Binding {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true for malformed-input errors
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }
}
