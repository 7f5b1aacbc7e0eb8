//! xmlmap - Configuration-driven streaming XML mapping
//!
//! Reads a document incrementally and, guided by a configuration tree,
//! binds elements, attributes and text to caller-defined objects without
//! building a DOM.
//!
//! Paths:
//! A: Mapping (read_document + ConfigTree + your Target impls)
//! B: Configuration documents (ConfigTree::load, cfg-of-cfg)
//! C: Discovery (discover, discover_all) and templates (write_template)
//!
//! ```no_run
//! use xmlmap::{read_document, ConfigTree, CountingTarget};
//!
//! let config = ConfigTree::from_file("catalog.cfg.xml")?;
//! let mut counts = CountingTarget::default();
//! read_document(std::fs::File::open("catalog.xml")?, &config, &mut counts)?;
//! println!("{} elements bound", counts.elements);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]

pub mod bind;
pub mod config;
pub mod core;
pub mod discover;
pub mod error;
pub mod reader;

pub use bind::{BindingPath, CountingTarget, NullTarget, Target};
pub use config::{bootstrap_config, ConfigNode, ConfigTree, NodeId};
pub use crate::core::namespace::NamespaceScoping;
pub use discover::{
    catch_all_config, discover, discover_all, write_template, DiscoveredNode, TemplateOptions,
    TemplateWriter,
};
pub use error::{Error, Result};
pub use reader::{read_document, DocumentReader, ReaderOptions};

use std::fs::File;
use std::path::Path;

/// Read a document file, binding into `root`. The file is closed on every
/// exit path.
pub fn read_file(path: impl AsRef<Path>, config: &ConfigTree, root: &mut dyn Target) -> Result<()> {
    read_file_with_options(path, config, root, ReaderOptions::default())
}

/// Like [`read_file`] with explicit reader options
pub fn read_file_with_options(
    path: impl AsRef<Path>,
    config: &ConfigTree,
    root: &mut dyn Target,
    options: ReaderOptions,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::file_open(path, e))?;
    DocumentReader::with_options(file, config, options).read(root)
}
