//! Binding surface
//!
//! The reader never knows the shape of the objects it fills. Every matched
//! element, attribute and text run is handed to a [`Target`] together with
//! the [`BindingPath`] from the configuration, and the target decides what
//! that path means for its own type.

use crate::error::Result;
use std::fmt;

/// Opaque binding expression taken verbatim from a configuration entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingPath(String);

impl BindingPath {
    /// Wrap a path expression
    pub fn new(path: impl Into<String>) -> Self {
        BindingPath(path.into())
    }

    /// The expression text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BindingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BindingPath {
    fn from(path: &str) -> Self {
        BindingPath::new(path)
    }
}

impl From<String> for BindingPath {
    fn from(path: String) -> Self {
        BindingPath(path)
    }
}

/// Host object that receives bound document data
///
/// Implement this per output type. The reader calls these in document
/// order: `new_child` once per matched element, then `set_attribute` for
/// each bound attribute of that element, then `set_content` and the
/// children's calls interleaved as they appear.
pub trait Target {
    /// Create or obtain the object for a child element.
    ///
    /// # Arguments
    /// * `path` - The element's new-node path
    /// * `tag` - The tag as written in the document (prefix included)
    ///
    /// Returning `Ok(None)` leaves the element unbound; its subtree is still
    /// consumed.
    fn new_child(&mut self, path: &BindingPath, tag: &str) -> Result<Option<&mut dyn Target>>;

    /// Set an attribute value.
    ///
    /// `name` is namespace-qualified (`{uri}:{local}`) when its prefix was
    /// declared, otherwise as written.
    fn set_attribute(&mut self, path: &BindingPath, name: &str, value: &str) -> Result<()>;

    /// Set text content (entity-decoded)
    fn set_content(&mut self, path: &BindingPath, value: &str) -> Result<()> {
        let _ = (path, value);
        Ok(())
    }
}

/// Target that accepts and discards everything.
///
/// Useful for checking that a document is well formed for a configuration
/// without keeping any output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTarget;

impl Target for NullTarget {
    fn new_child(&mut self, _path: &BindingPath, _tag: &str) -> Result<Option<&mut dyn Target>> {
        Ok(Some(self))
    }

    fn set_attribute(&mut self, _path: &BindingPath, _name: &str, _value: &str) -> Result<()> {
        Ok(())
    }
}

/// Target that counts binding calls
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingTarget {
    /// Number of `new_child` calls
    pub elements: usize,
    /// Number of `set_attribute` calls
    pub attributes: usize,
    /// Number of `set_content` calls
    pub contents: usize,
}

impl Target for CountingTarget {
    fn new_child(&mut self, _path: &BindingPath, _tag: &str) -> Result<Option<&mut dyn Target>> {
        self.elements += 1;
        Ok(Some(self))
    }

    fn set_attribute(&mut self, _path: &BindingPath, _name: &str, _value: &str) -> Result<()> {
        self.attributes += 1;
        Ok(())
    }

    fn set_content(&mut self, _path: &BindingPath, _value: &str) -> Result<()> {
        self.contents += 1;
        Ok(())
    }
}
