//! Structure discovery
//!
//! Reads a document through a catch-all configuration and records which
//! tags and attribute names occur where. Repeated siblings with the same tag
//! collapse into one [`DiscoveredNode`] holding the union of their
//! attributes and children.

use crate::bind::{BindingPath, Target};
use crate::config::ConfigTree;
use crate::error::{Error, Result};
use crate::reader::{DocumentReader, ReaderOptions};
use indexmap::{IndexMap, IndexSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One distinct tag at one nesting path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredNode {
    tag: String,
    attribute_names: IndexSet<String>,
    children: IndexMap<String, DiscoveredNode>,
    content_seen: bool,
}

impl DiscoveredNode {
    /// Create a node for `tag`
    pub fn new(tag: &str) -> Self {
        DiscoveredNode {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    /// The document-level node; its children are document elements
    pub fn root() -> Self {
        Self::new("")
    }

    /// Tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute names seen on this tag, first sighting first
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attribute_names.iter().map(String::as_str)
    }

    /// Child nodes, first sighting first
    pub fn children(&self) -> impl Iterator<Item = &DiscoveredNode> {
        self.children.values()
    }

    /// Child node for `tag`
    pub fn child(&self, tag: &str) -> Option<&DiscoveredNode> {
        self.children.get(tag)
    }

    /// True if any occurrence of this tag carried non-whitespace text
    pub fn content_seen(&self) -> bool {
        self.content_seen
    }

    /// Levels of nesting below and including this node
    pub fn depth(&self) -> usize {
        1 + self.children().map(DiscoveredNode::depth).max().unwrap_or(0)
    }

    /// Existing child for `tag`, or a newly registered one
    pub fn add_element(&mut self, tag: &str) -> &mut DiscoveredNode {
        self.children
            .entry(tag.to_string())
            .or_insert_with(|| DiscoveredNode::new(tag))
    }

    /// Record an attribute name (idempotent)
    pub fn set_attribute(&mut self, name: &str) {
        if !self.attribute_names.contains(name) {
            self.attribute_names.insert(name.to_string());
        }
    }

    /// Fold another sighting of the same tag into this node
    pub fn merge(&mut self, other: DiscoveredNode) {
        for name in other.attribute_names {
            self.attribute_names.insert(name);
        }
        self.content_seen |= other.content_seen;
        for (tag, child) in other.children {
            match self.children.get_mut(&tag) {
                Some(existing) => existing.merge(child),
                None => {
                    self.children.insert(tag, child);
                }
            }
        }
    }
}

impl Target for DiscoveredNode {
    fn new_child(&mut self, _path: &BindingPath, tag: &str) -> Result<Option<&mut dyn Target>> {
        Ok(Some(self.add_element(tag)))
    }

    fn set_attribute(&mut self, _path: &BindingPath, name: &str, _value: &str) -> Result<()> {
        DiscoveredNode::set_attribute(self, name);
        Ok(())
    }

    fn set_content(&mut self, _path: &BindingPath, _value: &str) -> Result<()> {
        self.content_seen = true;
        Ok(())
    }
}

/// Configuration that binds everything: one fallback node that is its own
/// fallback child, with a fallback attribute path and a content path.
pub fn catch_all_config() -> ConfigTree {
    let mut tree = ConfigTree::new();
    let any = tree.add_fallback_subnode(tree.root());
    tree.set_subnode_fallback(any, any);
    tree.set_new_node_path(any, "add");
    tree.set_attribs_fallback(any, "attr");
    tree.set_content_path(any, "content");
    tree
}

/// Discover the structure of one document
pub fn discover<R: Read>(reader: R) -> Result<DiscoveredNode> {
    discover_with_options(reader, &catch_all_config(), ReaderOptions::default())
}

/// Discover with a caller-held catch-all tree and explicit options
pub fn discover_with_options<R: Read>(
    reader: R,
    config: &ConfigTree,
    options: ReaderOptions,
) -> Result<DiscoveredNode> {
    let mut root = DiscoveredNode::root();
    DocumentReader::with_options(reader, config, options).read(&mut root)?;
    debug!(depth = root.depth(), "structure discovered");
    Ok(root)
}

/// Discover the structure of a file
pub fn discover_file(
    path: impl AsRef<Path>,
    config: &ConfigTree,
    options: ReaderOptions,
) -> Result<DiscoveredNode> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::file_open(path, e))?;
    discover_with_options(file, config, options)
}
