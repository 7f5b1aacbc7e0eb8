//! Configuration tree
//!
//! Arena of [`ConfigNode`]s addressed by [`NodeId`]. A node's subnode
//! fallback may point back at the node itself, which is how a catch-all
//! configuration accepts arbitrarily deep unknown structure without an
//! infinite tree.

use crate::bind::BindingPath;
use indexmap::IndexMap;

/// Index of a node in its [`ConfigTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Binding rule for one tag, or the wildcard fallback
#[derive(Debug, Clone, Default)]
pub struct ConfigNode {
    tag: String,
    attribs: IndexMap<String, BindingPath>,
    attribs_fallback: Option<BindingPath>,
    subnodes: IndexMap<String, NodeId>,
    subnode_fallback: Option<NodeId>,
    content_path: Option<BindingPath>,
    new_node_path: Option<BindingPath>,
}

impl ConfigNode {
    fn new(tag: &str) -> Self {
        ConfigNode {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    /// Tag this node was declared for (`*` for fallbacks, empty for the root)
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Exact attribute bindings in declaration order
    pub fn attribs(&self) -> impl Iterator<Item = (&str, &BindingPath)> {
        self.attribs.iter().map(|(name, path)| (name.as_str(), path))
    }

    /// Path used for attributes with no exact entry
    pub fn attribs_fallback(&self) -> Option<&BindingPath> {
        self.attribs_fallback.as_ref()
    }

    /// Exact child bindings in declaration order
    pub fn subnodes(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.subnodes.iter().map(|(tag, &id)| (tag.as_str(), id))
    }

    /// Node used for child tags with no exact entry
    pub fn subnode_fallback(&self) -> Option<NodeId> {
        self.subnode_fallback
    }

    /// Path that receives this element's text content
    pub fn content_path(&self) -> Option<&BindingPath> {
        self.content_path.as_ref()
    }

    /// Path that creates the object for this element.
    /// `None` makes the element transparent: it binds into its parent's object.
    pub fn new_node_path(&self) -> Option<&BindingPath> {
        self.new_node_path.as_ref()
    }
}

/// Tree of binding rules, read-only while a document is parsed
#[derive(Debug, Clone)]
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTree {
    /// Create a tree holding only the root. The root's subnodes are the
    /// accepted document elements.
    pub fn new() -> Self {
        ConfigTree {
            nodes: vec![ConfigNode::new("")],
        }
    }

    /// The root node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> &ConfigNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if only the root exists and it binds nothing
    pub fn is_empty(&self) -> bool {
        let root = &self.nodes[0];
        self.nodes.len() == 1 && root.subnodes.is_empty() && root.subnode_fallback.is_none()
    }

    fn node_mut(&mut self, id: NodeId) -> &mut ConfigNode {
        &mut self.nodes[id.index()]
    }

    fn push(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ConfigNode::new(tag));
        id
    }

    /// Add a child rule for `tag`, or return the existing one
    pub fn add_subnode(&mut self, parent: NodeId, tag: &str) -> NodeId {
        if let Some(&id) = self.node(parent).subnodes.get(tag) {
            return id;
        }
        let id = self.push(tag);
        self.node_mut(parent).subnodes.insert(tag.to_string(), id);
        id
    }

    /// Register an existing node as the child rule for `tag`.
    /// Lets a node list itself (or an ancestor) as a child.
    pub fn link_subnode(&mut self, parent: NodeId, tag: &str, child: NodeId) {
        self.node_mut(parent).subnodes.insert(tag.to_string(), child);
    }

    /// Add the wildcard child rule, or return the existing one
    pub fn add_fallback_subnode(&mut self, parent: NodeId) -> NodeId {
        if let Some(id) = self.node(parent).subnode_fallback {
            return id;
        }
        let id = self.push("*");
        self.node_mut(parent).subnode_fallback = Some(id);
        id
    }

    /// Point the wildcard child rule at an existing node (itself included)
    pub fn set_subnode_fallback(&mut self, parent: NodeId, fallback: NodeId) {
        self.node_mut(parent).subnode_fallback = Some(fallback);
    }

    /// Bind attribute `name` of this node's element to `path`
    pub fn add_attrib(&mut self, node: NodeId, name: &str, path: impl Into<BindingPath>) {
        self.node_mut(node).attribs.insert(name.to_string(), path.into());
    }

    /// Bind every attribute without an exact entry to `path`
    pub fn set_attribs_fallback(&mut self, node: NodeId, path: impl Into<BindingPath>) {
        self.node_mut(node).attribs_fallback = Some(path.into());
    }

    /// Bind this element's text content to `path`
    pub fn set_content_path(&mut self, node: NodeId, path: impl Into<BindingPath>) {
        self.node_mut(node).content_path = Some(path.into());
    }

    /// Set the path that creates this element's object
    pub fn set_new_node_path(&mut self, node: NodeId, path: impl Into<BindingPath>) {
        self.node_mut(node).new_node_path = Some(path.into());
    }

    /// Child rule for `tag`: exact match, else fallback, else none
    pub fn lookup_subnode(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.lookup_subnode_in(parent, &[tag])
    }

    /// Like [`lookup_subnode`](Self::lookup_subnode), trying each candidate
    /// name for an exact match before falling back
    pub fn lookup_subnode_in(&self, parent: NodeId, names: &[&str]) -> Option<NodeId> {
        let node = self.node(parent);
        names
            .iter()
            .find_map(|name| node.subnodes.get(*name).copied())
            .or(node.subnode_fallback)
    }

    /// Attribute path for `name`: exact match, else fallback, else none
    pub fn lookup_attrib_path(&self, node: NodeId, name: &str) -> Option<&BindingPath> {
        self.lookup_attrib_path_in(node, &[name])
    }

    /// Like [`lookup_attrib_path`](Self::lookup_attrib_path) over several candidate names
    pub fn lookup_attrib_path_in(&self, node: NodeId, names: &[&str]) -> Option<&BindingPath> {
        let node = self.node(node);
        names
            .iter()
            .find_map(|name| node.attribs.get(*name))
            .or(node.attribs_fallback.as_ref())
    }
}
