//! Configuration documents
//!
//! A configuration is itself a document in the same markup, read by the
//! same [`DocumentReader`] through a small fixed tree (the cfg-of-cfg):
//!
//! ```text
//! <config>
//!   <element tag="catalog" new="catalog">
//!     <attribute name="version" path="version"/>
//!     <element tag="book" new="add-book" content="title">
//!       <attribute name="*" path="extra"/>
//!       <element tag="*" new="any" recursive="true"/>
//!     </element>
//!   </element>
//! </config>
//! ```
//!
//! `tag="*"` and `name="*"` declare fallbacks. An element without `new` is
//! transparent. `recursive="true"` makes the element its own fallback child.

use super::tree::{ConfigTree, NodeId};
use crate::bind::{BindingPath, Target};
use crate::error::{Error, Result};
use crate::reader::{DocumentReader, ReaderOptions};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Wildcard tag or attribute name
pub const WILDCARD: &str = "*";

/// Build the fixed tree that reads configuration documents
pub fn bootstrap_config() -> ConfigTree {
    let mut tree = ConfigTree::new();
    let config = tree.add_subnode(tree.root(), "config");
    tree.set_new_node_path(config, "config");

    let element = tree.add_subnode(config, "element");
    tree.set_new_node_path(element, "element");
    for attr in ["tag", "new", "content", "recursive"] {
        tree.add_attrib(element, attr, attr);
    }
    tree.link_subnode(element, "element", element);

    let attribute = tree.add_subnode(element, "attribute");
    tree.set_new_node_path(attribute, "attribute");
    tree.add_attrib(attribute, "name", "name");
    tree.add_attrib(attribute, "path", "path");
    tree
}

/// `<attribute>` declaration
#[derive(Debug, Default)]
struct AttributeDecl {
    name: Option<String>,
    path: Option<String>,
}

/// `<element>` declaration
#[derive(Debug, Default)]
struct ElementDecl {
    tag: Option<String>,
    new: Option<String>,
    content: Option<String>,
    recursive: bool,
    attributes: Vec<AttributeDecl>,
    elements: Vec<ElementDecl>,
}

/// Document root receiving the `<config>` element
#[derive(Debug, Default)]
struct ConfigDecl {
    seen: bool,
    elements: Vec<ElementDecl>,
}

fn unexpected(path: &BindingPath) -> Error {
    Error::binding(path.as_str(), "not a configuration path")
}

impl Target for ConfigDecl {
    fn new_child(&mut self, path: &BindingPath, _tag: &str) -> Result<Option<&mut dyn Target>> {
        match path.as_str() {
            "config" => {
                self.seen = true;
                Ok(Some(self))
            }
            "element" => {
                self.elements.push(ElementDecl::default());
                Ok(self.elements.last_mut().map(|e| e as &mut dyn Target))
            }
            _ => Err(unexpected(path)),
        }
    }

    fn set_attribute(&mut self, path: &BindingPath, _name: &str, _value: &str) -> Result<()> {
        Err(unexpected(path))
    }
}

impl Target for ElementDecl {
    fn new_child(&mut self, path: &BindingPath, _tag: &str) -> Result<Option<&mut dyn Target>> {
        match path.as_str() {
            "element" => {
                self.elements.push(ElementDecl::default());
                Ok(self.elements.last_mut().map(|e| e as &mut dyn Target))
            }
            "attribute" => {
                self.attributes.push(AttributeDecl::default());
                Ok(self.attributes.last_mut().map(|a| a as &mut dyn Target))
            }
            _ => Err(unexpected(path)),
        }
    }

    fn set_attribute(&mut self, path: &BindingPath, _name: &str, value: &str) -> Result<()> {
        match path.as_str() {
            "tag" => self.tag = Some(value.to_string()),
            "new" => self.new = Some(value.to_string()),
            "content" => self.content = Some(value.to_string()),
            "recursive" => {
                self.recursive = match value {
                    "true" | "yes" | "1" => true,
                    "false" | "no" | "0" => false,
                    other => {
                        return Err(Error::binding(
                            "recursive",
                            format!("expected true or false, found '{other}'"),
                        ))
                    }
                }
            }
            _ => return Err(unexpected(path)),
        }
        Ok(())
    }
}

impl Target for AttributeDecl {
    fn new_child(&mut self, path: &BindingPath, _tag: &str) -> Result<Option<&mut dyn Target>> {
        Err(unexpected(path))
    }

    fn set_attribute(&mut self, path: &BindingPath, _name: &str, value: &str) -> Result<()> {
        match path.as_str() {
            "name" => self.name = Some(value.to_string()),
            "path" => self.path = Some(value.to_string()),
            _ => return Err(unexpected(path)),
        }
        Ok(())
    }
}

impl ElementDecl {
    fn build(self, tree: &mut ConfigTree, parent: NodeId) -> Result<()> {
        let tag = self
            .tag
            .ok_or_else(|| Error::InvalidConfig("<element> without a 'tag' attribute".into()))?;
        let id = if tag == WILDCARD {
            tree.add_fallback_subnode(parent)
        } else {
            tree.add_subnode(parent, &tag)
        };

        if let Some(new) = self.new {
            tree.set_new_node_path(id, new);
        }
        if let Some(content) = self.content {
            tree.set_content_path(id, content);
        }
        if self.recursive {
            tree.set_subnode_fallback(id, id);
        }

        for attribute in self.attributes {
            let (name, path) = match (attribute.name, attribute.path) {
                (Some(name), Some(path)) => (name, path),
                _ => {
                    return Err(Error::InvalidConfig(format!(
                        "<attribute> in '{tag}' needs both 'name' and 'path'"
                    )))
                }
            };
            if name == WILDCARD {
                tree.set_attribs_fallback(id, path);
            } else {
                tree.add_attrib(id, &name, path);
            }
        }

        for element in self.elements {
            element.build(tree, id)?;
        }
        Ok(())
    }
}

impl ConfigTree {
    /// Load a configuration document from a reader
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        Self::load_with_options(reader, ReaderOptions::default())
    }

    /// Load a configuration document with explicit reader options
    pub fn load_with_options<R: Read>(reader: R, options: ReaderOptions) -> Result<Self> {
        let bootstrap = bootstrap_config();
        let mut decl = ConfigDecl::default();
        DocumentReader::with_options(reader, &bootstrap, options).read(&mut decl)?;
        if !decl.seen {
            return Err(Error::InvalidConfig("document element must be <config>".into()));
        }

        let mut tree = ConfigTree::new();
        let root = tree.root();
        for element in decl.elements {
            element.build(&mut tree, root)?;
        }
        debug!(nodes = tree.len(), "configuration loaded");
        Ok(tree)
    }

    /// Load a configuration document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_open(path, e))?;
        Self::load(file)
    }

    /// Load a configuration document from a string
    pub fn parse_str(text: &str) -> Result<Self> {
        Self::load(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"<?xml version="1.0"?>
<config>
  <!-- catalog layout -->
  <element tag="catalog" new="catalog">
    <attribute name="version" path="version"/>
    <element tag="book" new="add-book" content="title">
      <attribute name="*" path="extra"/>
      <element tag="*" new="any" recursive="true"/>
    </element>
    <element tag="meta">
      <attribute name="owner" path="owner"/>
    </element>
  </element>
</config>"#;

    #[test]
    fn test_load_catalog() {
        let tree = ConfigTree::parse_str(CATALOG).unwrap();
        let catalog = tree.lookup_subnode(tree.root(), "catalog").unwrap();
        assert_eq!(tree.node(catalog).new_node_path().map(|p| p.as_str()), Some("catalog"));
        assert_eq!(tree.lookup_attrib_path(catalog, "version").map(|p| p.as_str()), Some("version"));
        assert_eq!(tree.lookup_subnode(tree.root(), "other"), None);

        let book = tree.lookup_subnode(catalog, "book").unwrap();
        assert_eq!(tree.node(book).content_path().map(|p| p.as_str()), Some("title"));
        assert_eq!(tree.lookup_attrib_path(book, "anything").map(|p| p.as_str()), Some("extra"));

        let any = tree.lookup_subnode(book, "chapter").unwrap();
        assert_eq!(tree.lookup_subnode(any, "deeper"), Some(any));

        let meta = tree.lookup_subnode(catalog, "meta").unwrap();
        assert!(tree.node(meta).new_node_path().is_none());
    }

    #[test]
    fn test_bootstrap_is_recursive() {
        let tree = bootstrap_config();
        let config = tree.lookup_subnode(tree.root(), "config").unwrap();
        let element = tree.lookup_subnode(config, "element").unwrap();
        assert_eq!(tree.lookup_subnode(element, "element"), Some(element));
        assert!(tree.lookup_subnode(config, "attribute").is_none());
    }

    #[test]
    fn test_missing_tag_rejected() {
        let err = ConfigTree::parse_str("<config><element new=\"x\"/></config>").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_wrong_root_rejected() {
        let err = ConfigTree::parse_str("<settings/>").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_recursive_flag() {
        let err = ConfigTree::parse_str(r#"<config><element tag="a" recursive="maybe"/></config>"#)
            .unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_repeated_element_merges() {
        let tree = ConfigTree::parse_str(
            r#"<config>
                 <element tag="a" new="a"><attribute name="x" path="x"/></element>
                 <element tag="a"><attribute name="y" path="y"/></element>
               </config>"#,
        )
        .unwrap();
        let a = tree.lookup_subnode(tree.root(), "a").unwrap();
        assert_eq!(tree.node(a).attribs().count(), 2);
        assert_eq!(tree.len(), 2);
    }
}
