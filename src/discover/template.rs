//! Configuration template writer
//!
//! Turns a [`DiscoveredNode`] tree into a configuration document with
//! placeholder paths, ready to be edited into real bindings.

use super::builder::DiscoveredNode;
use crate::core::entities::quote_attribute;
use crate::error::{Error, Result};
use std::io;

/// Template settings
#[derive(Debug, Clone, Copy)]
pub struct TemplateOptions {
    /// Deepest nesting written before failing
    pub max_depth: usize,
    /// Spaces per indentation level
    pub indent: usize,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            indent: 2,
        }
    }
}

/// Placeholder path for creating the object of `tag`
pub fn new_placeholder(tag: &str) -> String {
    format!("add:{tag}")
}

/// Placeholder path for reading attribute `name`
pub fn attribute_placeholder(name: &str) -> String {
    format!("set:{name}")
}

/// Placeholder path for the text of `tag`
pub fn content_placeholder(tag: &str) -> String {
    format!("text:{tag}")
}

/// Writes discovered structure as a configuration document
#[derive(Debug, Default)]
pub struct TemplateWriter {
    options: TemplateOptions,
    output: String,
}

impl TemplateWriter {
    /// Create a writer with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with explicit options
    pub fn with_options(options: TemplateOptions) -> Self {
        TemplateWriter {
            options,
            output: String::new(),
        }
    }

    /// Render the tree under `root` (a node from [`DiscoveredNode::root`]
    /// or any other node whose children become top-level elements)
    pub fn render(mut self, root: &DiscoveredNode) -> Result<String> {
        self.output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<config>\n");
        for child in root.children() {
            self.write_element(child, 1)?;
        }
        self.output.push_str("</config>\n");
        Ok(self.output)
    }

    /// Render and write to `out`
    pub fn write_to<W: io::Write>(self, root: &DiscoveredNode, mut out: W) -> Result<()> {
        let text = self.render(root)?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn write_element(&mut self, node: &DiscoveredNode, level: usize) -> Result<()> {
        if level > self.options.max_depth {
            return Err(Error::TemplateDepth {
                depth: self.options.max_depth,
            });
        }
        let pad = " ".repeat(level * self.options.indent);

        self.output.push_str(&format!(
            "{pad}<element tag={} new={}",
            quote_attribute(node.tag()),
            quote_attribute(&new_placeholder(node.tag()))
        ));
        if node.content_seen() {
            self.output.push_str(&format!(
                " content={}",
                quote_attribute(&content_placeholder(node.tag()))
            ));
        }

        if node.attribute_names().next().is_none() && node.children().next().is_none() {
            self.output.push_str("/>\n");
            return Ok(());
        }
        self.output.push_str(">\n");

        let inner = " ".repeat((level + 1) * self.options.indent);
        for name in node.attribute_names() {
            self.output.push_str(&format!(
                "{inner}<attribute name={} path={}/>\n",
                quote_attribute(name),
                quote_attribute(&attribute_placeholder(name))
            ));
        }
        for child in node.children() {
            self.write_element(child, level + 1)?;
        }
        self.output.push_str(&format!("{pad}</element>\n"));
        Ok(())
    }
}

/// Render `root` as a configuration template with default options
pub fn write_template(root: &DiscoveredNode) -> Result<String> {
    TemplateWriter::new().render(root)
}
