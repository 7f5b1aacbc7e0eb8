//! Configuration-driven document reader
//!
//! Recursive descent over the element structure. The grammar of what gets
//! bound comes from a [`ConfigTree`]: each start tag is matched against the
//! current config node's children, and the match decides which
//! [`Target`] calls are made. Elements with no match are still parsed in
//! full so the tokenizer never loses its place.

use super::buffered::{BufferedSource, DEFAULT_BUFFER_SIZE};
use crate::bind::Target;
use crate::config::{ConfigTree, NodeId};
use crate::core::entities::decode_text;
use crate::core::namespace::{NamespaceScoping, NamespaceTable};
use crate::core::scanner::split_prefix;
use crate::error::{Error, Result};
use std::io::Read;
use tracing::{debug, trace};

/// Bytes allowed in tag and attribute names after the first character
const NAME_EXTRA: &[u8] = b"-.:";

/// UTF-8 byte order mark
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reader settings
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    /// Initial source buffer size in bytes
    pub buffer_capacity: usize,
    /// Deepest element nesting accepted before failing
    pub max_depth: usize,
    /// Lifetime of namespace declarations
    pub namespace_scoping: NamespaceScoping,
    /// Trim surrounding whitespace from bound text content
    pub trim_text: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_SIZE,
            max_depth: 256,
            namespace_scoping: NamespaceScoping::Global,
            trim_text: true,
        }
    }
}

impl ReaderOptions {
    /// Creates options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial buffer size
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Sets the nesting limit
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets how namespace declarations are scoped
    pub fn namespace_scoping(mut self, scoping: NamespaceScoping) -> Self {
        self.namespace_scoping = scoping;
        self
    }

    /// Sets whether bound text is trimmed
    pub fn trim_text(mut self, trim: bool) -> Self {
        self.trim_text = trim;
        self
    }
}

/// Streaming reader binding one document through a [`ConfigTree`]
pub struct DocumentReader<'c, R: Read> {
    source: BufferedSource<R>,
    config: &'c ConfigTree,
    namespaces: NamespaceTable,
    options: ReaderOptions,
    /// Attributes of the start tag being processed
    attrs: Vec<(String, String)>,
}

impl<'c, R: Read> DocumentReader<'c, R> {
    /// Create a reader with default options
    pub fn new(reader: R, config: &'c ConfigTree) -> Self {
        Self::with_options(reader, config, ReaderOptions::default())
    }

    /// Create a reader with explicit options
    pub fn with_options(reader: R, config: &'c ConfigTree, options: ReaderOptions) -> Self {
        DocumentReader {
            source: BufferedSource::with_capacity(reader, options.buffer_capacity),
            config,
            namespaces: NamespaceTable::new(options.namespace_scoping),
            options,
            attrs: Vec::with_capacity(8),
        }
    }

    /// Read the whole document, binding into `root`.
    ///
    /// On error the target may be partially populated and should be discarded.
    pub fn read(mut self, root: &mut dyn Target) -> Result<()> {
        debug!(config_nodes = self.config.len(), "reading document");
        self.parse_prolog()?;

        if !self.source.scan_literal(b"<")? {
            return Err(self.error("expected document element"));
        }
        let config = self.config;
        self.parse_element(Some(config.root()), Some(root), 1)?;

        self.skip_misc()?;
        if !self.source.is_eof()? {
            return Err(self.error("unexpected content after document element"));
        }
        debug!(bytes = self.source.position(), "document complete");
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::structural(message, self.source.line(), self.source.position())
    }

    fn utf8(&self, bytes: Vec<u8>) -> Result<String> {
        String::from_utf8(bytes).map_err(|_| self.error("invalid UTF-8"))
    }

    /// Optional BOM, optional `<?...?>` declaration, whitespace and comments
    fn parse_prolog(&mut self) -> Result<()> {
        self.source.scan_literal(BOM)?;
        self.source.skip_whitespace()?;
        if self.source.scan_literal(b"<?")? {
            if self.source.seek_to(b"?>")?.is_none() {
                return Err(self.error("unterminated declaration"));
            }
        }
        self.skip_misc()
    }

    /// Whitespace and comments between top-level constructs
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.source.skip_whitespace()?;
            if self.source.scan_literal(b"<!--")? {
                self.skip_comment()?;
            } else {
                break;
            }
        }
        if self.source.lookahead_is(b"<!")? || self.source.lookahead_is(b"<?")? {
            return Err(self.error("unsupported markup declaration"));
        }
        Ok(())
    }

    /// Called after `<!--`
    fn skip_comment(&mut self) -> Result<()> {
        match self.source.seek_to(b"-->")? {
            Some(_) => Ok(()),
            None => Err(self.error("unterminated comment")),
        }
    }

    /// Parse one element; the opening `<` has been consumed.
    fn parse_element(
        &mut self,
        cfg: Option<NodeId>,
        target: Option<&mut (dyn Target + '_)>,
        depth: usize,
    ) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(self.error(format!("nesting exceeds {} levels", self.options.max_depth)));
        }

        let tag = match self.source.scan_identifier(NAME_EXTRA)? {
            Some(bytes) => self.utf8(bytes)?,
            None => return Err(self.error("expected tag name")),
        };
        self.namespaces.push_scope();
        let self_closing = self.parse_attributes(&tag)?;

        let config = self.config;
        let (resolved, candidates) = self.element_names(&tag);
        let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
        let node = cfg.and_then(|parent| config.lookup_subnode_in(parent, &candidates));

        let mut target: Option<&mut dyn Target> = match (node, target) {
            (Some(id), Some(parent)) => match config.node(id).new_node_path() {
                Some(path) => parent.new_child(path, &resolved)?,
                None => Some(parent),
            },
            (None, Some(_)) => {
                trace!(tag = %tag, "no binding for element");
                None
            }
            (_, None) => None,
        };

        let attrs = std::mem::take(&mut self.attrs);
        if let (Some(id), Some(object)) = (node, target.as_deref_mut()) {
            for (name, value) in &attrs {
                let resolved = self.attribute_name(name);
                match config.lookup_attrib_path(id, &resolved) {
                    Some(path) => object.set_attribute(path, &resolved, value)?,
                    None => trace!(tag = %tag, attribute = %name, "no binding for attribute"),
                }
            }
        }
        self.attrs = attrs;
        self.attrs.clear();

        if !self_closing {
            self.parse_content(&tag, node, target, depth)?;
        }
        self.namespaces.pop_scope();
        Ok(())
    }

    /// Scan `name="value"` pairs up to `>` or `/>`. Namespace declarations
    /// are registered and kept out of the attribute list.
    /// Returns true for a self-closing tag.
    fn parse_attributes(&mut self, tag: &str) -> Result<bool> {
        self.attrs.clear();
        loop {
            self.source.skip_whitespace()?;
            if self.source.scan_literal(b"/>")? {
                return Ok(true);
            }
            if self.source.scan_literal(b">")? {
                return Ok(false);
            }
            if self.source.is_eof()? {
                return Err(self.error(format!("unterminated start tag '<{tag}'")));
            }

            let name = match self.source.scan_identifier(NAME_EXTRA)? {
                Some(bytes) => self.utf8(bytes)?,
                None => return Err(self.error(format!("expected attribute name in '<{tag}'"))),
            };
            self.source.skip_whitespace()?;
            if !self.source.scan_literal(b"=")? {
                return Err(self.error(format!("expected '=' after attribute '{name}'")));
            }
            self.source.skip_whitespace()?;
            let raw = match self.source.scan_quoted(b'"', b'"')? {
                Some(raw) => raw,
                None => match self.source.scan_quoted(b'\'', b'\'')? {
                    Some(raw) => raw,
                    None => {
                        return Err(self.error(format!(
                            "missing or unterminated value for attribute '{name}'"
                        )))
                    }
                },
            };
            let raw = self.utf8(raw)?;
            let value = decode_text(&raw);

            if name == "xmlns" {
                self.namespaces.declare_default(&value);
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                self.namespaces.declare(prefix, &value);
            } else {
                let value = value.into_owned();
                self.attrs.push((name, value));
            }
        }
    }

    /// Name handed to the target plus the names tried for an exact config match.
    ///
    /// A declared prefix qualifies the tag as `{uri}:{local}`; the qualified
    /// name is tried before the verbatim tag. An unprefixed tag under a
    /// default namespace tries `{uri}:{tag}` first, then the bare tag.
    fn element_names(&self, tag: &str) -> (String, Vec<String>) {
        match split_prefix(tag) {
            (Some(prefix), local) => match self.namespaces.qualify(prefix, local) {
                Some(qualified) => (qualified.clone(), vec![qualified, tag.to_string()]),
                None => {
                    debug!(tag, "undeclared namespace prefix");
                    (tag.to_string(), vec![tag.to_string()])
                }
            },
            (None, _) => match self.namespaces.resolve_default() {
                Some(uri) => (tag.to_string(), vec![format!("{uri}:{tag}"), tag.to_string()]),
                None => (tag.to_string(), vec![tag.to_string()]),
            },
        }
    }

    /// Attribute name qualified as `{uri}:{local}` if its prefix is declared.
    /// Unprefixed attributes are never in a namespace.
    fn attribute_name(&self, name: &str) -> String {
        match split_prefix(name) {
            (Some(prefix), local) => self
                .namespaces
                .qualify(prefix, local)
                .unwrap_or_else(|| name.to_string()),
            (None, _) => name.to_string(),
        }
    }

    /// Text and child elements up to the matching `</tag>`.
    ///
    /// Text is held back until the markup after it has been checked, so a
    /// bad closing tag never produces a content binding. Text split by a
    /// comment is joined.
    fn parse_content(
        &mut self,
        tag: &str,
        node: Option<NodeId>,
        mut target: Option<&mut (dyn Target + '_)>,
        depth: usize,
    ) -> Result<()> {
        let mut pending: Vec<u8> = Vec::new();
        loop {
            pending.extend(self.source.take_until(b'<')?);
            if self.source.is_eof()? {
                return Err(self.error(format!("missing closing tag '</{tag}>'")));
            }

            if self.source.scan_literal(b"</")? {
                let close = match self.source.scan_identifier(NAME_EXTRA)? {
                    Some(bytes) => self.utf8(bytes)?,
                    None => return Err(self.error("expected closing tag name")),
                };
                if close != tag {
                    return Err(self.error(format!(
                        "mismatched closing tag: expected '</{tag}>', found '</{close}>'"
                    )));
                }
                self.source.skip_whitespace()?;
                if !self.source.scan_literal(b">")? {
                    return Err(self.error(format!("expected '>' after '</{tag}'")));
                }
                return self.flush_text(&mut pending, node, target.as_deref_mut());
            }

            if self.source.scan_literal(b"<!--")? {
                self.skip_comment()?;
                continue;
            }
            if self.source.lookahead_is(b"<!")? || self.source.lookahead_is(b"<?")? {
                return Err(self.error("unsupported markup in content"));
            }

            self.flush_text(&mut pending, node, target.as_deref_mut())?;
            self.source.scan_literal(b"<")?;
            self.parse_element(node, target.as_deref_mut(), depth + 1)?;
        }
    }

    /// Bind a completed text run if the element has a content path
    fn flush_text(
        &mut self,
        pending: &mut Vec<u8>,
        node: Option<NodeId>,
        target: Option<&mut (dyn Target + '_)>,
    ) -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let raw = self.utf8(std::mem::take(pending))?;
        if raw.trim().is_empty() {
            return Ok(());
        }

        let config = self.config;
        let path = node.and_then(|id| config.node(id).content_path());
        if let (Some(path), Some(object)) = (path, target) {
            let decoded = decode_text(&raw);
            let text = if self.options.trim_text {
                decoded.trim()
            } else {
                decoded.as_ref()
            };
            object.set_content(path, text)?;
        }
        Ok(())
    }
}

/// Read a document from `reader`, binding into `root` with default options
pub fn read_document<R: Read>(reader: R, config: &ConfigTree, root: &mut dyn Target) -> Result<()> {
    DocumentReader::new(reader, config).read(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{BindingPath, CountingTarget};
    use crate::reader::buffered::tests::ChunkedReader;
    use pretty_assertions::assert_eq;

    /// Target that logs every call into a shared list
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Target for Recorder {
        fn new_child(&mut self, path: &BindingPath, tag: &str) -> Result<Option<&mut dyn Target>> {
            self.calls.push(format!("new {path} {tag}"));
            Ok(Some(self))
        }

        fn set_attribute(&mut self, path: &BindingPath, name: &str, value: &str) -> Result<()> {
            self.calls.push(format!("attr {path} {name}={value}"));
            Ok(())
        }

        fn set_content(&mut self, path: &BindingPath, value: &str) -> Result<()> {
            self.calls.push(format!("text {path} {value}"));
            Ok(())
        }
    }

    fn library_config() -> ConfigTree {
        let mut tree = ConfigTree::new();
        let lib = tree.add_subnode(tree.root(), "library");
        tree.set_new_node_path(lib, "lib");
        tree.add_attrib(lib, "name", "lib-name");
        let book = tree.add_subnode(lib, "book");
        tree.set_new_node_path(book, "book");
        tree.add_attrib(book, "id", "book-id");
        tree.set_content_path(book, "title");
        tree
    }

    fn record(doc: &str, config: &ConfigTree) -> Result<Vec<String>> {
        let mut recorder = Recorder::default();
        read_document(doc.as_bytes(), config, &mut recorder)?;
        Ok(recorder.calls)
    }

    #[test]
    fn test_document_order() {
        let doc = r#"<?xml version="1.0"?>
            <library name="city">
              <book id="1">Dune</book>
              <book id="2">Emma</book>
            </library>"#;
        assert_eq!(
            record(doc, &library_config()).unwrap(),
            vec![
                "new lib library",
                "attr lib-name name=city",
                "new book book",
                "attr book-id id=1",
                "text title Dune",
                "new book book",
                "attr book-id id=2",
                "text title Emma",
            ]
        );
    }

    #[test]
    fn test_unbound_subtree_is_skipped() {
        let doc = r#"<library><shelf a="1"><book id="9">x</book></shelf><book id="3"/></library>"#;
        assert_eq!(
            record(doc, &library_config()).unwrap(),
            vec!["new lib library", "new book book", "attr book-id id=3"]
        );
    }

    #[test]
    fn test_single_quotes_and_entities() {
        let doc = "<library name='a &amp; b'><book id=\"1\">a &lt;b&gt; c &amp; d &foo;</book></library>";
        let calls = record(doc, &library_config()).unwrap();
        assert_eq!(calls[1], "attr lib-name name=a & b");
        assert_eq!(calls[4], "text title a <b> c & d &foo;");
    }

    #[test]
    fn test_comments_are_skipped() {
        let doc = "<!-- head --><library><!-- x --><book id=\"1\">Du<!-- y -->ne</book></library><!-- tail -->";
        let calls = record(doc, &library_config()).unwrap();
        assert_eq!(calls.last().map(String::as_str), Some("text title Dune"));
    }

    #[test]
    fn test_namespace_qualified_lookup() {
        let mut tree = ConfigTree::new();
        let x = tree.add_subnode(tree.root(), "x");
        tree.set_new_node_path(x, "x");
        let plain = tree.add_subnode(x, "y");
        tree.set_new_node_path(plain, "plain-y");
        let qualified = tree.add_subnode(x, "urn:p:y");
        tree.set_new_node_path(qualified, "qualified-y");
        tree.add_attrib(qualified, "urn:p:a", "pa");

        let doc = r#"<x xmlns:p="urn:p"><p:y p:a="1" b="2"/><y/></x>"#;
        assert_eq!(
            record(doc, &tree).unwrap(),
            vec![
                "new x x",
                "new qualified-y urn:p:y",
                "attr pa urn:p:a=1",
                "new plain-y y",
            ]
        );
    }

    #[test]
    fn test_prefixed_tag_falls_back_to_verbatim() {
        let mut tree = ConfigTree::new();
        let y = tree.add_subnode(tree.root(), "p:y");
        tree.set_new_node_path(y, "y");

        let doc = r#"<p:y xmlns:p="urn:p"/>"#;
        assert_eq!(record(doc, &tree).unwrap(), vec!["new y urn:p:y"]);
    }

    fn sibling_prefix_config() -> ConfigTree {
        let mut tree = ConfigTree::new();
        let r = tree.add_subnode(tree.root(), "r");
        tree.set_new_node_path(r, "r");
        let qualified = tree.add_subnode(r, "urn:p:y");
        tree.set_new_node_path(qualified, "qualified-y");
        let verbatim = tree.add_subnode(r, "p:y");
        tree.set_new_node_path(verbatim, "verbatim-y");
        tree
    }

    const SIBLING_PREFIX: &str = r#"<r><a xmlns:p="urn:p"/><p:y/></r>"#;

    #[test]
    fn test_global_prefix_reaches_later_sibling() {
        assert_eq!(
            record(SIBLING_PREFIX, &sibling_prefix_config()).unwrap(),
            vec!["new r r", "new qualified-y urn:p:y"]
        );
    }

    #[test]
    fn test_scoped_prefix_ends_with_declaring_element() {
        let config = sibling_prefix_config();
        let mut recorder = Recorder::default();
        let options = ReaderOptions::new().namespace_scoping(NamespaceScoping::Scoped);
        DocumentReader::with_options(SIBLING_PREFIX.as_bytes(), &config, options)
            .read(&mut recorder)
            .unwrap();
        assert_eq!(recorder.calls, vec!["new r r", "new verbatim-y p:y"]);
    }

    #[test]
    fn test_default_namespace_prefers_qualified() {
        let mut tree = ConfigTree::new();
        let root = tree.add_subnode(tree.root(), "urn:d:doc");
        tree.set_new_node_path(root, "qualified");
        let plain = tree.add_subnode(tree.root(), "doc");
        tree.set_new_node_path(plain, "plain");

        assert_eq!(record(r#"<doc xmlns="urn:d"/>"#, &tree).unwrap(), vec!["new qualified doc"]);
        assert_eq!(record("<doc/>", &tree).unwrap(), vec!["new plain doc"]);
    }

    #[test]
    fn test_transparent_node_binds_into_parent() {
        let mut tree = ConfigTree::new();
        let lib = tree.add_subnode(tree.root(), "library");
        tree.set_new_node_path(lib, "lib");
        let meta = tree.add_subnode(lib, "meta");
        tree.add_attrib(meta, "owner", "owner");
        tree.set_content_path(meta, "note");

        let doc = r#"<library><meta owner="ann">hi</meta></library>"#;
        assert_eq!(
            record(doc, &tree).unwrap(),
            vec!["new lib library", "attr owner owner=ann", "text note hi"]
        );
    }

    #[test]
    fn test_mismatched_close_tag() {
        let err = record("<library><book>text</library>", &library_config()).unwrap_err();
        assert!(err.is_structural());
        assert!(err.to_string().contains("expected '</book>', found '</library>'"));
    }

    #[test]
    fn test_mismatch_binds_no_content() {
        let mut recorder = Recorder::default();
        let result = read_document(
            "<library><book id=\"1\">text</library>".as_bytes(),
            &library_config(),
            &mut recorder,
        );
        assert!(result.is_err());
        assert!(!recorder.calls.iter().any(|c| c.starts_with("text")));
    }

    #[test]
    fn test_missing_close_tag() {
        let err = record("<library><book id=\"1\">", &library_config()).unwrap_err();
        assert!(err.to_string().contains("missing closing tag"));
    }

    #[test]
    fn test_unterminated_attribute() {
        let err = record("<library name=\"oops></library>", &library_config()).unwrap_err();
        assert!(err.to_string().contains("attribute 'name'"));
    }

    #[test]
    fn test_missing_root() {
        assert!(record("   ", &library_config()).unwrap_err().is_structural());
        assert!(record("<?xml version=\"1.0\"", &library_config()).unwrap_err().is_structural());
    }

    #[test]
    fn test_trailing_content_rejected() {
        let err = record("<library/><library/>", &library_config()).unwrap_err();
        assert!(err.to_string().contains("after document element"));
    }

    #[test]
    fn test_depth_guard() {
        let doc = "<a>".repeat(10) + &"</a>".repeat(10);
        let config = ConfigTree::new();
        let mut counter = CountingTarget::default();
        let options = ReaderOptions::new().max_depth(5);
        let err = DocumentReader::with_options(doc.as_bytes(), &config, options)
            .read(&mut counter)
            .unwrap_err();
        assert!(err.to_string().contains("nesting exceeds 5"));
    }

    #[test]
    fn test_untrimmed_text() {
        let mut recorder = Recorder::default();
        let options = ReaderOptions::new().trim_text(false);
        DocumentReader::with_options(
            "<library><book> spaced </book></library>".as_bytes(),
            &library_config(),
            options,
        )
        .read(&mut recorder)
        .unwrap();
        assert_eq!(recorder.calls.last().map(String::as_str), Some("text title  spaced "));
    }

    #[test]
    fn test_one_byte_chunks_match_whole_document() {
        let doc = r#"<?xml version="1.0"?><library name="n"><book id="1">A &amp; B</book><x><book/></x></library>"#;
        let config = library_config();
        let whole = record(doc, &config).unwrap();

        let mut recorder = Recorder::default();
        let options = ReaderOptions::new().buffer_capacity(1);
        DocumentReader::with_options(ChunkedReader::new(doc.as_bytes(), 1), &config, options)
            .read(&mut recorder)
            .unwrap();
        assert_eq!(recorder.calls, whole);
    }
}
