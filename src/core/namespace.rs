//! Namespace Resolution
//!
//! Prefix table populated from `xmlns` / `xmlns:prefix` attributes.
//!
//! In [`NamespaceScoping::Global`] mode every declaration stays visible until
//! the end of the document, including outside the declaring element. Existing
//! configurations rely on that. [`NamespaceScoping::Scoped`] gives the usual
//! XML behavior where declarations are dropped when the declaring element
//! closes.

use indexmap::IndexMap;

/// How long a namespace declaration stays visible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamespaceScoping {
    /// One table for the whole document
    #[default]
    Global,
    /// Declarations end with the declaring element
    Scoped,
}

/// Namespace binding (prefix -> URI). The empty prefix is the default namespace.
#[derive(Debug, Clone)]
struct NsBinding {
    prefix: String,
    uri: String,
    depth: usize,
}

/// Prefix → namespace identifier table.
///
/// Global tables keep one entry per prefix; a redeclaration replaces it.
/// Scoped tables keep a stack so inner declarations can shadow outer ones.
#[derive(Debug, Default)]
pub struct NamespaceTable {
    global: IndexMap<String, String>,
    bindings: Vec<NsBinding>,
    depth: usize,
    scoping: NamespaceScoping,
}

impl NamespaceTable {
    /// Create an empty table
    pub fn new(scoping: NamespaceScoping) -> Self {
        NamespaceTable {
            global: IndexMap::new(),
            bindings: Vec::with_capacity(8),
            depth: 0,
            scoping,
        }
    }

    /// Enter an element
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element. Scoped tables drop the bindings declared in it.
    pub fn pop_scope(&mut self) {
        if self.scoping == NamespaceScoping::Scoped {
            while let Some(binding) = self.bindings.last() {
                if binding.depth < self.depth {
                    break;
                }
                self.bindings.pop();
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a prefix at the current depth
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        // xml and xmlns are reserved
        if prefix == "xml" || prefix == "xmlns" {
            return;
        }
        match self.scoping {
            NamespaceScoping::Global => {
                self.global.insert(prefix.to_string(), uri.to_string());
            }
            NamespaceScoping::Scoped => self.bindings.push(NsBinding {
                prefix: prefix.to_string(),
                uri: uri.to_string(),
                depth: self.depth,
            }),
        }
    }

    /// Declare the default namespace
    pub fn declare_default(&mut self, uri: &str) {
        self.declare("", uri);
    }

    /// Resolve a prefix, most recent declaration first
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        match self.scoping {
            NamespaceScoping::Global => self.global.get(prefix).map(String::as_str),
            NamespaceScoping::Scoped => self
                .bindings
                .iter()
                .rev()
                .find(|b| b.prefix == prefix)
                .map(|b| b.uri.as_str()),
        }
    }

    /// Number of bindings held, shadowed ones included
    pub fn len(&self) -> usize {
        self.global.len() + self.bindings.len()
    }

    /// True if nothing has been declared
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the default namespace. An empty `xmlns=""` undeclares it.
    pub fn resolve_default(&self) -> Option<&str> {
        self.resolve("").filter(|uri| !uri.is_empty())
    }

    /// Qualify `prefix:local` as `{uri}:{local}` if the prefix is declared
    pub fn qualify(&self, prefix: &str, local: &str) -> Option<String> {
        self.resolve(prefix).map(|uri| format!("{uri}:{local}"))
    }
}
