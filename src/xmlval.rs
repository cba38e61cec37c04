//! Namespaced value trees for RPC parameter construction.
//!
//! This is the engine-side interface to the external value-tree builder:
//! a deliberately small tree of named, namespaced nodes that the transport
//! serializes into the `<rpc>` payload. Only the shapes needed by the lock
//! PDUs are supported: structural containers, empty flag leafs (used for
//! the `<target>` datastore element and `<discard-changes>`), and string
//! leafs.

/// Node content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    /// Container node with ordered children.
    Struct(Vec<XmlValue>),
    /// Empty element, presence-only (e.g. `<running/>`).
    Flag,
    /// Element with string text content.
    Leaf(String),
}

/// A single namespaced node in a value tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlValue {
    /// Local element name.
    pub name: String,
    /// XML namespace URI the element belongs to.
    pub namespace: String,
    /// Children or text payload.
    pub content: XmlContent,
}

impl XmlValue {
    /// Create a structural (container) node.
    pub fn new_struct(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            content: XmlContent::Struct(Vec::new()),
        }
    }

    /// Create an empty presence element.
    pub fn new_flag(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            content: XmlContent::Flag,
        }
    }

    /// Create a leaf element with string content.
    pub fn new_leaf(
        name: impl Into<String>,
        namespace: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            content: XmlContent::Leaf(value.into()),
        }
    }

    /// Append a child node. Panics in debug builds if this node is not a
    /// container; release builds silently ignore the child.
    pub fn add_child(&mut self, child: XmlValue) {
        match &mut self.content {
            XmlContent::Struct(children) => children.push(child),
            _ => debug_assert!(false, "add_child on a non-struct node"),
        }
    }

    /// Find a direct child by local name.
    pub fn find_child(&self, name: &str) -> Option<&XmlValue> {
        match &self.content {
            XmlContent::Struct(children) => children.iter().find(|c| c.name == name),
            _ => None,
        }
    }

    /// Render the tree as an XML fragment.
    ///
    /// The default namespace is declared on the root element and on any
    /// child whose namespace differs from its parent's.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, None);
        out
    }

    fn render(&self, out: &mut String, parent_ns: Option<&str>) {
        let declare_ns = parent_ns != Some(self.namespace.as_str());
        out.push('<');
        out.push_str(&self.name);
        if declare_ns {
            out.push_str(" xmlns=\"");
            out.push_str(&self.namespace);
            out.push('"');
        }
        match &self.content {
            XmlContent::Flag => out.push_str("/>"),
            XmlContent::Leaf(text) => {
                out.push('>');
                push_escaped(out, text);
                out.push_str("</");
                out.push_str(&self.name);
                out.push('>');
            }
            XmlContent::Struct(children) => {
                if children.is_empty() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    for child in children {
                        child.render(out, Some(&self.namespace));
                    }
                    out.push_str("</");
                    out.push_str(&self.name);
                    out.push('>');
                }
            }
        }
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
