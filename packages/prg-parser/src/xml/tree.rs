//! Owned element subtrees captured from the event stream.
//!
//! Only the subtree of the entity currently being read is ever materialized;
//! everything outside it is consumed event by event and discarded.

use quick_xml::events::BytesStart;
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::NsReader;

use crate::error::{PrgError, Result};

/// A namespace-resolved element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Resolved namespace URI, if the name is bound to one.
    pub namespace: Option<String>,
    /// Prefix as written in the source.
    pub prefix: Option<String>,
    /// Local name without prefix.
    pub local: String,
}

impl QualifiedName {
    /// A name without namespace or prefix.
    #[must_use]
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            prefix: None,
            local: local.into(),
        }
    }

    /// Clark notation: `{uri}local`, or just `local` when unbound.
    #[must_use]
    pub fn clark(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{ns}}}{}", self.local),
            None => self.local.clone(),
        }
    }

    /// Name as written in markup: `prefix:local` or `local`.
    #[must_use]
    pub fn prefixed(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }

    /// Check namespace URI and local name.
    #[must_use]
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local == local
    }
}

/// An attribute with its resolved name and unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}

/// A child node: either an element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An owned element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QualifiedName,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    #[must_use]
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append text, merging with a preceding text node.
    pub fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// Drop whitespace-only text nodes (indentation between elements).
    fn drop_blank_text(&mut self) {
        self.children
            .retain(|node| !matches!(node, Node::Text(t) if t.trim().is_empty()));
    }

    /// Number of elements in this subtree, including itself.
    #[must_use]
    pub fn element_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|node| match node {
                Node::Element(el) => el.element_count(),
                Node::Text(_) => 0,
            })
            .sum::<usize>()
    }
}

/// Convert a start tag into an owned element, resolving every name.
///
/// Namespace declarations (`xmlns`, `xmlns:*`) are not kept as attributes;
/// their effect is captured in the resolved names.
///
/// # Errors
/// Returns an error for malformed attributes or undecodable values.
pub fn element_from_start<R>(reader: &NsReader<R>, start: &BytesStart<'_>) -> Result<Element> {
    let (ns, local) = reader.resolve_element(start.name());
    let mut element = Element::new(qualified(ns, start.name(), local.as_ref()));

    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        element.attributes.push(Attribute {
            name: qualified(ns, attr.key, local.as_ref()),
            value: attr.unescape_value()?.into_owned(),
        });
    }

    Ok(element)
}

fn qualified(ns: ResolveResult<'_>, raw: QName<'_>, local: &[u8]) -> QualifiedName {
    let (namespace, prefix) = match ns {
        ResolveResult::Bound(Namespace(uri)) => (
            Some(String::from_utf8_lossy(uri).into_owned()),
            raw.prefix()
                .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
        ),
        // Unbound or undeclared prefixes carry no namespace.
        ResolveResult::Unbound | ResolveResult::Unknown(_) => (None, None),
    };

    QualifiedName {
        namespace,
        prefix,
        local: String::from_utf8_lossy(local).into_owned(),
    }
}

/// Incrementally assembles one subtree from start/text/end events.
#[derive(Debug)]
pub struct SubtreeBuilder {
    stack: Vec<Element>,
    nodes: usize,
}

impl SubtreeBuilder {
    /// Start a subtree at `root`.
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self {
            stack: vec![root],
            nodes: 1,
        }
    }

    /// Number of elements materialized so far.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Depth of the currently open chain inside the subtree.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open a child element.
    pub fn open(&mut self, element: Element) {
        self.nodes += 1;
        self.stack.push(element);
    }

    /// Append a self-closing child element.
    ///
    /// # Errors
    /// Returns `PrgError::Invariant` if the subtree is already closed.
    pub fn empty(&mut self, element: Element) -> Result<()> {
        self.nodes += 1;
        self.current_mut("#empty")?
            .children
            .push(Node::Element(element));
        Ok(())
    }

    /// Append text to the innermost open element.
    ///
    /// # Errors
    /// Returns `PrgError::Invariant` if the subtree is already closed.
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.current_mut("#text")?.push_text(text);
        Ok(())
    }

    /// Close the innermost open element.
    ///
    /// Returns the finished root once the root itself is closed.
    ///
    /// # Errors
    /// Returns `PrgError::Invariant` on an end tag with nothing open.
    pub fn close(&mut self) -> Result<Option<Element>> {
        let mut element = self.stack.pop().ok_or_else(|| PrgError::Invariant {
            element: "#end".to_string(),
            reason: "end tag without an open element".to_string(),
        })?;
        element.drop_blank_text();

        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(Node::Element(element));
                Ok(None)
            }
            None => Ok(Some(element)),
        }
    }

    /// Close the innermost open element and take it out of the subtree.
    ///
    /// An empty element of the same name is left in its place, so the
    /// parent keeps its shape but none of the detached content.
    ///
    /// # Errors
    /// Returns `PrgError::Invariant` when only the root is open.
    pub fn detach(&mut self) -> Result<Element> {
        if self.stack.len() < 2 {
            return Err(PrgError::Invariant {
                element: "#detach".to_string(),
                reason: "the subtree root cannot be detached".to_string(),
            });
        }
        let mut element = self.stack.pop().ok_or_else(|| PrgError::Invariant {
            element: "#detach".to_string(),
            reason: "no open element".to_string(),
        })?;
        element.drop_blank_text();

        let placeholder = Element::new(element.name.clone());
        self.current_mut("#detach")?
            .children
            .push(Node::Element(placeholder));
        self.nodes = self.nodes.saturating_sub(element.element_count() - 1);
        Ok(element)
    }

    fn current_mut(&mut self, what: &str) -> Result<&mut Element> {
        self.stack.last_mut().ok_or_else(|| PrgError::Invariant {
            element: what.to_string(),
            reason: "content after the subtree was closed".to_string(),
        })
    }
}
