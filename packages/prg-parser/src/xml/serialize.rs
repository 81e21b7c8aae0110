//! Serialization of captured subtrees back to XML text.
//!
//! Geometry is stored verbatim for a downstream GML parser, so the fragment
//! must be self-contained: every namespace a name relies on is declared
//! within the fragment itself.

use std::fmt::Write as _;

use quick_xml::escape::{escape, partial_escape};

use super::tree::{Element, Node, QualifiedName};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// An in-scope prefix binding; `None` is the default namespace.
type Binding = (Option<String>, String);

/// Serialize `child` inside a fresh `<wrapper>` element declaring one prefix.
///
/// # Examples
/// ```
/// use prg_parser::xml::{serialize_wrapped, Element, QualifiedName};
///
/// let point = Element::new(QualifiedName {
///     namespace: Some("http://www.opengis.net/gml/3.2".to_string()),
///     prefix: Some("gml".to_string()),
///     local: "Point".to_string(),
/// });
/// assert_eq!(
///     serialize_wrapped("geometry", &point, "gml", "http://www.opengis.net/gml/3.2"),
///     r#"<geometry xmlns:gml="http://www.opengis.net/gml/3.2"><gml:Point/></geometry>"#
/// );
/// ```
#[must_use]
pub fn serialize_wrapped(wrapper: &str, child: &Element, prefix: &str, namespace: &str) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<{wrapper} xmlns:{prefix}=\"{}\">",
        escape(namespace)
    );

    let mut scope: Vec<Binding> = vec![
        (Some("xml".to_string()), XML_NAMESPACE.to_string()),
        (Some(prefix.to_string()), namespace.to_string()),
    ];
    write_element(&mut out, child, &mut scope);

    let _ = write!(out, "</{wrapper}>");
    out
}

fn write_element(out: &mut String, element: &Element, scope: &mut Vec<Binding>) {
    let mark = scope.len();
    let mut declarations: Vec<Binding> = Vec::new();

    bind(&element.name, scope, &mut declarations);
    for attr in &element.attributes {
        // Unprefixed attributes are never in a namespace.
        if attr.name.prefix.is_some() {
            bind(&attr.name, scope, &mut declarations);
        }
    }

    let tag = element.name.prefixed();
    out.push('<');
    out.push_str(&tag);
    for (prefix, uri) in &declarations {
        match prefix {
            Some(p) => {
                let _ = write!(out, " xmlns:{p}=\"{}\"", escape(uri.as_str()));
            }
            None => {
                let _ = write!(out, " xmlns=\"{}\"", escape(uri.as_str()));
            }
        }
    }
    for attr in &element.attributes {
        let _ = write!(
            out,
            " {}=\"{}\"",
            attr.name.prefixed(),
            escape(attr.value.as_str())
        );
    }

    if element.children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        for node in &element.children {
            match node {
                Node::Element(child) => write_element(out, child, scope),
                Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
            }
        }
        let _ = write!(out, "</{tag}>");
    }

    scope.truncate(mark);
}

/// Push a declaration when the name's prefix is not bound to its namespace.
fn bind(name: &QualifiedName, scope: &mut Vec<Binding>, declarations: &mut Vec<Binding>) {
    let wanted = name.namespace.as_deref().unwrap_or("");
    let current = scope
        .iter()
        .rev()
        .find(|(p, _)| *p == name.prefix)
        .map_or("", |(_, uri)| uri.as_str());

    if current != wanted {
        let binding = (name.prefix.clone(), wanted.to_string());
        scope.push(binding.clone());
        declarations.push(binding);
    }
}
