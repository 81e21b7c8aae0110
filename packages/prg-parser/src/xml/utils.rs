//! Helpers for navigating captured element subtrees.

use super::tree::{Element, Node};
use crate::config::fix_typo;

/// Get the tag name without namespace prefix, with the known typo corrected.
///
/// # Examples
/// ```
/// use prg_parser::xml::{get_tag_name, Element, QualifiedName};
///
/// let el = Element::new(QualifiedName::local("jednostkaAdmnistracyjna"));
/// assert_eq!(get_tag_name(&el), "jednostkaAdministracyjna");
/// ```
#[must_use]
pub fn get_tag_name(element: &Element) -> &str {
    fix_typo(&element.name.local)
}

/// Iterate over element children, skipping text.
pub fn element_children(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|node| match node {
        Node::Element(child) => Some(child),
        Node::Text(_) => None,
    })
}

/// First element child, if any.
#[must_use]
pub fn first_element_child(element: &Element) -> Option<&Element> {
    element_children(element).next()
}

/// Check whether an element has any element children.
#[must_use]
pub fn has_element_children(element: &Element) -> bool {
    first_element_child(element).is_some()
}

/// Get the element's own text, or `None` when it has none.
///
/// Text is returned verbatim; whitespace-only text counts as no text.
#[must_use]
pub fn get_text(element: &Element) -> Option<String> {
    let text: String = element
        .children
        .iter()
        .filter_map(|node| match node {
            Node::Text(t) => Some(t.as_str()),
            Node::Element(_) => None,
        })
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Get an attribute value by namespace URI and local name.
#[must_use]
pub fn get_attribute<'a>(element: &'a Element, namespace: &str, local: &str) -> Option<&'a str> {
    element
        .attributes
        .iter()
        .find(|attr| attr.name.is(namespace, local))
        .map(|attr| attr.value.as_str())
}
