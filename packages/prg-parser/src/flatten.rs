//! Flattening of one entity subtree into a single record.
//!
//! Nesting depth is discarded: every descendant contributes to the same
//! record. Leaves named in the field schema become fields, geometry
//! elements are kept as serialized GML, and everything else is descended
//! into transparently.

use crate::config::{is_geometry_element, GEOMETRY_FIELD, GMLID_FIELD, NS_XLINK};
use crate::error::{PrgError, Result};
use crate::fields::FieldSchema;
use crate::namespaces::NamespaceTable;
use crate::registry::{EntityKind, EntityRegistry};
use crate::types::Record;
use crate::xml::{
    first_element_child, get_attribute, get_tag_name, get_text, has_element_children,
    serialize_wrapped, Element, Node,
};

/// Prefix declared on serialized geometry fragments.
const GML_PREFIX: &str = "gml";

/// Turns entity subtrees into records for one parse run.
#[derive(Debug, Clone, Copy)]
pub struct Flattener<'a> {
    namespaces: &'a NamespaceTable,
    registry: &'a EntityRegistry,
    schema: &'a FieldSchema,
}

impl<'a> Flattener<'a> {
    /// Create a flattener over a resolved namespace table, registry and schema.
    #[must_use]
    pub fn new(
        namespaces: &'a NamespaceTable,
        registry: &'a EntityRegistry,
        schema: &'a FieldSchema,
    ) -> Self {
        Self {
            namespaces,
            registry,
            schema,
        }
    }

    /// Flatten an entity element into its kind and record.
    ///
    /// # Errors
    /// Returns `PrgError::Invariant` if `element` is not one of the
    /// registry's entity tags.
    pub fn parse_element(&self, element: &Element) -> Result<(EntityKind, Record)> {
        let kind = self
            .registry
            .kind_of(&element.name.clark())
            .ok_or_else(|| PrgError::Invariant {
                element: element.name.clark(),
                reason: "not a registered entity element".to_string(),
            })?;

        Ok((kind, self.flatten(kind, element)))
    }

    /// Flatten an element as the given kind, without checking its tag.
    #[must_use]
    pub fn flatten(&self, kind: EntityKind, element: &Element) -> Record {
        let mut record = Record::new();
        record.insert(
            GMLID_FIELD,
            get_attribute(element, &self.namespaces.gml, "id").map(str::to_string),
        );

        // Depth-first, document order, without recursion.
        let mut stack: Vec<std::slice::Iter<'_, Node>> = vec![element.children.iter()];
        while let Some(siblings) = stack.last_mut() {
            let Some(node) = siblings.next() else {
                stack.pop();
                continue;
            };
            let Node::Element(child) = node else {
                continue;
            };

            let name = get_tag_name(child);
            if is_geometry_element(name) {
                record.insert(GEOMETRY_FIELD, self.geometry(child));
            } else if !has_element_children(child) && self.schema.contains(kind, name) {
                self.store_leaf(kind, &mut record, name, leaf_value(child));
            } else {
                stack.push(child.children.iter());
            }
        }

        tracing::trace!(kind = %kind, fields = record.len(), "Flattened element");
        record
    }

    /// Store a leaf value, numbering repeats of the same field.
    fn store_leaf(&self, kind: EntityKind, record: &mut Record, name: &str, value: Option<String>) {
        if !record.contains(name) {
            record.insert(name, value);
            return;
        }

        let variant = record.next_variant(name);
        if self.schema.contains(kind, &variant) {
            record.insert(variant, value);
        } else {
            tracing::trace!(kind = %kind, field = %variant, "Dropping repeat outside schema");
        }
    }

    /// Serialize the first child of a geometry element, or `None` if empty.
    fn geometry(&self, element: &Element) -> Option<String> {
        first_element_child(element).map(|geometry| {
            serialize_wrapped(GEOMETRY_FIELD, geometry, GML_PREFIX, &self.namespaces.gml)
        })
    }
}

/// Value of a leaf: its text, else its cross-reference, else `None`.
///
/// Whitespace-only text counts as no text, so `<ulica xlink:href="REF">  </ulica>`
/// yields `"REF"` rather than the blank run.
fn leaf_value(element: &Element) -> Option<String> {
    get_text(element).or_else(|| {
        get_attribute(element, NS_XLINK, "href")
            .filter(|href| !href.is_empty())
            .map(str::to_string)
    })
}
