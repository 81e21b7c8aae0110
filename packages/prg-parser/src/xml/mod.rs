//! XML subtree model, serialization and helpers.

mod serialize;
mod tree;
mod utils;

pub use serialize::serialize_wrapped;
pub use tree::{element_from_start, Attribute, Element, Node, QualifiedName, SubtreeBuilder};
pub use utils::{
    element_children, first_element_child, get_attribute, get_tag_name, get_text,
    has_element_children,
};
