//! Entity registry for the four PRG record types.
//!
//! The registry turns a resolved [`NamespaceTable`](crate::namespaces::NamespaceTable)
//! into the qualified tag names the streaming reader filters on, and maps
//! matched tags back to an [`EntityKind`].

mod core;
mod types;

pub use core::EntityRegistry;
pub use types::EntityKind;
