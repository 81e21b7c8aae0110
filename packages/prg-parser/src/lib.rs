//! PRG Parser - Stream PRG address-registry GML exports into flat rows.
//!
//! This crate converts the Polish national address-registry and
//! administrative-boundary exports (PRG) into fixed-width rows, one per
//! administrative unit, locality, street or address point, ready for bulk
//! loading into a spatial database.
//!
//! # Example
//!
//! ```no_run
//! use prg_parser::PrgParser;
//!
//! let parser = PrgParser::new("PRG_PunktyAdresowe_02.xml", true)?;
//! for row in parser.stream()? {
//!     let row = row?;
//!     println!("{}: {:?}", row.label(), row.values);
//! }
//! # Ok::<(), prg_parser::PrgError>(())
//! ```
//!
//! # Architecture
//!
//! The parser is organized into several modules:
//!
//! - [`config`]: Default namespaces, patterns and constants
//! - [`error`]: Error types and Result alias
//! - [`namespaces`]: Namespace sniffing from the document prolog
//! - [`registry`]: Entity kinds and their qualified tag names
//! - [`fields`]: Ordered output columns per entity kind
//! - [`xml`]: Captured subtrees, serialization and helpers
//! - [`flatten`]: Flattening one entity subtree into a record
//! - [`stream`]: Memory-bounded streaming over a whole file
//! - [`types`]: Records and output rows
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod fields;
pub mod flatten;
pub mod namespaces;
pub mod registry;
pub mod stream;
pub mod types;
pub mod xml;

// Re-export commonly used items
pub use error::{PrgError, Result};
pub use fields::{FieldPreset, FieldSchema};
pub use flatten::Flattener;
pub use namespaces::NamespaceTable;
pub use registry::{EntityKind, EntityRegistry};
pub use stream::{EntityStream, ParserOptions, PrgParser, StreamStats};
pub use types::{Record, Row};
