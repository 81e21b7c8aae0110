//! Error types for the parser.
//!
//! `PrgError` is the single error type surfaced to library consumers.
//! Low-level XML and I/O failures raised while streaming are wrapped in
//! `PrgError::Parse` so the failing file is always part of the message.

use std::path::PathBuf;

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Main error type for the parser library.
#[derive(Debug, Error)]
pub enum PrgError {
    /// Invalid construction parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed XML.
    #[error("XML parsing failed: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute.
    #[error("Invalid XML attribute: {0}")]
    Attribute(#[from] AttrError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A captured subtree broke an internal invariant.
    #[error("Invariant violated at <{element}>: {reason}")]
    Invariant { element: String, reason: String },

    /// Streaming a file failed; wraps the underlying cause.
    #[error("Failed to parse {} at byte {position}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        position: u64,
        #[source]
        source: Box<PrgError>,
    },

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrgError {
    /// Wrap an error with the path and byte position of the file being parsed.
    #[must_use]
    pub fn in_file(self, path: impl Into<PathBuf>, position: u64) -> Self {
        match self {
            // Never double-wrap.
            err @ Self::Parse { .. } => err,
            err => Self::Parse {
                path: path.into(),
                position,
                source: Box::new(err),
            },
        }
    }
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, PrgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let err = PrgError::Configuration("file path must not be empty".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: file path must not be empty"
        );
    }

    #[test]
    fn test_in_file_attaches_context() {
        let err = PrgError::Invariant {
            element: "PRG_PunktAdresowy".to_string(),
            reason: "unbalanced end tag".to_string(),
        }
        .in_file("/data/PRG_punkty.xml", 42);

        let msg = err.to_string();
        assert!(msg.contains("/data/PRG_punkty.xml"));
        assert!(msg.contains("byte 42"));
        assert!(msg.contains("unbalanced end tag"));
    }

    #[test]
    fn test_in_file_does_not_double_wrap() {
        let err = PrgError::Configuration("x".to_string())
            .in_file("a.xml", 1)
            .in_file("b.xml", 2);

        let PrgError::Parse { path, position, .. } = err else {
            unreachable!("expected Parse variant");
        };
        assert_eq!(path, PathBuf::from("a.xml"));
        assert_eq!(position, 1);
    }
}
