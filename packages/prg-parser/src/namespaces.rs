//! Namespace resolution from the document prolog.
//!
//! PRG exports come in several schema versions. Rather than trusting an XML
//! parser on a prolog that may be only loosely well-formed, the first lines of
//! the file are scanned as raw text and matched against known patterns.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;
use serde::Serialize;

use crate::config::{
    DEFAULT_NS_BT, DEFAULT_NS_GML, DEFAULT_NS_MUA, DEFAULT_NS_PRG, DEFAULT_NS_XSI,
    NAMESPACE_SNIFF_LINES, NS_BT_PATTERN, NS_GML_PATTERN, NS_MUA_PATTERN, NS_PRG_PATTERN,
    NS_XLINK,
};
use crate::error::Result;

/// Namespace URIs used by one document.
///
/// Every role always has a value: sniffing only overrides the 1.0 defaults
/// when a recognized declaration is found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceTable {
    /// Address-registry namespace (`prg-ad`).
    pub prg: String,
    /// GML namespace.
    pub gml: String,
    /// XML Schema instance namespace.
    pub xsi: String,
    /// Base-model namespace (`bt`).
    pub bt: String,
    /// Locality-model namespace (`mua`).
    pub mua: String,
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self {
            prg: DEFAULT_NS_PRG.to_string(),
            gml: DEFAULT_NS_GML.to_string(),
            xsi: DEFAULT_NS_XSI.to_string(),
            bt: DEFAULT_NS_BT.to_string(),
            mua: DEFAULT_NS_MUA.to_string(),
        }
    }
}

impl NamespaceTable {
    /// Resolve the namespaces of a file by scanning its first lines.
    ///
    /// # Errors
    /// Returns `PrgError::Io` if the file cannot be opened or read. Finding
    /// no declarations is not an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Resolve namespaces from any buffered reader.
    ///
    /// Lines that are not valid UTF-8 are decoded lossily.
    pub fn from_reader(mut reader: impl BufRead) -> Result<Self> {
        let mut table = Self::default();
        let mut line = Vec::new();

        for _ in 0..NAMESPACE_SNIFF_LINES {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            table.update_from_line(&String::from_utf8_lossy(&line));
        }

        tracing::debug!(
            prg = %table.prg,
            gml = %table.gml,
            bt = %table.bt,
            mua = %table.mua,
            "Resolved namespaces"
        );
        Ok(table)
    }

    /// Apply every pattern to one line; later matches win.
    pub fn update_from_line(&mut self, line: &str) {
        let patterns: [(&Regex, &mut String); 4] = [
            (&*NS_PRG_PATTERN, &mut self.prg),
            (&*NS_GML_PATTERN, &mut self.gml),
            (&*NS_BT_PATTERN, &mut self.bt),
            (&*NS_MUA_PATTERN, &mut self.mua),
        ];

        for (pattern, slot) in patterns {
            if let Some(uri) = pattern.captures(line).and_then(|c| c.get(1)) {
                *slot = uri.as_str().to_string();
            }
        }
    }

    /// Clark-notation name of the cross-reference attribute.
    #[must_use]
    pub fn xlink_href(&self) -> String {
        format!("{{{NS_XLINK}}}href")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_defaults_without_declarations() {
        let xml = "<?xml version=\"1.0\"?>\n<root>\n</root>\n";
        let table = NamespaceTable::from_reader(Cursor::new(xml)).unwrap();
        assert_eq!(table, NamespaceTable::default());
    }

    #[test]
    fn test_sniffs_all_roles() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<prg-ad:FeatureCollection
  xmlns:prg-ad="urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:2.0"
  xmlns:gml="http://www.opengis.net/gml/3.3"
  xmlns:bt="urn:gugik:specyfikacje:gmlas:modelPodstawowy:2.0"
  xmlns:mua="urn:gugik:specyfikacje:gmlas:ewidencjaMiejscowosciUlicAdresow:2.0">
</prg-ad:FeatureCollection>
"#;
        let table = NamespaceTable::from_reader(Cursor::new(xml)).unwrap();
        assert_eq!(
            table.prg,
            "urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:2.0"
        );
        assert_eq!(table.gml, "http://www.opengis.net/gml/3.3");
        assert_eq!(table.bt, "urn:gugik:specyfikacje:gmlas:modelPodstawowy:2.0");
        assert_eq!(
            table.mua,
            "urn:gugik:specyfikacje:gmlas:ewidencjaMiejscowosciUlicAdresow:2.0"
        );
        assert_eq!(table.xsi, DEFAULT_NS_XSI);
    }

    #[test]
    fn test_partial_match_keeps_other_defaults() {
        let xml = r#"<root xmlns:gml="http://www.opengis.net/gml/3.3">"#;
        let table = NamespaceTable::from_reader(Cursor::new(xml)).unwrap();
        assert_eq!(table.gml, "http://www.opengis.net/gml/3.3");
        assert_eq!(table.prg, DEFAULT_NS_PRG);
        assert_eq!(table.bt, DEFAULT_NS_BT);
    }

    #[test]
    fn test_declarations_after_window_are_ignored() {
        let mut xml = String::new();
        for _ in 0..NAMESPACE_SNIFF_LINES {
            xml.push_str("<!-- padding -->\n");
        }
        xml.push_str(r#"<root xmlns:gml="http://www.opengis.net/gml/3.3">"#);

        let table = NamespaceTable::from_reader(Cursor::new(xml)).unwrap();
        assert_eq!(table.gml, DEFAULT_NS_GML);
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut bytes = b"<root \xff\xfe ".to_vec();
        bytes.extend_from_slice(br#"xmlns:gml="http://www.opengis.net/gml/3.3">"#);
        let table = NamespaceTable::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(table.gml, "http://www.opengis.net/gml/3.3");
    }

    #[test]
    fn test_xlink_href() {
        let table = NamespaceTable::default();
        assert_eq!(table.xlink_href(), "{http://www.w3.org/1999/xlink}href");
    }
}
