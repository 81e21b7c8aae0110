//! Configuration constants and patterns for the parser.

use regex::Regex;
use std::sync::LazyLock;

/// Default address-registry (PRG) namespace.
pub const DEFAULT_NS_PRG: &str = "urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:1.0";

/// Default GML namespace.
pub const DEFAULT_NS_GML: &str = "http://www.opengis.net/gml/3.2";

/// XML Schema instance namespace.
pub const DEFAULT_NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Default base-model (modelPodstawowy) namespace.
pub const DEFAULT_NS_BT: &str = "urn:gugik:specyfikacje:gmlas:modelPodstawowy:1.0";

/// Default locality-model (EMUiA) namespace.
pub const DEFAULT_NS_MUA: &str =
    "urn:gugik:specyfikacje:gmlas:ewidencjaMiejscowosciUlicAdresow:1.0";

/// XLink namespace, the only source of cross-reference attributes.
pub const NS_XLINK: &str = "http://www.w3.org/1999/xlink";

/// Number of leading lines scanned for namespace declarations.
///
/// Declarations placed after this window are not seen and the defaults apply.
pub const NAMESPACE_SNIFF_LINES: usize = 15;

/// Local names of elements that carry a GML geometry child.
pub const GEOMETRY_ELEMENTS: [&str; 2] = ["pozycja", "geometria"];

/// Name of the output field holding the serialized geometry.
pub const GEOMETRY_FIELD: &str = "geometry";

/// Name of the output field holding the element's `gml:id`.
pub const GMLID_FIELD: &str = "gmlid";

/// Misspelled local name found in published PRG exports.
pub const TYPO_NAME: &str = "jednostkaAdmnistracyjna";

/// Correct spelling for [`TYPO_NAME`].
pub const TYPO_FIX: &str = "jednostkaAdministracyjna";

/// Buffer capacity for the streaming reader (1 MB).
pub const READ_BUFFER_CAPACITY: usize = 1024 * 1024;

/// `xmlns:prg-ad="..."` declaration.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub static NS_PRG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)xmlns:prg-ad="(urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:\d\.\d)""#)
        .expect("valid regex")
});

/// `xmlns:gml="..."` declaration.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub static NS_GML_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)xmlns:gml="(http://www\.opengis\.net/gml/\d\.\d)""#).expect("valid regex")
});

/// Any mention of the base-model namespace.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub static NS_BT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(urn:gugik:specyfikacje:gmlas:modelPodstawowy:\d\.\d)").expect("valid regex")
});

/// Any mention of the locality-model namespace.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub static NS_MUA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(urn:gugik:specyfikacje:gmlas:ewidencjaMiejscowosciUlicAdresow:\d\.\d)")
        .expect("valid regex")
});

/// Apply the known local-name typo correction.
///
/// # Examples
/// ```
/// use prg_parser::config::fix_typo;
///
/// assert_eq!(fix_typo("jednostkaAdmnistracyjna"), "jednostkaAdministracyjna");
/// assert_eq!(fix_typo("ulica"), "ulica");
/// ```
#[must_use]
pub fn fix_typo(name: &str) -> &str {
    if name == TYPO_NAME {
        TYPO_FIX
    } else {
        name
    }
}

/// Check whether a local name marks a geometry-bearing element.
#[must_use]
pub fn is_geometry_element(name: &str) -> bool {
    GEOMETRY_ELEMENTS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_typo() {
        assert_eq!(fix_typo(TYPO_NAME), TYPO_FIX);
        assert_eq!(fix_typo(TYPO_FIX), TYPO_FIX);
        assert_eq!(fix_typo("miejscowosc"), "miejscowosc");
    }

    #[test]
    fn test_is_geometry_element() {
        assert!(is_geometry_element("pozycja"));
        assert!(is_geometry_element("geometria"));
        assert!(!is_geometry_element("geometry"));
        assert!(!is_geometry_element("Pozycja"));
    }

    #[test]
    fn test_prg_pattern_captures_version() {
        let line = r#"<prg-ad:FeatureCollection xmlns:prg-ad="urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:2.0">"#;
        let caps = NS_PRG_PATTERN.captures(line).unwrap();
        assert_eq!(
            &caps[1],
            "urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:2.0"
        );
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let line = r#"XMLNS:GML="http://www.opengis.net/gml/3.2""#;
        assert!(NS_GML_PATTERN.is_match(line));
    }

    #[test]
    fn test_bt_pattern_matches_anywhere() {
        let line = r#"xsi:schemaLocation="urn:gugik:specyfikacje:gmlas:modelPodstawowy:1.1 bt.xsd""#;
        let caps = NS_BT_PATTERN.captures(line).unwrap();
        assert_eq!(&caps[1], "urn:gugik:specyfikacje:gmlas:modelPodstawowy:1.1");
    }
}
