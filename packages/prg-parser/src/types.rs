//! Core data types: flattened records and output rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::registry::EntityKind;

/// One flattened entity: field name to optional value.
///
/// A key that is present with a `None` value was seen in the source but
/// had no content (for example an empty geometry element).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    values: HashMap<String, Option<String>>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.values.insert(name.into(), value);
    }

    /// Get a field's value; `None` if absent or null.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_deref())
    }

    /// Check whether a field was set (possibly to null).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of fields set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no field was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field names currently set, in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Next free numbered variant of `name`: `name_01`, `name_02`, …
    ///
    /// The suffix follows the highest numbered variant already stored, so
    /// gaps are never refilled. Suffixes widen past two digits after `_99`.
    ///
    /// # Examples
    /// ```
    /// use prg_parser::Record;
    ///
    /// let mut record = Record::new();
    /// record.insert("komponent", Some("A".to_string()));
    /// assert_eq!(record.next_variant("komponent"), "komponent_01");
    ///
    /// record.insert("komponent_01", Some("B".to_string()));
    /// assert_eq!(record.next_variant("komponent"), "komponent_02");
    /// ```
    #[must_use]
    pub fn next_variant(&self, name: &str) -> String {
        let highest = self
            .values
            .keys()
            .filter_map(|key| variant_number(key, name))
            .max()
            .unwrap_or(0);
        format!("{name}_{:02}", highest + 1)
    }

    /// Project onto an ordered field list; missing fields become `None`.
    #[must_use]
    pub fn project(&self, fields: &[String]) -> Vec<Option<String>> {
        fields
            .iter()
            .map(|field| self.values.get(field).cloned().flatten())
            .collect()
    }
}

/// Parse the numeric suffix of `key` if it is a numbered variant of `base`.
fn variant_number(key: &str, base: &str) -> Option<u32> {
    let digits = key.strip_prefix(base)?.strip_prefix('_')?;
    if digits.len() < 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// One output row: the entity label and its values in schema column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub kind: EntityKind,
    pub values: Vec<Option<String>>,
}

impl Row {
    /// Output label of the row's entity kind.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}
