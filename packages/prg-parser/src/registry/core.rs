//! Registry mapping qualified entity tags to entity kinds.

use std::collections::HashMap;

use super::types::EntityKind;
use crate::config::fix_typo;
use crate::error::{PrgError, Result};
use crate::namespaces::NamespaceTable;

/// Qualified tag names for the entity kinds selected for one parse run.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    namespace: String,
    selected: Vec<EntityKind>,
    by_qualified: HashMap<String, EntityKind>,
}

impl EntityRegistry {
    /// Create a registry for all four entity kinds.
    #[must_use]
    pub fn new(namespaces: &NamespaceTable) -> Self {
        let namespace = namespaces.prg.clone();
        let by_qualified = EntityKind::ALL
            .into_iter()
            .map(|kind| (clark(&namespace, kind.label()), kind))
            .collect();

        Self {
            namespace,
            selected: EntityKind::ALL.to_vec(),
            by_qualified,
        }
    }

    /// Create a registry restricted to a subset of entity kinds.
    ///
    /// # Errors
    /// Returns `PrgError::Configuration` if `kinds` is empty.
    pub fn with_kinds(namespaces: &NamespaceTable, kinds: &[EntityKind]) -> Result<Self> {
        if kinds.is_empty() {
            return Err(PrgError::Configuration(
                "At least one entity kind must be selected".to_string(),
            ));
        }

        let mut registry = Self::new(namespaces);
        registry.selected = EntityKind::ALL
            .into_iter()
            .filter(|k| kinds.contains(k))
            .collect();
        registry.by_qualified.retain(|_, kind| kinds.contains(kind));
        Ok(registry)
    }

    /// Clark-notation tag name (`{uri}local`) for a kind.
    #[must_use]
    pub fn qualified_name(&self, kind: EntityKind) -> String {
        clark(&self.namespace, kind.label())
    }

    /// Qualified names of the selected kinds; the streaming filter.
    #[must_use]
    pub fn filter(&self) -> Vec<String> {
        self.selected
            .iter()
            .map(|kind| self.qualified_name(*kind))
            .collect()
    }

    /// Selected entity kinds, in output order.
    #[must_use]
    pub fn kinds(&self) -> &[EntityKind] {
        &self.selected
    }

    /// Map a Clark-notation tag back to its kind.
    #[must_use]
    pub fn kind_of(&self, qualified: &str) -> Option<EntityKind> {
        self.by_qualified.get(qualified).copied()
    }

    /// Match an already-resolved `(namespace, local name)` pair.
    ///
    /// Used by the streaming reader to test every start tag without
    /// allocating a qualified name.
    #[must_use]
    pub fn kind_of_resolved(&self, namespace: &[u8], local: &[u8]) -> Option<EntityKind> {
        if namespace != self.namespace.as_bytes() {
            return None;
        }
        let local = std::str::from_utf8(local).ok()?;
        EntityKind::from_label(fix_typo(local)).filter(|kind| self.selected.contains(kind))
    }
}

/// Build a Clark-notation name.
pub(crate) fn clark(namespace: &str, local: &str) -> String {
    format!("{{{namespace}}}{local}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRG_1_0: &str = "urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:1.0";

    #[test]
    fn test_qualified_names_use_prg_namespace() {
        let registry = EntityRegistry::new(&NamespaceTable::default());
        assert_eq!(
            registry.qualified_name(EntityKind::AddressPoint),
            format!("{{{PRG_1_0}}}PRG_PunktAdresowy")
        );
        assert_eq!(registry.filter().len(), 4);
    }

    #[test]
    fn test_kind_of_round_trips() {
        let registry = EntityRegistry::new(&NamespaceTable::default());
        for kind in EntityKind::ALL {
            assert_eq!(registry.kind_of(&registry.qualified_name(kind)), Some(kind));
        }
        assert_eq!(registry.kind_of("PRG_PunktAdresowy"), None);
    }

    #[test]
    fn test_sniffed_namespace_changes_tags() {
        let mut table = NamespaceTable::default();
        table.prg = "urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:2.0".to_string();
        let registry = EntityRegistry::new(&table);

        assert!(registry
            .qualified_name(EntityKind::Street)
            .starts_with("{urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:2.0}"));
        assert_eq!(
            registry.kind_of(&format!("{{{PRG_1_0}}}PRG_UlicaNazwa")),
            None
        );
    }

    #[test]
    fn test_with_kinds_restricts_filter() {
        let registry = EntityRegistry::with_kinds(
            &NamespaceTable::default(),
            &[EntityKind::AddressPoint, EntityKind::Locality],
        )
        .unwrap();

        assert_eq!(
            registry.kinds(),
            &[EntityKind::Locality, EntityKind::AddressPoint]
        );
        assert_eq!(registry.filter().len(), 2);
        assert_eq!(
            registry.kind_of(&registry.qualified_name(EntityKind::Street)),
            None
        );
    }

    #[test]
    fn test_with_kinds_rejects_empty_selection() {
        let result = EntityRegistry::with_kinds(&NamespaceTable::default(), &[]);
        assert!(matches!(result, Err(PrgError::Configuration(_))));
    }

    #[test]
    fn test_kind_of_resolved() {
        let registry = EntityRegistry::new(&NamespaceTable::default());
        assert_eq!(
            registry.kind_of_resolved(PRG_1_0.as_bytes(), b"PRG_MiejscowoscNazwa"),
            Some(EntityKind::Locality)
        );
        assert_eq!(
            registry.kind_of_resolved(b"http://example.com", b"PRG_MiejscowoscNazwa"),
            None
        );
        assert_eq!(registry.kind_of_resolved(PRG_1_0.as_bytes(), b"nazwa"), None);
    }
}
