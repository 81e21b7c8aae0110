//! Ordered output columns per entity kind.
//!
//! Field order is the output column order of every row and must be kept
//! stable. The schema is adjusted before streaming starts and is read-only
//! afterwards.

use serde::Serialize;

use crate::error::{PrgError, Result};
use crate::registry::EntityKind;

/// Identity and versioning fields shared by every entity kind.
const COMMON_FIELDS: [&str; 9] = [
    "gmlid",
    "identifier",
    "lokalnyId",
    "przestrzenNazw",
    "wersjaId",
    "poczatekWersjiObiektu",
    "koniecWersjiObiektu",
    "waznyOd",
    "waznyDo",
];

const ADMINISTRATIVE_UNIT_FIELDS: [&str; 4] =
    ["nazwa", "idTERYT", "poziom", "jednostkaPodzialuTeryt"];

const LOCALITY_FIELDS: [&str; 4] = ["nazwa", "idTERYT", "geometry", "miejscowosc"];

const STREET_FIELDS: [&str; 4] = ["nazwaGlownaCzesc", "idTERYT", "geometry", "ulica"];

const ADDRESS_POINT_FIELDS: [&str; 19] = [
    "jednostkaAdministracyjna",
    "jednostkaAdministracyjna_01",
    "jednostkaAdministracyjna_02",
    "jednostkaAdministracyjna_03",
    "miejscowosc",
    "czescMiejscowosci",
    "ulica",
    "numerPorzadkowy",
    "kodPocztowy",
    "status",
    "geometry",
    "komponent",
    "komponent_01",
    "komponent_02",
    "komponent_03",
    "komponent_04",
    "komponent_05",
    "komponent_06",
    "obiektEMUiA",
];

/// Audit and versioning fields dropped from every kind in basic mode.
pub const BASIC_REMOVED_FIELDS: [&str; 8] = [
    "gmlid",
    "identifier",
    "przestrzenNazw",
    "wersjaId",
    "poczatekWersjiObiektu",
    "koniecWersjiObiektu",
    "waznyOd",
    "waznyDo",
];

/// Address-point sub-component fields dropped in basic mode.
pub const BASIC_REMOVED_ADDRESS_POINT_FIELDS: [&str; 8] = [
    "komponent",
    "komponent_01",
    "komponent_02",
    "komponent_03",
    "komponent_04",
    "komponent_05",
    "komponent_06",
    "obiektEMUiA",
];

/// Built-in field presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPreset {
    /// Every known field.
    #[default]
    Full,
    /// Full minus audit/versioning and address-point sub-components.
    Basic,
}

impl FieldPreset {
    /// Select the preset from the `only_basic_fields` flag.
    #[must_use]
    pub fn from_basic_flag(only_basic_fields: bool) -> Self {
        if only_basic_fields {
            Self::Basic
        } else {
            Self::Full
        }
    }
}

/// Ordered field names for each entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    preset: FieldPreset,
    fields: [Vec<String>; 4],
}

impl FieldSchema {
    /// Build the schema for a preset.
    #[must_use]
    pub fn new(preset: FieldPreset) -> Self {
        match preset {
            FieldPreset::Full => Self::full(),
            FieldPreset::Basic => Self::basic(),
        }
    }

    /// Every known field for every kind.
    #[must_use]
    pub fn full() -> Self {
        let build = |specific: &[&str]| -> Vec<String> {
            COMMON_FIELDS
                .iter()
                .chain(specific)
                .map(|s| (*s).to_string())
                .collect()
        };

        Self {
            preset: FieldPreset::Full,
            fields: [
                build(&ADMINISTRATIVE_UNIT_FIELDS),
                build(&LOCALITY_FIELDS),
                build(&STREET_FIELDS),
                build(&ADDRESS_POINT_FIELDS),
            ],
        }
    }

    /// The reduced schema: full minus audit fields and address-point components.
    #[must_use]
    pub fn basic() -> Self {
        let mut schema = Self::full();
        schema.preset = FieldPreset::Basic;
        schema.remove_unchecked(&BASIC_REMOVED_FIELDS);
        schema.fields[EntityKind::AddressPoint.index()]
            .retain(|f| !BASIC_REMOVED_ADDRESS_POINT_FIELDS.contains(&f.as_str()));
        schema
    }

    /// Preset this schema was derived from.
    #[must_use]
    pub fn preset(&self) -> FieldPreset {
        self.preset
    }

    /// Ordered fields for a kind.
    #[must_use]
    pub fn fields(&self, kind: EntityKind) -> &[String] {
        &self.fields[kind.index()]
    }

    /// Check whether a kind has a field.
    #[must_use]
    pub fn contains(&self, kind: EntityKind, name: &str) -> bool {
        self.fields(kind).iter().any(|f| f == name)
    }

    /// Number of output columns for a kind.
    #[must_use]
    pub fn width(&self, kind: EntityKind) -> usize {
        self.fields(kind).len()
    }

    /// Remove named fields from every kind where present.
    ///
    /// Removing an absent field is a no-op. The removal is all-or-nothing:
    /// on error the schema is unchanged.
    ///
    /// # Errors
    /// Returns `PrgError::Configuration` if the removal would leave any kind
    /// without fields.
    pub fn remove_fields<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        let names: Vec<&str> = names.iter().map(|s| s.as_ref()).collect();

        let mut candidate = self.clone();
        candidate.remove_unchecked(&names);
        candidate.validate()?;

        tracing::debug!(removed = ?names, "Removed fields from schema");
        *self = candidate;
        Ok(())
    }

    /// Ensure every kind has at least one field.
    ///
    /// # Errors
    /// Returns `PrgError::Configuration` naming the first empty kind.
    pub fn validate(&self) -> Result<()> {
        match EntityKind::ALL.into_iter().find(|k| self.width(*k) == 0) {
            Some(kind) => Err(PrgError::Configuration(format!(
                "Field schema leaves {kind} without any fields"
            ))),
            None => Ok(()),
        }
    }

    fn remove_unchecked(&mut self, names: &[&str]) {
        for fields in &mut self.fields {
            fields.retain(|f| !names.contains(&f.as_str()));
        }
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::full()
    }
}
