//! Entity kinds recognized in PRG exports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrgError;

/// The closed set of record types a PRG export contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Administrative unit name (jednostka administracyjna).
    #[serde(rename = "PRG_JednostkaAdministracyjnaNazwa")]
    AdministrativeUnit,

    /// Locality name (miejscowość).
    #[serde(rename = "PRG_MiejscowoscNazwa")]
    Locality,

    /// Street name (ulica).
    #[serde(rename = "PRG_UlicaNazwa")]
    Street,

    /// Address point (punkt adresowy).
    #[serde(rename = "PRG_PunktAdresowy")]
    AddressPoint,
}

impl EntityKind {
    /// All kinds, in output order.
    pub const ALL: [EntityKind; 4] = [
        Self::AdministrativeUnit,
        Self::Locality,
        Self::Street,
        Self::AddressPoint,
    ];

    /// Local (namespace-free) tag name, also used as the output label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::AdministrativeUnit => "PRG_JednostkaAdministracyjnaNazwa",
            Self::Locality => "PRG_MiejscowoscNazwa",
            Self::Street => "PRG_UlicaNazwa",
            Self::AddressPoint => "PRG_PunktAdresowy",
        }
    }

    /// Short alias accepted on the command line.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::AdministrativeUnit => "ja",
            Self::Locality => "msc",
            Self::Street => "ul",
            Self::AddressPoint => "pa",
        }
    }

    /// Position of this kind in [`EntityKind::ALL`].
    #[must_use]
    pub(crate) fn index(self) -> usize {
        match self {
            Self::AdministrativeUnit => 0,
            Self::Locality => 1,
            Self::Street => 2,
            Self::AddressPoint => 3,
        }
    }

    /// Look up a kind by its local tag name.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = PrgError;

    /// Accepts either the full label or the short alias, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(s) || k.short_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| PrgError::Configuration(format!("Unknown entity kind: '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, kind) in EntityKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_from_label() {
        assert_eq!(
            EntityKind::from_label("PRG_PunktAdresowy"),
            Some(EntityKind::AddressPoint)
        );
        assert_eq!(EntityKind::from_label("PRG_Unknown"), None);
    }

    #[test]
    fn test_from_str_accepts_aliases() {
        assert_eq!("pa".parse::<EntityKind>().unwrap(), EntityKind::AddressPoint);
        assert_eq!("MSC".parse::<EntityKind>().unwrap(), EntityKind::Locality);
        assert_eq!(
            "prg_ulicanazwa".parse::<EntityKind>().unwrap(),
            EntityKind::Street
        );
        assert!("building".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&EntityKind::AdministrativeUnit).unwrap();
        assert_eq!(json, "\"PRG_JednostkaAdministracyjnaNazwa\"");
    }
}
