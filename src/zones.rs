//! Zone classification for São Paulo CEPs.
//!
//! Two static tables drive the classifier: a neighborhood catalog matched by
//! substring, and inclusive CEP ranges used when no neighborhood matches.
//! Both are scanned in declaration order and the first hit wins, so a
//! neighborhood like "Vila Mariana" lands in North (via "Vila Maria")
//! before South is ever consulted.

use crate::location::types::{clean_postal_code, Coordinates, LocationRecord};
use crate::text::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// City the catalog and ranges describe.
pub const DEFAULT_TARGET_CITY: &str = "São Paulo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    North,
    South,
    East,
    West,
    Central,
    Undefined,
}

impl Zone {
    pub const ALL: [Zone; 6] = [
        Zone::North,
        Zone::South,
        Zone::East,
        Zone::West,
        Zone::Central,
        Zone::Undefined,
    ];

    /// Position in `ALL`, used as a stable tie-break when sorting.
    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|z| *z == self).unwrap_or(Self::ALL.len())
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::North => write!(f, "North"),
            Self::South => write!(f, "South"),
            Self::East => write!(f, "East"),
            Self::West => write!(f, "West"),
            Self::Central => write!(f, "Central"),
            Self::Undefined => write!(f, "Undefined"),
        }
    }
}

// ─── Reference data ─────────────────────────────────────────────

/// Known neighborhoods per zone, scanned North, South, East, West, Central.
pub const ZONE_CATALOG: &[(Zone, &[&str])] = &[
    (
        Zone::North,
        &[
            "Anhanguera", "Brasilândia", "Cachoeirinha", "Casa Verde", "Freguesia do Ó",
            "Jaçanã", "Jaraguá", "Limão", "Mandaqui", "Perus", "Pirituba", "Santana",
            "Tremembé", "Tucuruvi", "Vila Guilherme", "Vila Maria", "Vila Medeiros",
        ],
    ),
    (
        Zone::South,
        &[
            "Campo Belo", "Campo Grande", "Campo Limpo", "Capão Redondo", "Cidade Ademar",
            "Cidade Dutra", "Grajaú", "Interlagos", "Jabaquara", "Jardim Ângela",
            "Jardim São Luís", "Marsilac", "Parelheiros", "Pedreira", "Santo Amaro",
            "Socorro", "Vila Andrade", "Vila Mariana", "Moema", "Saúde",
        ],
    ),
    (
        Zone::East,
        &[
            "Água Rasa", "Aricanduva", "Artur Alvim", "Belém", "Brás", "Cangaíba", "Carrão",
            "Cidade Líder", "Cidade Tiradentes", "Ermelino Matarazzo", "Guaianases",
            "Iguatemi", "Itaim Paulista", "Itaquera", "Jardim Helena", "José Bonifácio",
            "Mooca", "Parque do Carmo", "Penha", "Ponte Rasa", "Sapopemba", "Tatuapé",
        ],
    ),
    (
        Zone::West,
        &[
            "Alto de Pinheiros", "Barra Funda", "Butantã", "Jaguaré", "Jardim Paulista",
            "Lapa", "Morumbi", "Perdizes", "Pinheiros", "Rio Pequeno", "Vila Leopoldina",
            "Vila Madalena", "Vila Sônia", "Itaim Bibi",
        ],
    ),
    (
        Zone::Central,
        &[
            "Aclimação", "Bela Vista", "Bom Retiro", "Cambuci", "Consolação", "Higienópolis",
            "Liberdade", "República", "Santa Cecília", "Sé",
        ],
    ),
];

/// An inclusive range of CEPs read as integers (leading zeros dropped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRange {
    pub zone: Zone,
    pub first: u32,
    pub last: u32,
}

impl ZoneRange {
    pub fn contains(&self, cep: u32) -> bool {
        (self.first..=self.last).contains(&cep)
    }
}

/// CEP ranges, scanned Central, North, East, South, West.
pub const ZONE_RANGES: &[ZoneRange] = &[
    ZoneRange { zone: Zone::Central, first: 1_000_000, last: 1_099_999 },
    ZoneRange { zone: Zone::North, first: 2_000_000, last: 2_999_999 },
    ZoneRange { zone: Zone::East, first: 3_000_000, last: 3_999_999 },
    ZoneRange { zone: Zone::South, first: 4_000_000, last: 4_999_999 },
    ZoneRange { zone: Zone::West, first: 5_000_000, last: 5_999_999 },
];

// ─── Classifier ─────────────────────────────────────────────────

/// Assigns zones against a target city. Catalog names are normalized once
/// at construction.
#[derive(Debug, Clone)]
pub struct Classifier {
    target_city: String,
    catalog: Vec<(Zone, Vec<String>)>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_CITY)
    }
}

impl Classifier {
    pub fn new(target_city: &str) -> Self {
        let catalog = ZONE_CATALOG
            .iter()
            .map(|(zone, names)| (*zone, names.iter().map(|n| normalize(n)).collect()))
            .collect();
        Self {
            target_city: normalize(target_city),
            catalog,
        }
    }

    /// Normalized target city name.
    pub fn target_city(&self) -> &str {
        &self.target_city
    }

    pub fn is_target_city(&self, city: &str) -> bool {
        normalize(city) == self.target_city
    }

    /// Classify by city, then neighborhood substring, then CEP range.
    ///
    /// Coordinates do not currently influence the result.
    pub fn classify(
        &self,
        postal_code: &str,
        neighborhood: &str,
        city: &str,
        _coords: Coordinates,
    ) -> Zone {
        if !self.is_target_city(city) {
            return Zone::Undefined;
        }

        let nb = normalize(neighborhood);
        for (zone, names) in &self.catalog {
            if names.iter().any(|name| nb.contains(name.as_str())) {
                return *zone;
            }
        }

        let Some(cep) = postal_code_value(postal_code) else {
            return Zone::Undefined;
        };
        ZONE_RANGES
            .iter()
            .find(|range| range.contains(cep))
            .map(|range| range.zone)
            .unwrap_or(Zone::Undefined)
    }

    pub fn classify_record(&self, record: &LocationRecord) -> Zone {
        self.classify(
            &record.postal_code,
            &record.neighborhood,
            &record.city,
            record.coordinates(),
        )
    }
}

fn postal_code_value(postal_code: &str) -> Option<u32> {
    clean_postal_code(postal_code.trim()).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_of(cep: &str, neighborhood: &str, city: &str) -> Zone {
        Classifier::default().classify(cep, neighborhood, city, Coordinates::default())
    }

    #[test]
    fn test_other_city_is_undefined() {
        assert_eq!(zone_of("01001-000", "Moema", "Rio de Janeiro"), Zone::Undefined);
        assert_eq!(zone_of("01001-000", "Sé", ""), Zone::Undefined);
    }

    #[test]
    fn test_city_match_ignores_case_and_accents() {
        assert_eq!(zone_of("04077-000", "Moema", "SAO PAULO"), Zone::South);
        assert_eq!(zone_of("04077-000", "Moema", "  são paulo "), Zone::South);
    }

    #[test]
    fn test_city_internal_whitespace_not_collapsed() {
        assert_eq!(zone_of("04077-000", "Moema", "São  Paulo"), Zone::Undefined);
    }

    #[test]
    fn test_neighborhood_exact() {
        assert_eq!(zone_of("04077-000", "Moema", "São Paulo"), Zone::South);
        assert_eq!(zone_of("00000-000", "Tatuapé", "São Paulo"), Zone::East);
        assert_eq!(zone_of("00000-000", "Pinheiros", "São Paulo"), Zone::West);
        assert_eq!(zone_of("00000-000", "Santana", "São Paulo"), Zone::North);
        assert_eq!(zone_of("00000-000", "Bela Vista", "São Paulo"), Zone::Central);
    }

    #[test]
    fn test_neighborhood_substring() {
        assert_eq!(zone_of("99999-999", "Zona da Mooca", "São Paulo"), Zone::East);
        assert_eq!(zone_of("99999-999", "JARDIM  SAUDE", "São Paulo"), Zone::South);
    }

    #[test]
    fn test_declaration_order_wins() {
        // "vila mariana" contains North's "vila maria".
        assert_eq!(zone_of("04101-000", "Vila Mariana", "São Paulo"), Zone::North);
    }

    #[test]
    fn test_range_fallback() {
        assert_eq!(zone_of("01001-000", "Unknown Place", "São Paulo"), Zone::Central);
        assert_eq!(zone_of("02000000", "Xyz", "São Paulo"), Zone::North);
        assert_eq!(zone_of("03999-999", "Xyz", "São Paulo"), Zone::East);
        assert_eq!(zone_of("04000-000", "Xyz", "São Paulo"), Zone::South);
        assert_eq!(zone_of("05999-999", "Xyz", "São Paulo"), Zone::West);
    }

    #[test]
    fn test_range_gaps_and_out_of_range() {
        assert_eq!(zone_of("99999999", "Xyz", "São Paulo"), Zone::Undefined);
        assert_eq!(zone_of("01100-000", "Xyz", "São Paulo"), Zone::Undefined);
        assert_eq!(zone_of("08000-000", "Xyz", "São Paulo"), Zone::Undefined);
    }

    #[test]
    fn test_unparsable_cep_is_undefined() {
        assert_eq!(zone_of("n/a", "Xyz", "São Paulo"), Zone::Undefined);
    }

    #[test]
    fn test_placeholder_neighborhood_uses_range() {
        assert_eq!(zone_of("05010-000", "N/I", "São Paulo"), Zone::West);
    }

    #[test]
    fn test_custom_target_city() {
        let classifier = Classifier::new("Campinas");
        assert_eq!(classifier.target_city(), "campinas");
        let zone = classifier.classify("01001-000", "Sé", "São Paulo", Coordinates::default());
        assert_eq!(zone, Zone::Undefined);
    }

    #[test]
    fn test_ordinal_follows_all() {
        assert_eq!(Zone::North.ordinal(), 0);
        assert_eq!(Zone::Undefined.ordinal(), 5);
    }
}
