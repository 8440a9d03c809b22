//! District to zone classification.

use serde::Deserialize;

/// Zone assigned to districts that no zone lists.
pub const UNKNOWN_ZONE: &str = "Unknown";

/// A named group of districts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub name: String,
    pub districts: Vec<String>,
}

/// Ordered zone table. Lookup scans zones in order, so a district listed
/// twice belongs to the first zone that lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTable {
    zones: Vec<Zone>,
}

impl ZoneTable {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// Returns the zone of `district`, or [`UNKNOWN_ZONE`].
    pub fn classify(&self, district: &str) -> &str {
        self.zones
            .iter()
            .find(|zone| zone.districts.iter().any(|d| d == district))
            .map_or(UNKNOWN_ZONE, |zone| zone.name.as_str())
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}

impl Default for ZoneTable {
    /// Built-in grouping of the Portuguese districts and islands.
    fn default() -> Self {
        let zone = |name: &str, districts: &[&str]| Zone {
            name: name.to_string(),
            districts: districts.iter().map(|d| d.to_string()).collect(),
        };
        Self::new(vec![
            zone("Porto", &["Aveiro", "Porto", "Braga", "Viana do Castelo"]),
            zone("Lamego", &["Vila Real", "Bragança", "Viseu", "Lamego", "Guarda"]),
            zone("Castelo Branco", &["Castelo Branco", "Portalegre"]),
            zone("Santarém", &["Santarém", "Leiria", "Coimbra"]),
            zone("Lisboa", &["Lisboa"]),
            zone("Setúbal", &["Setúbal", "Évora"]),
            zone("Faro", &["Faro", "Beja"]),
            zone("Ilhas - Madeira", &["Madeira"]),
            zone("Ilhas - Açores", &["Açores"]),
        ])
    }
}
