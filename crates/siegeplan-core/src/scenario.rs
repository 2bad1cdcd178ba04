// Scenario selection: the static map/site catalog and the current choice.

use serde::Serialize;
use thiserror::Error;

/// A map and its bomb sites, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    pub name: &'static str,
    pub sites: &'static [&'static str],
}

/// Process-wide map catalog. The first site of each map is the default.
pub static MAP_CATALOG: &[MapEntry] = &[
    MapEntry {
        name: "Oregon",
        sites: &["Cucina/Sala da pranzo", "Bambini/Dormitori", "Torre/Archivi"],
    },
    MapEntry {
        name: "Club House",
        sites: &["Contanti/CCTV", "Palestra/Camera da letto", "Bar/Magazzino"],
    },
    MapEntry {
        name: "Kafe Dostoyevsky",
        sites: &["Bar/Cocktail Lounge", "Cucina/Servizio", "Sala lettura/Camino"],
    },
    MapEntry {
        name: "Banca",
        sites: &["Caveau/CCTV", "Uffici Direzionali/CEO", "Spogliatoi/Archivi"],
    },
    MapEntry {
        name: "Consolato",
        sites: &["Garage/Sala riunioni", "Lobby/Ufficio stampa"],
    },
    MapEntry {
        name: "Chalet",
        sites: &["Cantina/Cantina vini", "Biblioteca/Sala giochi", "Cucina/Sala trofei"],
    },
];

/// Look up a map by name (case-insensitive).
pub fn find_map(name: &str) -> Option<&'static MapEntry> {
    let name = name.trim();
    MAP_CATALOG.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

/// Sites for the given map, or `None` if the map is not in the catalog.
pub fn sites_for(map: &str) -> Option<&'static [&'static str]> {
    find_map(map).map(|m| m.sites)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("unknown map `{0}`")]
    UnknownMap(String),

    #[error("site `{site}` is not on {map}")]
    UnknownSite { map: String, site: String },
}

/// The currently selected map and bomb site. `site` always belongs to `map`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scenario {
    map: &'static MapEntry,
    site: &'static str,
}

impl Default for Scenario {
    fn default() -> Self {
        let map = &MAP_CATALOG[0];
        Scenario {
            map,
            site: map.sites[0],
        }
    }
}

impl Serialize for MapEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

impl Scenario {
    pub fn map(&self) -> &'static str {
        self.map.name
    }

    pub fn site(&self) -> &'static str {
        self.site
    }

    /// Sites available on the selected map.
    pub fn available_sites(&self) -> &'static [&'static str] {
        self.map.sites
    }

    /// Select a map. The site is reset to that map's first site.
    pub fn select_map(&mut self, name: &str) -> Result<(), ScenarioError> {
        let entry = find_map(name).ok_or_else(|| ScenarioError::UnknownMap(name.to_string()))?;
        self.map = entry;
        self.site = entry.sites[0];
        Ok(())
    }

    /// Select a site on the current map.
    pub fn select_site(&mut self, site: &str) -> Result<(), ScenarioError> {
        let wanted = site.trim();
        let found = self
            .map
            .sites
            .iter()
            .find(|s| s.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ScenarioError::UnknownSite {
                map: self.map.name.to_string(),
                site: site.to_string(),
            })?;
        self.site = found;
        Ok(())
    }
}
