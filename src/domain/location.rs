use crate::api::Geocoder;
use crate::error::{DashError, Result};
use tracing::debug;

/// A named point in WGS84
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Named places loaded from the config file, matched by exact name
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    locations: Vec<Location>,
}

impl LocationTable {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(|l| l.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Geocoder for LocationTable {
    fn resolve(&self, place: &str) -> Result<Location> {
        let location = self
            .get(place)
            .cloned()
            .ok_or_else(|| DashError::NotFound(place.to_string()))?;
        debug!(
            "Resolved {} from location table -> ({:.4}, {:.4})",
            place, location.latitude, location.longitude
        );
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LocationTable {
        LocationTable::new(vec![
            Location::new("Conakry", 9.5092, -13.7122),
            Location::new("Kindia", 10.0569, -12.8658),
            Location::new("N'Zérékoré", 7.7562, -8.8179),
        ])
    }

    #[test]
    fn test_known_names_resolve_to_configured_coordinates() {
        let table = table();
        for expected in &table.locations {
            let resolved = table.resolve(&expected.name).unwrap();
            assert_eq!(&resolved, expected);
        }
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let err = table().resolve("Atlantis").unwrap_err();
        assert!(matches!(err, DashError::NotFound(ref n) if n == "Atlantis"));
    }

    #[test]
    fn test_match_is_exact() {
        let table = table();
        assert!(table.resolve("conakry").is_err());
        assert!(table.resolve("Conakry ").is_err());
    }
}
