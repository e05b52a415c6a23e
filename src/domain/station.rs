use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Stable cache key: both axes rounded to 4 decimal places (~11 m).
    pub fn cache_key(&self) -> (i64, i64) {
        (
            (self.lat * 10_000.0).round() as i64,
            (self.lng * 10_000.0).round() as i64,
        )
    }
}

/// Read-only reference data for one docking station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationProfile {
    pub id: u32,
    pub name: String,
    /// Total stand count (bikes + empty stands)
    pub capacity: u32,
    pub coordinates: Coordinates,
}

impl StationProfile {
    pub fn new(id: u32, capacity: u32, coordinates: Coordinates) -> Self {
        Self {
            id,
            name: String::new(),
            capacity,
            coordinates,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
