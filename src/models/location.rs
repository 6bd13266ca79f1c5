//! Location model for the drop zone and projected track points

use serde::{Deserialize, Serialize};

/// Metres per degree of latitude
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
/// Equatorial circumference in metres
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_000.0;

/// Location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Location name (drop zone, exit point, ...)
    pub name: String,
}

/// A trajectory point projected to geographic coordinates
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub time_offset: f64,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
        }
    }

    /// Metres per degree of longitude at this latitude
    #[must_use]
    pub fn meters_per_degree_lon(&self) -> f64 {
        EARTH_CIRCUMFERENCE_M * self.latitude.to_radians().cos() / 360.0
    }

    /// Location displaced by `east`/`north` metres (flat-earth approximation)
    #[must_use]
    pub fn offset(&self, east: f64, north: f64) -> Location {
        Location {
            latitude: self.latitude + north / METERS_PER_DEGREE_LAT,
            longitude: self.longitude + east / self.meters_per_degree_lon(),
            name: self.name.clone(),
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_east_at_equator() {
        let location = Location::new(0.0, 10.0, "Equator".to_string());
        let moved = location.offset(EARTH_CIRCUMFERENCE_M / 360.0, 0.0);
        assert!((moved.longitude - 11.0).abs() < 1e-9);
        assert_eq!(moved.latitude, 0.0);
    }

    #[test]
    fn test_offset_east_shrinks_with_latitude() {
        let location = Location::new(60.0, 0.0, "North".to_string());
        let moved = location.offset(1000.0, 0.0);
        let equator = Location::new(0.0, 0.0, "Equator".to_string()).offset(1000.0, 0.0);
        assert!((moved.longitude - 2.0 * equator.longitude).abs() < 1e-9);
    }

    #[test]
    fn test_format_coordinates() {
        let location = Location::new(39.706_561_4, -75.035_218_1, "DZ".to_string());
        assert_eq!(location.format_coordinates(), "39.70656, -75.03522");
    }
}
