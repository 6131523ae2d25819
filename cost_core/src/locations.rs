//! Costed locations.
//!
//! The localization table only covers cities that have been surveyed. A site
//! elsewhere is costed as the nearest surveyed city by great-circle distance.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::localization::Locale;

/// Mean Earth radius used for great-circle distances
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A surveyed city from `locations.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub province_state: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn locale(&self) -> Locale {
        Locale::new(self.province_state.clone(), self.city.clone())
    }

    /// Distance in metres to a latitude/longitude in degrees
    pub fn distance_to(&self, latitude: f64, longitude: f64) -> f64 {
        haversine_m(self.latitude, self.longitude, latitude, longitude)
    }
}

/// Great-circle distance between two points given in degrees
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// The location nearest to the given coordinates, `None` for an empty list
pub fn closest_location(locations: &[Location], latitude: f64, longitude: f64) -> Option<&Location> {
    locations.iter().min_by(|a, b| {
        a.distance_to(latitude, longitude)
            .total_cmp(&b.distance_to(latitude, longitude))
    })
}

static PROVINCES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("AB", "ALBERTA"),
        ("BC", "BRITISH COLUMBIA"),
        ("MB", "MANITOBA"),
        ("NB", "NEW BRUNSWICK"),
        ("NL", "NEWFOUNDLAND AND LABRADOR"),
        ("NT", "NORTHWEST TERRITORIES"),
        ("NS", "NOVA SCOTIA"),
        ("NU", "NUNAVUT"),
        ("ON", "ONTARIO"),
        ("PE", "PRINCE EDWARD ISLAND"),
        ("PQ", "QUEBEC"),
        ("SK", "SASKATCHEWAN"),
        ("YT", "YUKON"),
    ])
});

/// Expand a two-letter Canadian province or territory code.
///
/// Weather files still carry the legacy `PQ` code for Quebec, so that is the
/// one accepted; `QC` is not in the table.
pub fn expand_province_abbrev(abbrev: &str) -> Option<&'static str> {
    PROVINCES.get(abbrev.trim().to_uppercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cities() -> Vec<Location> {
        vec![
            Location {
                province_state: "ON".into(),
                city: "Toronto".into(),
                latitude: 43.65,
                longitude: -79.38,
            },
            Location {
                province_state: "BC".into(),
                city: "Vancouver".into(),
                latitude: 49.28,
                longitude: -123.12,
            },
            Location {
                province_state: "QC".into(),
                city: "Montreal".into(),
                latitude: 45.50,
                longitude: -73.57,
            },
        ]
    }

    #[test]
    fn test_closest_location() {
        let locs = cities();
        // Ottawa
        let nearest = closest_location(&locs, 45.42, -75.70).unwrap();
        assert_eq!(nearest.city, "Montreal");
        // Victoria
        let nearest = closest_location(&locs, 48.43, -123.37).unwrap();
        assert_eq!(nearest.city, "Vancouver");
    }

    #[test]
    fn test_closest_location_empty() {
        assert!(closest_location(&[], 45.0, -75.0).is_none());
    }

    #[test]
    fn test_haversine_known_distance() {
        // Toronto to Montreal is roughly 505 km
        let d = haversine_m(43.65, -79.38, 45.50, -73.57);
        assert!((d - 505_000.0).abs() < 10_000.0, "distance was {d}");
        assert_eq!(haversine_m(10.0, 10.0, 10.0, 10.0), 0.0);
    }

    #[test]
    fn test_expand_province_abbrev() {
        assert_eq!(expand_province_abbrev("ON"), Some("ONTARIO"));
        assert_eq!(expand_province_abbrev("pq"), Some("QUEBEC"));
        assert_eq!(expand_province_abbrev("NL"), Some("NEWFOUNDLAND AND LABRADOR"));
        assert_eq!(expand_province_abbrev("XX"), None);
        assert_eq!(PROVINCES.len(), 13);
    }

    #[test]
    fn test_location_locale() {
        let loc = &cities()[0];
        assert_eq!(loc.locale(), Locale::new("ON", "Toronto"));
    }
}
