//! Location types

use serde::{Deserialize, Serialize};

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Whether the pair lies inside the WGS84 value ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A place as supplied by the caller: a bare address string, or an object
/// carrying an address and/or already-resolved coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaceInput {
    Address(String),
    Detailed {
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        coords: Option<Coordinates>,
    },
}

impl PlaceInput {
    pub fn address(&self) -> Option<&str> {
        match self {
            PlaceInput::Address(a) => Some(a.as_str()),
            PlaceInput::Detailed { address, .. } => address.as_deref(),
        }
    }

    pub fn coords(&self) -> Option<Coordinates> {
        match self {
            PlaceInput::Address(_) => None,
            PlaceInput::Detailed { coords, .. } => *coords,
        }
    }
}

/// A resolved waypoint: immutable once its coordinates are known.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Human-readable address, if one was supplied or geocoded
    pub address: Option<String>,
    /// Resolved coordinates
    pub coordinates: Coordinates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validity_ranges() {
        assert!(Coordinates { lat: 50.0, lng: 14.0 }.is_valid());
        assert!(Coordinates { lat: -90.0, lng: 180.0 }.is_valid());
        assert!(!Coordinates { lat: 91.0, lng: 0.0 }.is_valid());
        assert!(!Coordinates { lat: 0.0, lng: -180.5 }.is_valid());
        assert!(!Coordinates { lat: f64::NAN, lng: 0.0 }.is_valid());
    }

    #[test]
    fn test_place_input_accepts_bare_string() {
        let place: PlaceInput = serde_json::from_str("\"Main square, Prague\"").unwrap();
        assert_eq!(place.address(), Some("Main square, Prague"));
        assert!(place.coords().is_none());
    }

    #[test]
    fn test_place_input_accepts_object_with_coords() {
        let place: PlaceInput =
            serde_json::from_str(r#"{"address":"Brno","coords":{"lat":49.19,"lng":16.6}}"#)
                .unwrap();
        assert_eq!(place.address(), Some("Brno"));
        let coords = place.coords().unwrap();
        assert!((coords.lat - 49.19).abs() < 1e-9);
    }

    #[test]
    fn test_place_input_object_without_address() {
        let place: PlaceInput =
            serde_json::from_str(r#"{"coords":{"lat":50.0,"lng":14.0}}"#).unwrap();
        assert!(place.address().is_none());
        assert!(place.coords().is_some());
    }
}
