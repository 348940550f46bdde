//! Valhalla routing engine client
//!
//! Valhalla API documentation:
//! https://valhalla.github.io/valhalla/api/turn-by-turn/api-reference/

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProviderError, ProviderRoute, RoutingProvider};
use crate::types::Coordinates;

/// Valhalla client configuration
#[derive(Debug, Clone)]
pub struct ValhallaConfig {
    /// Base URL of Valhalla server (e.g., "http://localhost:8002")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout_seconds: 5,
        }
    }
}

impl ValhallaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Valhalla routing client
pub struct ValhallaClient {
    client: Client,
    config: ValhallaConfig,
}

impl ValhallaClient {
    pub fn new(config: ValhallaConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Build the route request for one directed leg
    fn build_route_request(&self, from: &Coordinates, to: &Coordinates) -> RouteRequest {
        let locs = vec![
            ValhallaLocation {
                lat: from.lat,
                lon: from.lng,
                // 500m radius – tolerates geocoded coordinates that are
                // slightly off-road (building centroid vs road edge)
                radius: Some(500),
            },
            ValhallaLocation {
                lat: to.lat,
                lon: to.lng,
                radius: Some(500),
            },
        ];

        RouteRequest {
            locations: locs,
            costing: "auto".to_string(),
            units: "kilometers".to_string(),
            directions_type: "none".to_string(), // We only need geometry, not turn-by-turn
        }
    }
}

#[async_trait]
impl RoutingProvider for ValhallaClient {
    async fn route(
        &self,
        from: &Coordinates,
        to: &Coordinates,
    ) -> Result<ProviderRoute, ProviderError> {
        let request = self.build_route_request(from, to);
        let url = format!("{}/route", self.config.base_url);

        debug!("Requesting leg route from Valhalla");

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let route_response: RouteResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Payload(e.to_string()))?;

        let trip = route_response.trip;
        if trip.legs.is_empty() {
            return Err(ProviderError::NoRoute);
        }

        // Concatenate geometry from all legs, skipping the first point of
        // subsequent legs (it duplicates the previous leg's last point)
        let mut geometry: Vec<Coordinates> = Vec::new();
        for (i, leg) in trip.legs.iter().enumerate() {
            let leg_coords = decode_polyline(&leg.shape, 6)?;
            if i == 0 {
                geometry.extend(leg_coords);
            } else {
                geometry.extend(leg_coords.into_iter().skip(1));
            }
        }

        debug!(
            "Received leg route: {:.1} km, {:.0} s, {} shape points",
            trip.summary.length,
            trip.summary.time,
            geometry.len()
        );

        Ok(ProviderRoute {
            distance_km: trip.summary.length,
            duration_min: trip.summary.time / 60.0,
            geometry,
        })
    }

    fn name(&self) -> &str {
        "Valhalla"
    }
}

// Valhalla API types

#[derive(Debug, Serialize)]
struct RouteRequest {
    locations: Vec<ValhallaLocation>,
    costing: String,
    units: String,
    directions_type: String,
}

#[derive(Debug, Serialize, Clone)]
struct ValhallaLocation {
    lat: f64,
    lon: f64,
    /// Radius in meters for snapping to roads
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    trip: Trip,
}

#[derive(Debug, Deserialize)]
struct Trip {
    legs: Vec<Leg>,
    summary: TripSummary,
}

#[derive(Debug, Deserialize)]
struct TripSummary {
    /// Trip length in kilometers (when units="kilometers")
    length: f64,
    /// Trip time in seconds
    time: f64,
}

#[derive(Debug, Deserialize)]
struct Leg {
    /// Encoded polyline shape
    shape: String,
}

/// Decode Valhalla's encoded polyline format
/// Precision is 6 decimal places for Valhalla (vs 5 for Google)
fn decode_polyline(encoded: &str, precision: u32) -> Result<Vec<Coordinates>, ProviderError> {
    let factor = 10_f64.powi(precision as i32);
    let mut coordinates = Vec::new();
    let mut lat = 0i64;
    let mut lng = 0i64;

    let bytes = encoded.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        // Decode latitude
        let mut shift = 0;
        let mut result = 0i64;
        loop {
            if i >= bytes.len() {
                return Err(ProviderError::Payload("invalid polyline encoding".to_string()));
            }
            let byte = bytes[i] as i64 - 63;
            i += 1;
            result |= (byte & 0x1f) << shift;
            shift += 5;
            if byte < 0x20 {
                break;
            }
        }
        let dlat = if result & 1 != 0 {
            !(result >> 1)
        } else {
            result >> 1
        };
        lat += dlat;

        // Decode longitude
        shift = 0;
        result = 0;
        loop {
            if i >= bytes.len() {
                return Err(ProviderError::Payload("invalid polyline encoding".to_string()));
            }
            let byte = bytes[i] as i64 - 63;
            i += 1;
            result |= (byte & 0x1f) << shift;
            shift += 5;
            if byte < 0x20 {
                break;
            }
        }
        let dlng = if result & 1 != 0 {
            !(result >> 1)
        } else {
            result >> 1
        };
        lng += dlng;

        coordinates.push(Coordinates {
            lat: lat as f64 / factor,
            lng: lng as f64 / factor,
        });
    }

    Ok(coordinates)
}
