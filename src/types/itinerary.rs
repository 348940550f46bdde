//! Itinerary optimization request/response payloads

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Coordinates, PlaceInput};

/// Optimization objective.
///
/// `Eco` is defined as minimum total distance (the dominant term of the
/// emission model); `Fastest` as minimum total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Fastest,
    Eco,
}

impl Objective {
    pub const fn as_str(self) -> &'static str {
        match self {
            Objective::Fastest => "fastest",
            Objective::Eco => "eco",
        }
    }
}

/// Request to compute optimized itineraries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub origin: PlaceInput,
    pub destination: PlaceInput,
    #[serde(default)]
    pub stops: Vec<PlaceInput>,
    /// Departure time: RFC 3339 timestamp or bare "HH:MM" (today).
    /// Unparseable or absent values default to the current time.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Objectives to optimize for; both when absent.
    #[serde(default)]
    pub objectives: Option<Vec<Objective>>,
}

/// A waypoint of a computed itinerary, labeled by visiting order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub label: String,
    pub address: Option<String>,
    pub coordinates: Coordinates,
}

/// Estimated time of arrival at one waypoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaEntry {
    pub label: String,
    pub arrival: NaiveDateTime,
}

/// One computed itinerary variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    /// "original", "fastest" or "eco"
    pub variant: String,
    /// Waypoints in visiting order
    pub waypoints: Vec<Waypoint>,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub carbon_kg: f64,
    /// Route geometry as GeoJSON coordinates [[lng, lat], ...]
    pub geometry: Vec<[f64; 2]>,
    pub etas: Vec<EtaEntry>,
}

/// Percent reduction of the best optimized itinerary against the original.
/// Each field is 0 when the original metric is 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsSummary {
    pub distance_percent: f64,
    pub duration_percent: f64,
    pub carbon_percent: f64,
}

/// Response from itinerary optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub original: Itinerary,
    /// One entry per distinct optimized ordering. Objectives whose optimal
    /// ordering coincides with an earlier variant are not repeated.
    pub optimized: Vec<Itinerary>,
    pub savings: SavingsSummary,
    #[serde(default)]
    pub warnings: Vec<String>,
}
