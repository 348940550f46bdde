//! Routing provider abstraction
//!
//! Resolves a single directed leg between two coordinates into road-network
//! distance, duration, and path geometry. Valhalla for production, mock for
//! tests and offline development. Providers are consumed exclusively through
//! the leg oracle, which handles memoization and failure fallback.

mod valhalla;

pub use valhalla::{ValhallaClient, ValhallaConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::services::geo;
use crate::types::Coordinates;

/// Road-network route for one directed leg
#[derive(Debug, Clone)]
pub struct ProviderRoute {
    pub distance_km: f64,
    pub duration_min: f64,
    /// Path geometry from start to end, in travel direction
    pub geometry: Vec<Coordinates>,
}

/// Why a provider call produced no usable route
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed provider payload: {0}")]
    Payload(String),
    #[error("provider returned no route")]
    NoRoute,
}

/// Routing provider trait (Valhalla, mock, etc.)
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Resolve one directed leg. Geometry is directional and must not be
    /// reused for the reverse leg.
    async fn route(&self, from: &Coordinates, to: &Coordinates)
        -> Result<ProviderRoute, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Mock routing provider for tests and offline use.
/// Estimates road distance as Haversine × coefficient.
pub struct MockRoutingProvider {
    /// Coefficient for converting straight-line to road distance (default: 1.3)
    road_coefficient: f64,
    /// Average speed in km/h for time estimation (default: 40)
    average_speed_kmh: f64,
}

impl Default for MockRoutingProvider {
    fn default() -> Self {
        Self {
            road_coefficient: 1.3,
            average_speed_kmh: 40.0,
        }
    }
}

impl MockRoutingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(road_coefficient: f64, average_speed_kmh: f64) -> Self {
        Self {
            road_coefficient,
            average_speed_kmh,
        }
    }
}

#[async_trait]
impl RoutingProvider for MockRoutingProvider {
    async fn route(
        &self,
        from: &Coordinates,
        to: &Coordinates,
    ) -> Result<ProviderRoute, ProviderError> {
        let road_km = geo::haversine_distance(from, to) * self.road_coefficient;
        let duration_min = (road_km / self.average_speed_kmh) * 60.0;

        Ok(ProviderRoute {
            distance_km: road_km,
            duration_min,
            geometry: vec![*from, *to],
        })
    }

    fn name(&self) -> &str {
        "MockRouting"
    }
}

/// Create routing provider based on configuration
pub fn create_routing_provider(valhalla_url: Option<&str>) -> Box<dyn RoutingProvider> {
    use tracing::info;

    match valhalla_url {
        Some(url) => {
            info!("Using Valhalla routing provider at {}", url);
            Box::new(ValhallaClient::new(ValhallaConfig::new(url)))
        }
        None => {
            info!("Using mock routing provider (Valhalla not configured)");
            Box::new(MockRoutingProvider::new())
        }
    }
}
