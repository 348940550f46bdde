//! Configuration management

use anyhow::Result;

use crate::defaults;
use crate::types::Coordinates;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// Nominatim API URL (for geocoding)
    pub nominatim_url: String,

    /// Valhalla routing engine URL (optional, falls back to great-circle
    /// estimates if unavailable)
    pub valhalla_url: Option<String>,

    /// Maximum number of intermediate stops accepted per request
    pub max_stops: usize,

    /// Dwell time at each intermediate stop, in minutes
    pub service_time_minutes: i64,

    /// Coordinate substituted when geocoding fails
    pub fallback_coordinates: Coordinates,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let nominatim_url = std::env::var("NOMINATIM_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string());

        let valhalla_url = std::env::var("VALHALLA_URL").ok();

        let max_stops = std::env::var("MAX_STOPS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults::DEFAULT_MAX_STOPS);

        let service_time_minutes = std::env::var("SERVICE_TIME_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults::DEFAULT_SERVICE_TIME_MINUTES);

        let fallback_coordinates = match (
            std::env::var("FALLBACK_LAT").ok().and_then(|s| s.parse().ok()),
            std::env::var("FALLBACK_LNG").ok().and_then(|s| s.parse().ok()),
        ) {
            (Some(lat), Some(lng)) => Coordinates { lat, lng },
            _ => defaults::fallback_coordinates(),
        };

        Ok(Self {
            nats_url,
            nominatim_url,
            valhalla_url,
            max_stops,
            service_time_minutes,
            fallback_coordinates,
        })
    }
}
