//! Itinerary planning pipeline
//!
//! Orchestrates one optimization request end to end: resolve coordinates,
//! evaluate the caller's original stop order, run the exhaustive search per
//! objective, attach arrival-time schedules, and summarize savings. The leg
//! oracle is created here and dies with the request, so nothing from one
//! request's cache can reach another request.

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::warn;

use crate::defaults;
use crate::services::evaluator::{self, RouteEvaluation};
use crate::services::geocoding::Geocoder;
use crate::services::legs::LegOracle;
use crate::services::optimizer;
use crate::services::routing::RoutingProvider;
use crate::services::schedule;
use crate::types::{
    Coordinates, EtaEntry, Itinerary, Location, Objective, OptimizeRequest, OptimizeResponse,
    SavingsSummary, Waypoint,
};

/// Per-deployment planning knobs (shared, read-only)
#[derive(Debug, Clone)]
pub struct PlannerSettings {
    /// Maximum number of intermediate stops accepted per request
    pub max_stops: usize,
    /// Dwell time at each intermediate stop, in minutes
    pub service_time_minutes: i64,
    /// Coordinate substituted when geocoding fails
    pub fallback_coordinates: Coordinates,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_stops: defaults::DEFAULT_MAX_STOPS,
            service_time_minutes: defaults::DEFAULT_SERVICE_TIME_MINUTES,
            fallback_coordinates: defaults::fallback_coordinates(),
        }
    }
}

/// Request rejections. Everything else (provider outages, geocode misses)
/// degrades inside the pipeline and surfaces as warnings, not errors.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{0} needs an address or coordinates")]
    UnresolvablePlace(String),
    #[error("{place} coordinates out of range: ({lat}, {lng})")]
    InvalidCoordinate { place: String, lat: f64, lng: f64 },
    #[error("{count} stops exceed the limit of {limit}; the exhaustive search grows factorially")]
    TooManyStops { count: usize, limit: usize },
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percent reduction from `original` to `optimized`, 0 for a zero baseline
fn savings_percent(original: f64, optimized: f64) -> f64 {
    if original <= 0.0 {
        return 0.0;
    }
    round1((original - optimized) / original * 100.0)
}

/// Resolve one request place into a Location, geocoding when only an
/// address was given. A geocode miss or geocoder error substitutes the
/// configured fallback coordinate and records a warning; it never fails
/// the request.
async fn resolve_place(
    input_address: Option<&str>,
    input_coords: Option<Coordinates>,
    place: &str,
    geocoder: &dyn Geocoder,
    fallback: Coordinates,
    warnings: &mut Vec<String>,
) -> Result<Location, PlanError> {
    if let Some(coords) = input_coords {
        if !coords.is_valid() {
            return Err(PlanError::InvalidCoordinate {
                place: place.to_string(),
                lat: coords.lat,
                lng: coords.lng,
            });
        }
        return Ok(Location {
            address: input_address.map(str::to_string),
            coordinates: coords,
        });
    }

    let address = input_address.map(str::trim).filter(|a| !a.is_empty());
    let Some(address) = address else {
        return Err(PlanError::UnresolvablePlace(place.to_string()));
    };

    match geocoder.resolve(address).await {
        Ok(Some(resolved)) => Ok(Location {
            address: Some(resolved.display_name),
            coordinates: resolved.coordinates,
        }),
        Ok(None) => {
            warn!("No geocoding match for {} ('{}'), using fallback coordinate", place, address);
            warnings.push(format!(
                "{}: address '{}' could not be geocoded; fallback coordinate used",
                place, address
            ));
            Ok(Location {
                address: Some(address.to_string()),
                coordinates: fallback,
            })
        }
        Err(e) => {
            warn!("Geocoder failed for {} ('{}'): {}; using fallback coordinate", place, address, e);
            warnings.push(format!(
                "{}: geocoding unavailable for '{}'; fallback coordinate used",
                place, address
            ));
            Ok(Location {
                address: Some(address.to_string()),
                coordinates: fallback,
            })
        }
    }
}

fn build_itinerary(
    variant: &str,
    path: &[Location],
    evaluation: &RouteEvaluation,
    etas: Vec<EtaEntry>,
) -> Itinerary {
    let total = path.len();
    let waypoints = path
        .iter()
        .enumerate()
        .map(|(i, location)| Waypoint {
            label: schedule::waypoint_label(i, total),
            address: location.address.clone(),
            coordinates: location.coordinates,
        })
        .collect();

    Itinerary {
        variant: variant.to_string(),
        waypoints,
        distance_km: round2(evaluation.distance_km),
        duration_minutes: round1(evaluation.duration_min),
        carbon_kg: round2(evaluation.carbon_kg),
        geometry: evaluation.geometry.iter().map(|c| [c.lng, c.lat]).collect(),
        etas,
    }
}

/// Plan one optimization request.
pub async fn plan(
    request: &OptimizeRequest,
    geocoder: &dyn Geocoder,
    provider: &dyn RoutingProvider,
    settings: &PlannerSettings,
    now: NaiveDateTime,
) -> Result<OptimizeResponse, PlanError> {
    if request.stops.len() > settings.max_stops {
        return Err(PlanError::TooManyStops {
            count: request.stops.len(),
            limit: settings.max_stops,
        });
    }

    let mut warnings = Vec::new();

    let origin = resolve_place(
        request.origin.address(),
        request.origin.coords(),
        "origin",
        geocoder,
        settings.fallback_coordinates,
        &mut warnings,
    )
    .await?;

    let destination = resolve_place(
        request.destination.address(),
        request.destination.coords(),
        "destination",
        geocoder,
        settings.fallback_coordinates,
        &mut warnings,
    )
    .await?;

    let mut stops = Vec::with_capacity(request.stops.len());
    for (i, stop) in request.stops.iter().enumerate() {
        let place = format!("stop {}", i + 1);
        stops.push(
            resolve_place(
                stop.address(),
                stop.coords(),
                &place,
                geocoder,
                settings.fallback_coordinates,
                &mut warnings,
            )
            .await?,
        );
    }

    // Objectives in caller order, deduplicated; both when unspecified
    let mut objectives: Vec<Objective> = Vec::new();
    for objective in request
        .objectives
        .clone()
        .filter(|list| !list.is_empty())
        .unwrap_or_else(|| vec![Objective::Fastest, Objective::Eco])
    {
        if !objectives.contains(&objective) {
            objectives.push(objective);
        }
    }

    // One oracle per request; warm it so the search never waits on the network
    let oracle = LegOracle::new(provider);
    let mut points: Vec<Coordinates> = Vec::with_capacity(stops.len() + 2);
    points.push(origin.coordinates);
    points.extend(stops.iter().map(|s| s.coordinates));
    points.push(destination.coordinates);
    oracle.prime(&points).await;

    let mut original_path = Vec::with_capacity(stops.len() + 2);
    original_path.push(origin.clone());
    original_path.extend(stops.iter().cloned());
    original_path.push(destination.clone());

    let original_eval = evaluator::evaluate(&original_path, &oracle).await;

    let best = optimizer::optimize(&origin, &stops, &destination, &objectives, &oracle).await;

    let start = schedule::parse_start_time(request.start_time.as_deref(), now);

    let original_etas =
        schedule::compute_etas(&original_path, &oracle, start, settings.service_time_minutes).await;
    let original = build_itinerary("original", &original_path, &original_eval, original_etas);

    // One itinerary per distinct ordering: an objective whose optimum
    // coincides with an earlier variant is not repeated
    let mut optimized: Vec<(Itinerary, RouteEvaluation)> = Vec::new();
    for objective in &objectives {
        let Some(route) = best.get(objective) else { continue };
        if optimized
            .iter()
            .any(|(reported, _)| reported_ordering_matches(reported, &route.path))
        {
            continue;
        }
        let etas =
            schedule::compute_etas(&route.path, &oracle, start, settings.service_time_minutes)
                .await;
        let itinerary = build_itinerary(objective.as_str(), &route.path, &route.evaluation, etas);
        optimized.push((itinerary, route.evaluation.clone()));
    }

    // Savings against the best optimized value per metric
    let savings = if optimized.is_empty() {
        SavingsSummary { distance_percent: 0.0, duration_percent: 0.0, carbon_percent: 0.0 }
    } else {
        let best_distance = optimized
            .iter()
            .map(|(_, e)| e.distance_km)
            .fold(f64::INFINITY, f64::min);
        let best_duration = optimized
            .iter()
            .map(|(_, e)| e.duration_min)
            .fold(f64::INFINITY, f64::min);
        let best_carbon = optimized
            .iter()
            .map(|(_, e)| e.carbon_kg)
            .fold(f64::INFINITY, f64::min);
        SavingsSummary {
            distance_percent: savings_percent(original_eval.distance_km, best_distance),
            duration_percent: savings_percent(original_eval.duration_min, best_duration),
            carbon_percent: savings_percent(original_eval.carbon_kg, best_carbon),
        }
    };

    if oracle.estimated_legs() > 0 {
        warnings.push(format!(
            "routing provider unavailable for {} leg(s); great-circle estimates used",
            oracle.estimated_legs()
        ));
    }

    Ok(OptimizeResponse {
        original,
        optimized: optimized.into_iter().map(|(itinerary, _)| itinerary).collect(),
        savings,
        warnings,
    })
}

fn reported_ordering_matches(reported: &Itinerary, path: &[Location]) -> bool {
    reported.waypoints.len() == path.len()
        && reported
            .waypoints
            .iter()
            .zip(path)
            .all(|(w, l)| {
                (w.coordinates.lat - l.coordinates.lat).abs() < 1e-9
                    && (w.coordinates.lng - l.coordinates.lng).abs() < 1e-9
            })
}
