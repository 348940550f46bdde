//! Route evaluation: reduce an ordered location sequence to totals
//!
//! Sums per-leg distance and duration from the leg oracle, derives the
//! carbon estimate, and stitches leg geometries into one continuous path.

use crate::services::carbon;
use crate::services::legs::LegOracle;
use crate::types::{Coordinates, Location};

/// Aggregated metrics and geometry for one ordered sequence of locations
#[derive(Debug, Clone)]
pub struct RouteEvaluation {
    pub distance_km: f64,
    pub duration_min: f64,
    pub carbon_kg: f64,
    /// Continuous path geometry, duplicate junction vertices removed
    pub geometry: Vec<Coordinates>,
}

/// Evaluate an ordered sequence of locations.
///
/// A sequence of length 0 or 1 has no legs: zero totals and the point
/// itself (if any) as geometry.
pub async fn evaluate(locations: &[Location], oracle: &LegOracle<'_>) -> RouteEvaluation {
    let mut distance_km = 0.0;
    let mut duration_min = 0.0;
    let mut geometry: Vec<Coordinates> = Vec::new();

    if locations.len() < 2 {
        if let Some(only) = locations.first() {
            geometry.push(only.coordinates);
        }
        return RouteEvaluation {
            distance_km,
            duration_min,
            carbon_kg: 0.0,
            geometry,
        };
    }

    for pair in locations.windows(2) {
        let leg = oracle.leg(&pair[0].coordinates, &pair[1].coordinates).await;
        distance_km += leg.distance_km;
        duration_min += leg.duration_min;

        // The first point of every leg after the first duplicates the
        // previous leg's last point
        if geometry.is_empty() {
            geometry.extend(leg.geometry);
        } else {
            geometry.extend(leg.geometry.into_iter().skip(1));
        }
    }

    let carbon_kg = carbon::emission_kg(distance_km, duration_min / 60.0);

    RouteEvaluation {
        distance_km,
        duration_min,
        carbon_kg,
        geometry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::routing::MockRoutingProvider;

    fn loc(lat: f64, lng: f64) -> Location {
        Location {
            address: None,
            coordinates: Coordinates { lat, lng },
        }
    }

    #[tokio::test]
    async fn test_empty_sequence_yields_zeros() {
        let provider = MockRoutingProvider::new();
        let oracle = LegOracle::new(&provider);

        let evaluation = evaluate(&[], &oracle).await;

        assert_eq!(evaluation.distance_km, 0.0);
        assert_eq!(evaluation.duration_min, 0.0);
        assert_eq!(evaluation.carbon_kg, 0.0);
        assert!(evaluation.geometry.is_empty());
    }

    #[tokio::test]
    async fn test_single_location_yields_point_geometry() {
        let provider = MockRoutingProvider::new();
        let oracle = LegOracle::new(&provider);

        let evaluation = evaluate(&[loc(50.0, 14.0)], &oracle).await;

        assert_eq!(evaluation.distance_km, 0.0);
        assert_eq!(evaluation.carbon_kg, 0.0);
        assert_eq!(evaluation.geometry.len(), 1);
    }

    #[tokio::test]
    async fn test_totals_accumulate_over_legs() {
        let provider = MockRoutingProvider::new();
        let oracle = LegOracle::new(&provider);

        let a = loc(50.0, 14.0);
        let b = loc(50.0, 15.0);
        let c = loc(50.0, 16.0);

        let ab = oracle.leg(&a.coordinates, &b.coordinates).await;
        let bc = oracle.leg(&b.coordinates, &c.coordinates).await;

        let evaluation = evaluate(&[a, b, c], &oracle).await;

        assert!((evaluation.distance_km - (ab.distance_km + bc.distance_km)).abs() < 1e-9);
        assert!((evaluation.duration_min - (ab.duration_min + bc.duration_min)).abs() < 1e-9);
        assert!(evaluation.carbon_kg > 0.0);
    }

    #[tokio::test]
    async fn test_stitched_geometry_has_no_duplicate_junction() {
        let provider = MockRoutingProvider::new();
        let oracle = LegOracle::new(&provider);

        let a = loc(50.0, 14.0);
        let b = loc(50.0, 15.0);
        let c = loc(50.0, 16.0);

        let evaluation = evaluate(&[a, b, c], &oracle).await;

        // Mock legs contribute 2 points each; the B junction appears once
        assert_eq!(evaluation.geometry.len(), 3);
        for pair in evaluation.geometry.windows(2) {
            assert!(
                (pair[0].lat - pair[1].lat).abs() > 1e-12
                    || (pair[0].lng - pair[1].lng).abs() > 1e-12,
                "adjacent duplicate vertex in stitched geometry"
            );
        }
    }

    #[tokio::test]
    async fn test_carbon_uses_duration_hours() {
        let provider = MockRoutingProvider::new();
        let oracle = LegOracle::new(&provider);

        let a = loc(50.0, 14.0);
        let b = loc(50.0, 15.0);

        let evaluation = evaluate(&[a, b], &oracle).await;

        let expected = crate::services::carbon::emission_kg(
            evaluation.distance_km,
            evaluation.duration_min / 60.0,
        );
        assert!((evaluation.carbon_kg - expected).abs() < 1e-9);
    }
}
