//! Carbon emission estimation
//!
//! Linear approximation for a heavy-goods vehicle: a per-kilometer fuel-burn
//! term plus a per-hour term covering idling and auxiliary loads. This is an
//! estimate for comparing route alternatives, not a combustion model.

/// Emitted kg CO2 per driven kilometer (heavy-goods vehicle average)
pub const DISTANCE_FACTOR_KG_PER_KM: f64 = 0.265;

/// Emitted kg CO2 per hour on the road (idling, auxiliary loads)
pub const IDLE_FACTOR_KG_PER_HOUR: f64 = 2.1;

/// Estimate emitted mass in kg for a route
pub fn emission_kg(distance_km: f64, duration_hours: f64) -> f64 {
    distance_km * DISTANCE_FACTOR_KG_PER_KM + duration_hours * IDLE_FACTOR_KG_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emission_zero_route() {
        assert_eq!(emission_kg(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_emission_scales_with_distance() {
        let short = emission_kg(100.0, 2.0);
        let long = emission_kg(200.0, 2.0);
        assert!((long - short - 100.0 * DISTANCE_FACTOR_KG_PER_KM).abs() < 1e-9);
    }

    #[test]
    fn test_emission_includes_duration_term() {
        // Same distance, longer time on the road emits more
        let flowing = emission_kg(100.0, 1.5);
        let congested = emission_kg(100.0, 3.0);
        assert!(congested > flowing);
        assert!((congested - flowing - 1.5 * IDLE_FACTOR_KG_PER_HOUR).abs() < 1e-9);
    }
}
