//! Arrival-time estimation for a chosen visiting order
//!
//! Walks the legs of a finished itinerary from a departure time, adding each
//! leg's travel time plus a fixed dwell time at every intermediate stop. No
//! dwell is added after the final leg into the destination.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::services::legs::LegOracle;
use crate::types::{EtaEntry, Location};

/// Label for a waypoint by its position in the visiting order
pub fn waypoint_label(position: usize, total: usize) -> String {
    if position == 0 {
        "Origin".to_string()
    } else if position + 1 == total {
        "Destination".to_string()
    } else {
        format!("Stop {}", position)
    }
}

/// Parse the requested departure time.
///
/// Accepts an RFC 3339 timestamp, a date-time without offset, or a bare
/// "HH:MM" interpreted as today. Anything unparseable (or absent) falls back
/// to `now`.
pub fn parse_start_time(raw: Option<&str>, now: NaiveDateTime) -> NaiveDateTime {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return now;
    };

    if let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(raw) {
        return timestamp.naive_local();
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return timestamp;
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return timestamp;
    }
    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return now.date().and_time(time);
    }

    now
}

/// Compute an arrival time per waypoint.
///
/// Departure from position 0 is `start`; each subsequent arrival advances by
/// the leg duration, and `service_minutes` of dwell is added at every
/// intermediate stop before the next departure.
pub async fn compute_etas(
    locations: &[Location],
    oracle: &LegOracle<'_>,
    start: NaiveDateTime,
    service_minutes: i64,
) -> Vec<EtaEntry> {
    let total = locations.len();
    let mut etas = Vec::with_capacity(total);

    if total == 0 {
        return etas;
    }

    etas.push(EtaEntry {
        label: waypoint_label(0, total),
        arrival: start,
    });

    let mut cursor = start;
    for (i, pair) in locations.windows(2).enumerate() {
        let leg = oracle.leg(&pair[0].coordinates, &pair[1].coordinates).await;
        let arrival = cursor + Duration::seconds((leg.duration_min * 60.0).round() as i64);

        etas.push(EtaEntry {
            label: waypoint_label(i + 1, total),
            arrival,
        });

        cursor = arrival;
        let is_intermediate = i + 2 < total;
        if is_intermediate {
            cursor += Duration::minutes(service_minutes);
        }
    }

    etas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::routing::{ProviderError, ProviderRoute, RoutingProvider};
    use crate::types::Coordinates;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn loc(lat: f64) -> Location {
        Location {
            address: None,
            coordinates: Coordinates { lat, lng: 0.0 },
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    /// Leg duration scripted by destination latitude: lat 2.0 → 10 min,
    /// lat 3.0 → 20 min
    struct DurationByLatProvider;

    #[async_trait]
    impl RoutingProvider for DurationByLatProvider {
        async fn route(
            &self,
            from: &Coordinates,
            to: &Coordinates,
        ) -> Result<ProviderRoute, ProviderError> {
            let duration_min = to.lat * 10.0 - 10.0;
            Ok(ProviderRoute {
                distance_km: duration_min,
                duration_min,
                geometry: vec![*from, *to],
            })
        }

        fn name(&self) -> &str {
            "DurationByLat"
        }
    }

    #[test]
    fn test_waypoint_labels() {
        assert_eq!(waypoint_label(0, 4), "Origin");
        assert_eq!(waypoint_label(1, 4), "Stop 1");
        assert_eq!(waypoint_label(2, 4), "Stop 2");
        assert_eq!(waypoint_label(3, 4), "Destination");
        // Direct origin→destination trip
        assert_eq!(waypoint_label(1, 2), "Destination");
    }

    #[test]
    fn test_parse_start_time_bare_hour_minute_is_today() {
        let now = at(12, 0);
        let parsed = parse_start_time(Some("09:30"), now);
        assert_eq!(parsed, at(9, 30));
    }

    #[test]
    fn test_parse_start_time_full_timestamp() {
        let now = at(12, 0);
        let parsed = parse_start_time(Some("2026-03-10T06:15:00"), now);
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap().and_hms_opt(6, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_start_time_rfc3339() {
        let now = at(12, 0);
        let parsed = parse_start_time(Some("2026-03-10T06:15:00+02:00"), now);
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap().and_hms_opt(6, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_start_time_garbage_falls_back_to_now() {
        let now = at(12, 0);
        assert_eq!(parse_start_time(Some("yesterday-ish"), now), now);
        assert_eq!(parse_start_time(Some(""), now), now);
        assert_eq!(parse_start_time(None, now), now);
    }

    #[tokio::test]
    async fn test_known_leg_durations_and_service_time() {
        // Legs: origin→stop = 10 min, stop→destination = 20 min.
        // Service 15 min at the stop only.
        let provider = DurationByLatProvider;
        let oracle = LegOracle::new(&provider);

        let route = vec![loc(1.0), loc(2.0), loc(3.0)];
        let etas = compute_etas(&route, &oracle, at(9, 0), 15).await;

        assert_eq!(etas.len(), 3);
        assert_eq!(etas[0].label, "Origin");
        assert_eq!(etas[0].arrival, at(9, 0));
        assert_eq!(etas[1].label, "Stop 1");
        assert_eq!(etas[1].arrival, at(9, 10));
        // 09:10 + 15 service + 20 travel = 09:45; no dwell after arrival
        assert_eq!(etas[2].label, "Destination");
        assert_eq!(etas[2].arrival, at(9, 45));
    }

    #[tokio::test]
    async fn test_no_service_time_on_direct_trip() {
        let provider = DurationByLatProvider;
        let oracle = LegOracle::new(&provider);

        let route = vec![loc(1.0), loc(3.0)];
        let etas = compute_etas(&route, &oracle, at(8, 0), 15).await;

        assert_eq!(etas.len(), 2);
        // Direct leg of 20 min, no dwell anywhere
        assert_eq!(etas[1].arrival, at(8, 20));
    }

    #[tokio::test]
    async fn test_single_location_schedule() {
        let provider = DurationByLatProvider;
        let oracle = LegOracle::new(&provider);

        let etas = compute_etas(&[loc(1.0)], &oracle, at(8, 0), 15).await;

        assert_eq!(etas.len(), 1);
        assert_eq!(etas[0].arrival, at(8, 0));
    }

    #[tokio::test]
    async fn test_schedule_crosses_midnight() {
        let provider = DurationByLatProvider;
        let oracle = LegOracle::new(&provider);

        let route = vec![loc(1.0), loc(3.0)];
        let etas = compute_etas(&route, &oracle, at(23, 50), 15).await;

        let next_day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap().and_hms_opt(0, 10, 0).unwrap();
        assert_eq!(etas[1].arrival, next_day);
    }
}
