use crate::types::Coordinates;

/// Dwell time assumed at each intermediate stop (not origin or destination).
pub const DEFAULT_SERVICE_TIME_MINUTES: i64 = 15;

/// Upper bound on intermediate stops accepted by the optimizer.
///
/// The search is exhaustive (n! orderings), so this must stay small.
pub const DEFAULT_MAX_STOPS: usize = 8;

/// Coordinate substituted when an address cannot be geocoded (central Prague).
pub fn fallback_coordinates() -> Coordinates {
    Coordinates { lat: 50.0755, lng: 14.4378 }
}
