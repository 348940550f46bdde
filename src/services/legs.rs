//! Leg oracle: memoized travel metrics for directed coordinate pairs
//!
//! One oracle is created per optimization request and discarded with it;
//! cached geometry and durations must never leak into another request. Within
//! a request the permutation search asks for the same legs over and over, so
//! every resolved leg is cached under a direction-sensitive key. A leg A→B is
//! never reused for B→A: road geometry and one-way constraints differ.
//!
//! Provider failures never propagate. Any failed call degrades to a
//! great-circle estimate at the assumed speed, and the degraded leg is cached
//! too so a known-bad call is not retried within the request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::StreamExt;
use parking_lot::Mutex;
use tracing::warn;

use crate::services::geo;
use crate::services::routing::RoutingProvider;
use crate::types::Coordinates;

/// How many legs may be resolved against the provider at once while priming
const PRIME_CONCURRENCY: usize = 8;

/// Travel metrics for one directed leg
#[derive(Debug, Clone)]
pub struct Leg {
    pub distance_km: f64,
    pub duration_min: f64,
    /// Path geometry in travel direction
    pub geometry: Vec<Coordinates>,
    pub source: LegSource,
}

/// Where a leg's metrics came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegSource {
    /// Road-network route from the external provider
    Provider,
    /// Great-circle estimate (provider unavailable or failed)
    Estimated,
}

/// Cache key: endpoints quantized to micro-degrees, direction preserved
type LegKey = (i64, i64, i64, i64);

fn leg_key(from: &Coordinates, to: &Coordinates) -> LegKey {
    const SCALE: f64 = 1e6;
    (
        (from.lat * SCALE).round() as i64,
        (from.lng * SCALE).round() as i64,
        (to.lat * SCALE).round() as i64,
        (to.lng * SCALE).round() as i64,
    )
}

/// Per-request leg oracle
pub struct LegOracle<'a> {
    provider: &'a dyn RoutingProvider,
    cache: Mutex<HashMap<LegKey, Leg>>,
    estimated: AtomicUsize,
}

impl<'a> LegOracle<'a> {
    pub fn new(provider: &'a dyn RoutingProvider) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
            estimated: AtomicUsize::new(0),
        }
    }

    /// Resolve one directed leg, from cache when possible.
    ///
    /// Two tasks racing on the same uncached key may both query the provider;
    /// the duplicate result is identical, so last write wins.
    pub async fn leg(&self, from: &Coordinates, to: &Coordinates) -> Leg {
        let key = leg_key(from, to);
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.clone();
        }

        let leg = match self.provider.route(from, to).await {
            Ok(route) => {
                let geometry = if route.geometry.len() < 2 {
                    vec![*from, *to]
                } else {
                    route.geometry
                };
                Leg {
                    distance_km: route.distance_km,
                    duration_min: route.duration_min,
                    geometry,
                    source: LegSource::Provider,
                }
            }
            Err(e) => {
                warn!("Routing provider failed, using great-circle estimate: {}", e);
                self.estimated.fetch_add(1, Ordering::Relaxed);
                let distance_km = geo::haversine_distance(from, to);
                Leg {
                    distance_km,
                    duration_min: geo::fallback_duration_minutes(distance_km),
                    geometry: vec![*from, *to],
                    source: LegSource::Estimated,
                }
            }
        };

        self.cache.lock().insert(key, leg.clone());
        leg
    }

    /// Warm the cache for every directed pair among `points`.
    ///
    /// Provider calls run concurrently with bounded fan-out, so the
    /// permutation search that follows operates on a warm cache and the
    /// number of external calls stays bounded by the number of unique
    /// directed pairs, not by the number of permutations.
    pub async fn prime(&self, points: &[Coordinates]) {
        let mut pairs = Vec::new();
        for (i, from) in points.iter().enumerate() {
            for (j, to) in points.iter().enumerate() {
                if i != j {
                    pairs.push((*from, *to));
                }
            }
        }

        futures::stream::iter(pairs)
            .for_each_concurrent(PRIME_CONCURRENCY, |(from, to)| async move {
                self.leg(&from, &to).await;
            })
            .await;
    }

    /// Number of cached legs
    pub fn cached_legs(&self) -> usize {
        self.cache.lock().len()
    }

    /// Number of legs resolved by great-circle estimate instead of the provider
    pub fn estimated_legs(&self) -> usize {
        self.estimated.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::routing::{MockRoutingProvider, ProviderError, ProviderRoute};
    use async_trait::async_trait;

    fn prague() -> Coordinates {
        Coordinates { lat: 50.0755, lng: 14.4378 }
    }

    fn brno() -> Coordinates {
        Coordinates { lat: 49.1951, lng: 16.6068 }
    }

    fn ostrava() -> Coordinates {
        Coordinates { lat: 49.8209, lng: 18.2625 }
    }

    /// Counts provider invocations, delegating to the mock
    struct CountingProvider {
        inner: MockRoutingProvider,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                inner: MockRoutingProvider::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl RoutingProvider for CountingProvider {
        async fn route(
            &self,
            from: &Coordinates,
            to: &Coordinates,
        ) -> Result<ProviderRoute, ProviderError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.inner.route(from, to).await
        }

        fn name(&self) -> &str {
            "Counting"
        }
    }

    /// Always fails, as if the routing engine were down
    struct FailingProvider;

    #[async_trait]
    impl RoutingProvider for FailingProvider {
        async fn route(
            &self,
            _from: &Coordinates,
            _to: &Coordinates,
        ) -> Result<ProviderRoute, ProviderError> {
            Err(ProviderError::NoRoute)
        }

        fn name(&self) -> &str {
            "Failing"
        }
    }

    #[tokio::test]
    async fn test_repeated_lookups_hit_provider_once() {
        let provider = CountingProvider::new();
        let oracle = LegOracle::new(&provider);

        let first = oracle.leg(&prague(), &brno()).await;
        let second = oracle.leg(&prague(), &brno()).await;

        assert_eq!(provider.calls(), 1);
        assert_eq!(first.distance_km, second.distance_km);
        assert_eq!(first.source, LegSource::Provider);
    }

    #[tokio::test]
    async fn test_reverse_leg_is_a_distinct_key() {
        let provider = CountingProvider::new();
        let oracle = LegOracle::new(&provider);

        oracle.leg(&prague(), &brno()).await;
        oracle.leg(&brno(), &prague()).await;

        // Direction matters: B→A must be fetched separately from A→B
        assert_eq!(provider.calls(), 2);
        assert_eq!(oracle.cached_legs(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_estimate() {
        let provider = FailingProvider;
        let oracle = LegOracle::new(&provider);

        let leg = oracle.leg(&prague(), &brno()).await;

        assert_eq!(leg.source, LegSource::Estimated);
        let straight = geo::haversine_distance(&prague(), &brno());
        assert!((leg.distance_km - straight).abs() < 1e-9);
        assert!((leg.duration_min - geo::fallback_duration_minutes(straight)).abs() < 1e-9);
        assert_eq!(leg.geometry.len(), 2);
        assert_eq!(oracle.estimated_legs(), 1);
    }

    #[tokio::test]
    async fn test_failed_leg_is_cached_not_retried() {
        struct CountingFailer {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl RoutingProvider for CountingFailer {
            async fn route(
                &self,
                _from: &Coordinates,
                _to: &Coordinates,
            ) -> Result<ProviderRoute, ProviderError> {
                self.calls.fetch_add(1, Ordering::Relaxed);
                Err(ProviderError::NoRoute)
            }

            fn name(&self) -> &str {
                "CountingFailer"
            }
        }

        let provider = CountingFailer { calls: AtomicUsize::new(0) };
        let oracle = LegOracle::new(&provider);

        let first = oracle.leg(&prague(), &brno()).await;
        let second = oracle.leg(&prague(), &brno()).await;

        // The known-bad call must not be re-attempted within the request
        assert_eq!(provider.calls.load(Ordering::Relaxed), 1);
        assert_eq!(first.source, LegSource::Estimated);
        assert_eq!(second.source, LegSource::Estimated);
        assert_eq!(first.distance_km, second.distance_km);
    }

    #[tokio::test]
    async fn test_prime_covers_all_directed_pairs() {
        let provider = CountingProvider::new();
        let oracle = LegOracle::new(&provider);

        oracle.prime(&[prague(), brno(), ostrava()]).await;

        // 3 points → 6 directed pairs
        assert_eq!(oracle.cached_legs(), 6);
        assert_eq!(provider.calls(), 6);

        // Anything the search asks for afterwards is already cached
        oracle.leg(&ostrava(), &prague()).await;
        oracle.leg(&brno(), &ostrava()).await;
        assert_eq!(provider.calls(), 6);
    }

    #[tokio::test]
    async fn test_short_provider_geometry_replaced_by_endpoints() {
        struct PointGeometryProvider;

        #[async_trait]
        impl RoutingProvider for PointGeometryProvider {
            async fn route(
                &self,
                from: &Coordinates,
                _to: &Coordinates,
            ) -> Result<ProviderRoute, ProviderError> {
                Ok(ProviderRoute {
                    distance_km: 1.0,
                    duration_min: 2.0,
                    geometry: vec![*from],
                })
            }

            fn name(&self) -> &str {
                "PointGeometry"
            }
        }

        let provider = PointGeometryProvider;
        let oracle = LegOracle::new(&provider);

        let leg = oracle.leg(&prague(), &brno()).await;
        assert_eq!(leg.geometry.len(), 2);
    }
}
