use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clinker_core::{Plant, PlantType, TransportMode};
use clinker_routing::{
    BackoffStrategy, Coordinate, ProviderError, ProviderRoute, RetryPolicy, RouteProvider,
    RoutingError, RoutingResolver,
};
use sqlx::sqlite::SqlitePoolOptions;

async fn memory_pool_with_plants(plants: &[Plant]) -> sqlx::Pool<sqlx::Sqlite> {
    let pool = SqlitePoolOptions::new().connect(":memory:").await.unwrap();
    clinker_db::schema::init_schema(&pool).await.unwrap();
    for plant in plants {
        clinker_db::canonical::upsert_plant(&pool, plant).await.unwrap();
    }
    pool
}

fn plant(id: &str, lat: f64, lon: f64) -> Plant {
    Plant {
        plant_id: id.to_string(),
        name: id.to_string(),
        plant_type: PlantType::Clinker,
        latitude: Some(lat),
        longitude: Some(lon),
        region: None,
        country: None,
    }
}

struct FlakyThenSucceeds {
    calls: AtomicU32,
    fail_times: u32,
}

#[async_trait]
impl RouteProvider for FlakyThenSucceeds {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn route(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> Result<ProviderRoute, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_times {
            Err(ProviderError::Transient("timeout".to_string()))
        } else {
            Ok(ProviderRoute { distance_km: 120.0, duration_minutes: 90.0 })
        }
    }
}

struct AlwaysPermanentFailure;

#[async_trait]
impl RouteProvider for AlwaysPermanentFailure {
    fn name(&self) -> &str {
        "dead"
    }

    async fn route(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> Result<ProviderRoute, ProviderError> {
        Err(ProviderError::Permanent("not found".to_string()))
    }
}

fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        strategy: BackoffStrategy::Constant,
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        jitter: 0.0,
    }
}

#[tokio::test]
async fn resolves_after_transient_failures_and_caches() {
    let pool = memory_pool_with_plants(&[plant("P1", 1.0, 1.0), plant("P2", 2.0, 2.0)]).await;
    let provider = Arc::new(FlakyThenSucceeds { calls: AtomicU32::new(0), fail_times: 2 });
    let resolver = RoutingResolver::new(pool.clone(), vec![provider], fast_retry_policy());

    let route = resolver.resolve("P1", "P2", TransportMode::Road).await.unwrap();
    assert_eq!(route.distance_km, 120.0);

    let cached = clinker_db::route_cache::lookup(&pool, "P1", "P2", TransportMode::Road)
        .await
        .unwrap();
    assert!(cached.is_some());
}

#[tokio::test]
async fn falls_through_to_second_provider_on_permanent_failure() {
    let pool = memory_pool_with_plants(&[plant("P1", 1.0, 1.0), plant("P2", 2.0, 2.0)]).await;
    let dead = Arc::new(AlwaysPermanentFailure);
    let good = Arc::new(FlakyThenSucceeds { calls: AtomicU32::new(0), fail_times: 0 });
    let resolver = RoutingResolver::new(pool, vec![dead, good], fast_retry_policy());

    let route = resolver.resolve("P1", "P2", TransportMode::Road).await.unwrap();
    assert_eq!(route.duration_minutes, 90.0);
}

#[tokio::test]
async fn missing_coordinates_is_an_error() {
    let pool = memory_pool_with_plants(&[plant("P1", 1.0, 1.0)]).await;
    let resolver = RoutingResolver::new(pool, vec![], fast_retry_policy());

    let err = resolver.resolve("P1", "UNKNOWN", TransportMode::Road).await.unwrap_err();
    assert!(matches!(err, RoutingError::CoordinateMissing { .. }));
}
