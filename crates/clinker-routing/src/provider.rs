//! The routing provider seam. OSRM/ORS HTTP clients are external
//! collaborators (§1 out-of-scope); this crate only consumes the
//! interface they implement.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone)]
pub struct ProviderRoute {
    pub distance_km: f64,
    pub duration_minutes: f64,
}

/// Whether a provider failure should be retried against the same
/// provider, or should fall through to the next provider in the chain.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// Network error, 5xx, or timeout — retry with backoff.
    Transient(String),
    /// 4xx, not-found, or an unparsable response — try the next provider.
    Permanent(String),
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn route(&self, origin: Coordinate, destination: Coordinate)
        -> Result<ProviderRoute, ProviderError>;
}
