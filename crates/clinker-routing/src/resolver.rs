//! Routing Resolver: cache lookup, coordinate resolution, provider
//! fallback with retry/backoff, and cache writeback (§4.4).

use std::sync::Arc;

use chrono::Utc;
use clinker_core::{RouteCacheEntry, TransportMode};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

use crate::error::RoutingError;
use crate::provider::{Coordinate, ProviderError, RouteProvider};
use crate::retry::RetryPolicy;

pub struct RoutingResolver {
    pool: Pool<Sqlite>,
    providers: Vec<Arc<dyn RouteProvider>>,
    retry_policy: RetryPolicy,
}

impl RoutingResolver {
    /// `providers` is given in precedence order: secondary-if-credentialed
    /// first when the caller wants that override, else primary first —
    /// the precedence decision is made by the caller building this list.
    pub fn new(pool: Pool<Sqlite>, providers: Vec<Arc<dyn RouteProvider>>, retry_policy: RetryPolicy) -> Self {
        Self { pool, providers, retry_policy }
    }

    pub async fn resolve(
        &self,
        origin_plant_id: &str,
        destination_node_id: &str,
        mode: TransportMode,
    ) -> Result<RouteCacheEntry, RoutingError> {
        if let Some(cached) = clinker_db::route_cache::lookup(
            &self.pool,
            origin_plant_id,
            destination_node_id,
            mode,
        )
        .await?
        {
            if !clinker_db::route_cache::is_expired(&cached) {
                return Ok(cached);
            }
        }

        let origin_coord = self.plant_coordinate(origin_plant_id).await?;
        let destination_coord = self.plant_coordinate(destination_node_id).await?;

        for provider in &self.providers {
            match self.invoke_with_retry(provider.as_ref(), origin_coord, destination_coord).await
            {
                Ok(route) => {
                    let entry = RouteCacheEntry {
                        origin_id: origin_plant_id.to_string(),
                        destination_id: destination_node_id.to_string(),
                        transport_mode: mode,
                        distance_km: route.distance_km,
                        duration_minutes: route.duration_minutes,
                        provider: provider.name().to_string(),
                        created_at: Utc::now(),
                        expires_at: None,
                    };
                    clinker_db::route_cache::upsert(&self.pool, &entry).await?;
                    info!(
                        origin_plant_id,
                        destination_node_id,
                        provider = provider.name(),
                        "route resolved"
                    );
                    // A concurrent writer may have already inserted this
                    // key; re-read so we return whichever row won.
                    return clinker_db::route_cache::lookup(
                        &self.pool,
                        origin_plant_id,
                        destination_node_id,
                        mode,
                    )
                    .await?
                    .ok_or_else(|| RoutingError::RouteUnavailable {
                        origin: origin_plant_id.to_string(),
                        destination: destination_node_id.to_string(),
                    });
                }
                Err(message) => {
                    warn!(provider = provider.name(), %message, "provider exhausted, falling through");
                }
            }
        }

        Err(RoutingError::RouteUnavailable {
            origin: origin_plant_id.to_string(),
            destination: destination_node_id.to_string(),
        })
    }

    async fn plant_coordinate(&self, node_id: &str) -> Result<Coordinate, RoutingError> {
        let plant = clinker_db::canonical::fetch_plant(&self.pool, node_id).await?;
        match plant.and_then(|p| p.latitude.zip(p.longitude)) {
            Some((latitude, longitude)) => Ok(Coordinate { latitude, longitude }),
            None => Err(RoutingError::CoordinateMissing { node_id: node_id.to_string() }),
        }
    }

    /// Retries a single provider up to `max_attempts` on transient
    /// failure; falls through immediately on permanent failure.
    async fn invoke_with_retry(
        &self,
        provider: &dyn RouteProvider,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<crate::provider::ProviderRoute, String> {
        let mut last_error = String::new();
        for attempt in 1..=self.retry_policy.max_attempts {
            match provider.route(origin, destination).await {
                Ok(route) => return Ok(route),
                Err(ProviderError::Permanent(message)) => return Err(message),
                Err(ProviderError::Transient(message)) => {
                    last_error = message;
                    if attempt < self.retry_policy.max_attempts {
                        tokio::time::sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                    }
                }
            }
        }
        Err(last_error)
    }
}
