use chrono::Utc;
use clinker_core::{RouteCacheEntry, TransportMode};
use sqlx::{Executor, Sqlite};

use crate::error::DbResult;
use crate::rows::RouteCacheRow;

pub async fn lookup<'e, E>(
    executor: E,
    origin_id: &str,
    destination_id: &str,
    mode: TransportMode,
) -> DbResult<Option<RouteCacheEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<RouteCacheRow> = sqlx::query_as(
        "SELECT * FROM route_cache WHERE origin_id = ? AND destination_id = ? AND transport_mode = ?",
    )
    .bind(origin_id)
    .bind(destination_id)
    .bind(mode.as_str())
    .fetch_optional(executor)
    .await?;
    row.map(RouteCacheEntry::try_from).transpose()
}

/// Upsert under the unique (origin, destination, mode) constraint.
/// Concurrent writers racing to insert the same key collapse to one row
/// — the existing row wins, matching §4.4's idempotent-writeback rule.
pub async fn upsert<'e, E>(executor: E, entry: &RouteCacheEntry) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO route_cache
            (origin_id, destination_id, transport_mode, distance_km, duration_minutes,
             provider, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(origin_id, destination_id, transport_mode) DO NOTHING
        "#,
    )
    .bind(&entry.origin_id)
    .bind(&entry.destination_id)
    .bind(entry.transport_mode.as_str())
    .bind(entry.distance_km)
    .bind(entry.duration_minutes)
    .bind(&entry.provider)
    .bind(entry.created_at.to_rfc3339())
    .bind(entry.expires_at.map(|dt| dt.to_rfc3339()))
    .execute(executor)
    .await?;
    Ok(())
}

pub fn is_expired(entry: &RouteCacheEntry) -> bool {
    entry.expires_at.map(|exp| exp <= Utc::now()).unwrap_or(false)
}
