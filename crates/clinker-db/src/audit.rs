//! Append-only audit trail for mutating operations (ingest, promote,
//! job submission). Grounded in the original's `audit_service.log_event`:
//! fire-and-forget, a failed write never aborts the caller's operation.

use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::warn;

/// Best-effort audit write. Swallows and logs its own error rather than
/// propagating, matching the original's fire-and-forget semantics.
pub async fn log_event(
    pool: &Pool<Sqlite>,
    event_type: &str,
    entity_id: Option<&str>,
    user_id: Option<&str>,
    detail: Option<&str>,
) {
    let result = sqlx::query(
        "INSERT INTO audit_log (event_type, entity_id, user_id, detail, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(event_type)
    .bind(entity_id)
    .bind(user_id)
    .bind(detail)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await;

    if let Err(err) = result {
        warn!(event_type, entity_id, %err, "audit log write failed");
    }
}
