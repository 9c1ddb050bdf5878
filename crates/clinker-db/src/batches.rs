use chrono::Utc;
use clinker_core::{BatchId, BatchStatus, TargetTable, ValidationBatch};
use sqlx::{Executor, Sqlite};

use crate::error::DbResult;
use crate::rows::ValidationBatchRow;

pub async fn create<'e, E>(
    executor: E,
    batch_id: &BatchId,
    source_descriptor: &str,
    target_table: TargetTable,
    total_rows: i64,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO validation_batch
            (batch_id, source_descriptor, target_table, total_rows, valid_rows,
             invalid_rows, status, created_at)
        VALUES (?, ?, ?, ?, 0, 0, 'pending', ?)
        "#,
    )
    .bind(batch_id.as_str())
    .bind(source_descriptor)
    .bind(target_table.as_str())
    .bind(total_rows)
    .bind(Utc::now().to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get<'e, E>(executor: E, batch_id: &str) -> DbResult<ValidationBatch>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: ValidationBatchRow =
        sqlx::query_as("SELECT * FROM validation_batch WHERE batch_id = ?")
            .bind(batch_id)
            .fetch_one(executor)
            .await?;
    ValidationBatch::try_from(row)
}

pub async fn list_recent<'e, E>(executor: E, limit: i64) -> DbResult<Vec<ValidationBatch>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<ValidationBatchRow> = sqlx::query_as(
        "SELECT * FROM validation_batch ORDER BY created_at DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(executor)
    .await?;
    rows.into_iter().map(ValidationBatch::try_from).collect()
}

/// Called by the Validator after sweeping all five stages. Moves the
/// batch to `validated` (invalid_rows = 0) or `failed` and records row
/// counts; idempotent on re-validation.
pub async fn record_validation_outcome<'e, E>(
    executor: E,
    batch_id: &str,
    valid_rows: i64,
    invalid_rows: i64,
    error_summary: Option<&str>,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let status = if invalid_rows == 0 { BatchStatus::Validated } else { BatchStatus::Failed };
    sqlx::query(
        r#"
        UPDATE validation_batch
        SET valid_rows = ?, invalid_rows = ?, status = ?, validated_at = ?, error_summary = ?
        WHERE batch_id = ?
        "#,
    )
    .bind(valid_rows)
    .bind(invalid_rows)
    .bind(status.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(error_summary)
    .bind(batch_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn mark_promoted<'e, E>(executor: E, batch_id: &str) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE validation_batch SET status = 'promoted', promoted_at = ? WHERE batch_id = ?",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(batch_id)
    .execute(executor)
    .await?;
    Ok(())
}
