//! Job state machine persistence. Atomic claiming is modeled on the
//! teacher's `cf_processing_queue` pop: an `UPDATE ... WHERE status = ?`
//! inside a transaction, so two workers racing on the same row leave
//! exactly one winner.

use chrono::Utc;
use clinker_core::{Job, JobId, JobStatus};
use sqlx::{Pool, Sqlite};

use crate::error::{DbError, DbResult};
use crate::rows::JobRow;

pub async fn submit(
    pool: &Pool<Sqlite>,
    job_id: &JobId,
    job_type: &str,
    scenario_name: Option<&str>,
    user_id: Option<&str>,
    payload_json: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO jobs
            (job_id, job_type, status, submitted_at, scenario_name, user_id,
             progress_percent, payload)
        VALUES (?, ?, 'pending', ?, ?, ?, 0, ?)
        "#,
    )
    .bind(job_id.as_str())
    .bind(job_type)
    .bind(Utc::now().to_rfc3339())
    .bind(scenario_name)
    .bind(user_id)
    .bind(payload_json)
    .execute(pool)
    .await?;
    Ok(())
}

/// Atomically claim the oldest pending job and move it to `running`.
/// Returns `None` if no job is pending.
pub async fn claim_next(pool: &Pool<Sqlite>) -> DbResult<Option<Job>> {
    let mut tx = pool.begin().await?;

    let job_id: Option<String> = sqlx::query_scalar(
        "SELECT job_id FROM jobs WHERE status = 'pending' ORDER BY submitted_at ASC LIMIT 1",
    )
    .fetch_optional(&mut *tx)
    .await?;

    let Some(job_id) = job_id else {
        tx.commit().await?;
        return Ok(None);
    };

    let rows_affected = sqlx::query(
        "UPDATE jobs SET status = 'running', started_at = ? WHERE job_id = ? AND status = 'pending'",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(&job_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        tx.commit().await?;
        return Ok(None);
    }

    let row: JobRow = sqlx::query_as("SELECT * FROM jobs WHERE job_id = ?")
        .bind(&job_id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(Some(Job::try_from(row)?))
}

/// Marks a specific pending job running. Used when the caller already
/// knows which job to run next (e.g. it came off an in-process work
/// channel) rather than needing [`claim_next`]'s oldest-pending pick.
pub async fn mark_running(pool: &Pool<Sqlite>, job_id: &JobId) -> DbResult<()> {
    let rows_affected = sqlx::query(
        "UPDATE jobs SET status = 'running', started_at = ? WHERE job_id = ? AND status = 'pending'",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(job_id.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn update_progress(
    pool: &Pool<Sqlite>,
    job_id: &JobId,
    percent: f64,
    message: &str,
) -> DbResult<()> {
    sqlx::query("UPDATE jobs SET progress_percent = ?, progress_message = ? WHERE job_id = ?")
        .bind(percent.clamp(0.0, 100.0))
        .bind(message)
        .bind(job_id.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn complete(
    pool: &Pool<Sqlite>,
    job_id: &JobId,
    result_ref: &str,
    result_summary: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET status = 'success', finished_at = ?, progress_percent = 100,
            result_ref = ?, result_summary = ?
        WHERE job_id = ?
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(result_ref)
    .bind(result_summary)
    .bind(job_id.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fail(pool: &Pool<Sqlite>, job_id: &JobId, error_payload: &str) -> DbResult<()> {
    sqlx::query(
        "UPDATE jobs SET status = 'failed', finished_at = ?, error_payload = ? WHERE job_id = ?",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(error_payload)
    .bind(job_id.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// `cancel` is only legal from `pending` or `running` per the job state
/// machine; the caller checks current status before calling this.
pub async fn cancel(pool: &Pool<Sqlite>, job_id: &JobId) -> DbResult<()> {
    let rows_affected = sqlx::query(
        r#"
        UPDATE jobs SET status = 'cancelled', finished_at = ?
        WHERE job_id = ? AND status IN ('pending', 'running')
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(job_id.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn get(pool: &Pool<Sqlite>, job_id: &str) -> DbResult<Job> {
    let row: JobRow = sqlx::query_as("SELECT * FROM jobs WHERE job_id = ?")
        .bind(job_id)
        .fetch_one(pool)
        .await?;
    Job::try_from(row)
}

pub async fn status_of(pool: &Pool<Sqlite>, job_id: &str) -> DbResult<JobStatus> {
    Ok(get(pool, job_id).await?.status)
}

/// Crash recovery: jobs left `running` from a prior process are marked
/// `failed` with reason "restart" (§4.9).
pub async fn fail_stale_running(pool: &Pool<Sqlite>) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE jobs SET status = 'failed', finished_at = ?, error_payload = 'restart'
        WHERE status = 'running'
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
