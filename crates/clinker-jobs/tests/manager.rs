use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clinker_config::QueueFullPolicy;
use clinker_core::{JobId, JobStatus};
use clinker_jobs::{CancelToken, JobHandler, JobManager, JobOutcome, ProgressReporter};
use sqlx::sqlite::SqlitePoolOptions;

struct Instant;

#[async_trait]
impl JobHandler for Instant {
    async fn run(&self, _job_id: &JobId, _cancel: CancelToken, progress: ProgressReporter) -> Result<JobOutcome, String> {
        progress.update(50.0, "halfway").await;
        Ok(JobOutcome { result_ref: "run-1".to_string(), result_summary: "ok".to_string() })
    }
}

struct AlwaysFails;

#[async_trait]
impl JobHandler for AlwaysFails {
    async fn run(&self, _job_id: &JobId, _cancel: CancelToken, _progress: ProgressReporter) -> Result<JobOutcome, String> {
        Err("boom".to_string())
    }
}

struct ChecksCancellation;

#[async_trait]
impl JobHandler for ChecksCancellation {
    async fn run(&self, _job_id: &JobId, cancel: CancelToken, _progress: ProgressReporter) -> Result<JobOutcome, String> {
        for _ in 0..50 {
            if cancel.is_cancelled() {
                return Err("cancelled between stages".to_string());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Ok(JobOutcome { result_ref: "run-2".to_string(), result_summary: "finished".to_string() })
    }
}

async fn memory_pool() -> sqlx::Pool<sqlx::Sqlite> {
    let pool = SqlitePoolOptions::new().connect(":memory:").await.unwrap();
    clinker_db::schema::init_schema(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn submitted_job_completes_successfully() {
    let pool = memory_pool().await;
    let manager = JobManager::new(pool, 2, 8, QueueFullPolicy::Block);

    let job_id = manager
        .submit("optimize", Arc::new(Instant), None, None, &serde_json::json!({}))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let job = manager.status(&job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Success);
    assert_eq!(job.result_ref.as_deref(), Some("run-1"));
}

#[tokio::test]
async fn failing_handler_marks_job_failed() {
    let pool = memory_pool().await;
    let manager = JobManager::new(pool, 1, 8, QueueFullPolicy::Block);

    let job_id = manager
        .submit("optimize", Arc::new(AlwaysFails), None, None, &serde_json::json!({}))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let job = manager.status(&job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_payload.as_deref(), Some("boom"));
}

#[tokio::test]
async fn cancel_flips_the_cooperative_token() {
    let pool = memory_pool().await;
    let manager = JobManager::new(pool, 1, 8, QueueFullPolicy::Block);

    let job_id = manager
        .submit("optimize", Arc::new(ChecksCancellation), None, None, &serde_json::json!({}))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    manager.cancel(&job_id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let job = manager.status(&job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn recover_from_restart_fails_stale_running_jobs() {
    let pool = memory_pool().await;
    let job_id = JobId::new();
    clinker_db::jobs::submit(&pool, &job_id, "optimize", None, None, "{}").await.unwrap();
    clinker_db::jobs::mark_running(&pool, &job_id).await.unwrap();

    let manager = JobManager::new(pool, 1, 8, QueueFullPolicy::Block);
    let recovered = manager.recover_from_restart().await.unwrap();
    assert_eq!(recovered, 1);

    let job = manager.status(&job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_payload.as_deref(), Some("restart"));
}
