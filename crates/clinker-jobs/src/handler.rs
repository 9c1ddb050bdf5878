//! The worker-side contract: a job's actual work, decoupled from the
//! queue and persistence machinery so `clinker-jobs` never has to depend
//! on `clinker-scenario`/`clinker-solver` (§4.9: `execute_async(job_id,
//! worker_fn)`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use clinker_core::JobId;
use sqlx::{Pool, Sqlite};
use tracing::debug;

/// Best-effort progress reporting; a dropped update is acceptable (§4.9).
#[derive(Clone)]
pub struct ProgressReporter {
    pool: Pool<Sqlite>,
    job_id: JobId,
}

impl ProgressReporter {
    pub fn new(pool: Pool<Sqlite>, job_id: JobId) -> Self {
        Self { pool, job_id }
    }

    pub async fn update(&self, percent: f64, message: &str) {
        if let Err(err) = clinker_db::jobs::update_progress(&self.pool, &self.job_id, percent, message).await {
            debug!(job_id = %self.job_id, %err, "progress update dropped");
        }
    }
}

/// A per-job cooperative cancellation flag. The worker is expected to
/// check this between pipeline stages, never inside an opaque solve call.
#[derive(Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a successful handler run: a result reference (e.g. a run
/// id) and a short human-readable summary, both persisted on the job row.
pub struct JobOutcome {
    pub result_ref: String,
    pub result_summary: String,
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(
        &self,
        job_id: &JobId,
        cancel: CancelToken,
        progress: ProgressReporter,
    ) -> Result<JobOutcome, String>;
}
