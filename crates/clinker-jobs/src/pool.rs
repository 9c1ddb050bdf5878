//! Worker pool: `N` `tokio::task::spawn` workers draining a shared bounded
//! `mpsc` channel, one job at a time per worker (§4.9, §5).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use clinker_core::JobId;
use sqlx::{Pool, Sqlite};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::handler::{CancelToken, JobHandler, ProgressReporter};

pub(crate) struct QueuedJob {
    pub job_id: JobId,
    pub handler: Arc<dyn JobHandler>,
}

pub(crate) type CancelRegistry = Arc<Mutex<HashMap<String, CancelToken>>>;

/// Spawns `worker_count` long-running tasks that pull jobs off `receiver`
/// until the channel closes.
pub(crate) fn spawn_workers(
    worker_count: usize,
    receiver: mpsc::Receiver<QueuedJob>,
    pool: Pool<Sqlite>,
    cancel_registry: CancelRegistry,
) {
    let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
    for worker_index in 0..worker_count {
        let receiver = receiver.clone();
        let pool = pool.clone();
        let cancel_registry = cancel_registry.clone();
        tokio::task::spawn(async move {
            loop {
                let job = { receiver.lock().await.recv().await };
                let Some(job) = job else {
                    info!(worker_index, "work channel closed, worker exiting");
                    break;
                };
                run_job(worker_index, job, &pool, &cancel_registry).await;
            }
        });
    }
}

async fn run_job(worker_index: usize, job: QueuedJob, pool: &Pool<Sqlite>, cancel_registry: &CancelRegistry) {
    let QueuedJob { job_id, handler } = job;

    if let Err(err) = clinker_db::jobs::mark_running(pool, &job_id).await {
        warn!(worker_index, job_id = %job_id, %err, "job vanished before it could start, skipping");
        cancel_registry.lock().unwrap().remove(job_id.as_str());
        return;
    }

    let cancel = cancel_registry
        .lock()
        .unwrap()
        .get(job_id.as_str())
        .cloned()
        .unwrap_or_else(CancelToken::new);
    let progress = ProgressReporter::new(pool.clone(), job_id.clone());

    info!(worker_index, job_id = %job_id, "job started");
    let outcome = handler.run(&job_id, cancel, progress).await;
    cancel_registry.lock().unwrap().remove(job_id.as_str());

    // `cancel` may have already moved this job to its terminal `cancelled`
    // state while the handler was running; don't clobber it with
    // `failed`/`success` once the (non-preemptible) handler finally returns.
    match clinker_db::jobs::status_of(pool, job_id.as_str()).await {
        Ok(clinker_core::JobStatus::Cancelled) => {
            info!(worker_index, job_id = %job_id, "job already cancelled, leaving terminal state as-is");
            return;
        }
        Ok(_) => {}
        Err(err) => {
            error!(worker_index, job_id = %job_id, %err, "failed to read job status before finishing");
        }
    }

    match outcome {
        Ok(result) => {
            if let Err(err) = clinker_db::jobs::complete(pool, &job_id, &result.result_ref, &result.result_summary).await {
                error!(job_id = %job_id, %err, "failed to persist job completion");
            }
            info!(worker_index, job_id = %job_id, "job completed");
        }
        Err(message) => {
            if let Err(err) = clinker_db::jobs::fail(pool, &job_id, &message).await {
                error!(job_id = %job_id, %err, "failed to persist job failure");
            }
            warn!(worker_index, job_id = %job_id, error = %message, "job failed");
        }
    }
}
