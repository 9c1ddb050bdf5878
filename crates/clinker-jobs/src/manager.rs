//! Job Manager: `submit`/`execute_async`/`cancel`/`status` per §4.9,
//! backed by the worker pool in [`crate::pool`] and `clinker-db`'s
//! persisted state machine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use clinker_config::QueueFullPolicy;
use clinker_core::{Job, JobId, JobStatus};
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::JobError;
use crate::handler::{CancelToken, JobHandler};
use crate::pool::{spawn_workers, CancelRegistry, QueuedJob};

pub struct JobManager {
    pool: Pool<Sqlite>,
    sender: mpsc::Sender<QueuedJob>,
    cancel_registry: CancelRegistry,
    queue_full_policy: QueueFullPolicy,
}

impl JobManager {
    /// Spawns the worker pool and returns a handle. Callers should run
    /// [`JobManager::recover_from_restart`] once at process startup
    /// before accepting submissions.
    pub fn new(pool: Pool<Sqlite>, worker_count: usize, queue_capacity: usize, queue_full_policy: QueueFullPolicy) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let cancel_registry: CancelRegistry = Arc::new(Mutex::new(HashMap::new()));
        spawn_workers(worker_count.max(1), receiver, pool.clone(), cancel_registry.clone());
        Self { pool, sender, cancel_registry, queue_full_policy }
    }

    /// Marks jobs left `running` from a prior process `failed` with
    /// reason "restart" (§4.9 crash recovery).
    pub async fn recover_from_restart(&self) -> Result<u64, JobError> {
        let recovered = clinker_db::jobs::fail_stale_running(&self.pool).await?;
        if recovered > 0 {
            warn!(recovered, "marked stale running jobs failed after restart");
        }
        Ok(recovered)
    }

    /// Persists a pending job and enqueues it onto the work channel,
    /// blocking or rejecting per `queue_full_policy` when the channel is
    /// saturated (§4.9).
    pub async fn submit(
        &self,
        job_type: &str,
        handler: Arc<dyn JobHandler>,
        scenario_name: Option<&str>,
        user_id: Option<&str>,
        payload: &Value,
    ) -> Result<JobId, JobError> {
        let job_id = JobId::new();
        clinker_db::jobs::submit(
            &self.pool,
            &job_id,
            job_type,
            scenario_name,
            user_id,
            &payload.to_string(),
        )
        .await?;

        self.cancel_registry.lock().unwrap().insert(job_id.as_str().to_string(), CancelToken::new());

        let queued = QueuedJob { job_id: job_id.clone(), handler };
        match self.queue_full_policy {
            QueueFullPolicy::Block => {
                self.sender.send(queued).await.map_err(|_| JobError::QueueFull)?;
            }
            QueueFullPolicy::Reject => {
                self.sender.try_send(queued).map_err(|err| match err {
                    mpsc::error::TrySendError::Full(_) => JobError::QueueFull,
                    mpsc::error::TrySendError::Closed(_) => JobError::QueueFull,
                })?;
            }
        }

        info!(job_id = %job_id, job_type, "job submitted");
        clinker_db::audit::log_event(
            &self.pool,
            "job_submitted",
            Some(job_id.as_str()),
            user_id,
            Some(job_type),
        )
        .await;
        Ok(job_id)
    }

    /// Cancels a pending or running job. From `running`, this flips the
    /// job's cooperative cancellation flag; the worker observes it between
    /// pipeline stages, never inside the opaque solve call (§4.9, §5).
    pub async fn cancel(&self, job_id: &JobId) -> Result<(), JobError> {
        let current = clinker_db::jobs::get(&self.pool, job_id.as_str()).await?;
        if !current.status.can_transition_to(JobStatus::Cancelled) {
            return Err(JobError::InvalidTransition {
                job_id: job_id.as_str().to_string(),
                from: current.status.as_str().to_string(),
                to: "cancelled".to_string(),
            });
        }

        clinker_db::jobs::cancel(&self.pool, job_id).await?;
        if let Some(token) = self.cancel_registry.lock().unwrap().get(job_id.as_str()) {
            token.cancel();
        }
        Ok(())
    }

    pub async fn status(&self, job_id: &JobId) -> Result<Job, JobError> {
        Ok(clinker_db::jobs::get(&self.pool, job_id.as_str()).await?)
    }
}
