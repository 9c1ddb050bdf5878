use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Storage(#[from] clinker_db::DbError),

    #[error("job queue is at capacity")]
    QueueFull,

    #[error("job {job_id} cannot transition from {from} to {to}")]
    InvalidTransition { job_id: String, from: String, to: String },

    #[error("job {job_id} was cancelled")]
    Cancelled { job_id: String },

    #[error("job handler failed: {0}")]
    HandlerFailed(String),
}
