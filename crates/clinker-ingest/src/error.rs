use clinker_core::BatchId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not infer a target table from source {source_descriptor:?}")]
    UnknownTarget { source_descriptor: String },

    #[error("source row stream was empty")]
    EmptySource,

    #[error("storage operation failed: {0}")]
    Storage(#[from] clinker_db::DbError),
}

#[derive(Debug, Error)]
pub enum PromoteError {
    #[error("batch {batch_id} is not in a promotable state (status must be validated, invalid_rows = 0)")]
    IllegalState { batch_id: BatchId },

    #[error("storage operation failed: {0}")]
    Storage(#[from] clinker_db::DbError),

    #[error("row {row_number} in batch {batch_id} failed to convert to a canonical record: {reason}")]
    Conversion { batch_id: BatchId, row_number: i64, reason: String },
}
