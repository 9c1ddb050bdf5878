use thiserror::Error;

#[derive(Debug, Error)]
pub enum KpiError {
    #[error("kpi storage error: {0}")]
    Storage(#[from] clinker_db::DbError),
}
