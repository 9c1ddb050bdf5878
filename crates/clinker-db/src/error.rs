use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("schema initialization failed: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("row not found")]
    NotFound,
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            other => DbError::Query(other),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
