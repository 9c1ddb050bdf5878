use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::schema::init_schema;

/// Open a connection pool against `database_url` (e.g. `sqlite://clinker.db`
/// or `sqlite::memory:`) and ensure the schema exists.
pub async fn connect(database_url: &str) -> DbResult<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(DbError::Connect)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
        .map_err(DbError::Connect)?;

    init_schema(&pool).await?;
    info!(database_url, "clinker-db schema ready");
    Ok(pool)
}
