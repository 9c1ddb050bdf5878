//! SQLite-backed storage for the clinker planning service: connection
//! pool setup, canonical + staging schema, and one module of query
//! helpers per table group.

pub mod audit;
pub mod batches;
pub mod canonical;
pub mod error;
pub mod jobs;
pub mod kpi;
pub mod optimization_run;
pub mod pool;
pub mod route_cache;
pub mod rows;
pub mod scenario_record;
pub mod schema;
pub mod staging;

pub use error::{DbError, DbResult};
pub use pool::connect;
