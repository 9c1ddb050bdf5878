//! KPI Materializer: turns a solved [`clinker_solver::PlanResult`] into the
//! persisted per-(scenario, period) summaries and per-scenario aggregates
//! of §4.10. Runs as its own pipeline stage after a scenario run completes,
//! not as part of solving itself.

pub mod compute;
pub mod error;
pub mod materialize;

pub use compute::{compute, KpiReport};
pub use error::KpiError;
pub use materialize::materialize;
