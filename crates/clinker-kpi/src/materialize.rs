//! Persists a computed [`crate::compute::KpiReport`] into the canonical
//! `kpi_summary` / `kpi_aggregated` tables (§4.10).

use clinker_solver::{PlanResult, PlanningDataset};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::compute::compute;
use crate::error::KpiError;

/// Computes KPIs for `plan` and upserts both the per-period summaries and
/// the per-scenario aggregate, keyed on `scenario_name`.
pub async fn materialize(
    pool: &Pool<Sqlite>,
    scenario_name: &str,
    dataset: &PlanningDataset,
    plan: &PlanResult,
) -> Result<(), KpiError> {
    let report = compute(dataset, plan);

    let mut tx = pool.begin().await.map_err(clinker_db::DbError::from)?;
    for (period, summary) in &report.per_period {
        clinker_db::kpi::upsert_summary(&mut *tx, scenario_name, period, summary).await?;
    }
    clinker_db::kpi::upsert_aggregated(&mut *tx, scenario_name, &report.aggregated).await?;
    tx.commit().await.map_err(clinker_db::DbError::from)?;

    info!(
        scenario_name,
        periods = report.per_period.len(),
        total_cost = report.aggregated.total_cost,
        service_level = report.aggregated.average_service_level,
        "materialized kpis"
    );
    Ok(())
}
