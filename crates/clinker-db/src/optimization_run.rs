use chrono::Utc;
use clinker_core::{OptimizationRun, RunId};
use sqlx::{Executor, Sqlite};

use crate::error::DbResult;
use crate::rows::OptimizationRunRow;

pub async fn start<'e, E>(
    executor: E,
    run_id: &RunId,
    scenario_name: &str,
    time_limit_seconds: f64,
    gap_tolerance: f64,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO optimization_run
            (run_id, scenario_name, solver_name, solver_status, time_limit_seconds,
             gap_tolerance, started_at, validation_status)
        VALUES (?, ?, '', 'pending', ?, ?, ?, 'pending')
        "#,
    )
    .bind(run_id.as_str())
    .bind(scenario_name)
    .bind(time_limit_seconds)
    .bind(gap_tolerance)
    .bind(Utc::now().to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn finish<'e, E>(
    executor: E,
    run_id: &RunId,
    solver_name: &str,
    solver_status: &str,
    objective_value: Option<f64>,
    solve_time_seconds: f64,
    validation_status: &str,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE optimization_run
        SET solver_name = ?, solver_status = ?, objective_value = ?,
            solve_time_seconds = ?, finished_at = ?, validation_status = ?
        WHERE run_id = ?
        "#,
    )
    .bind(solver_name)
    .bind(solver_status)
    .bind(objective_value)
    .bind(solve_time_seconds)
    .bind(Utc::now().to_rfc3339())
    .bind(validation_status)
    .bind(run_id.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get<'e, E>(executor: E, run_id: &str) -> DbResult<OptimizationRun>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: OptimizationRunRow =
        sqlx::query_as("SELECT * FROM optimization_run WHERE run_id = ?")
            .bind(run_id)
            .fetch_one(executor)
            .await?;
    OptimizationRun::try_from(row)
}
