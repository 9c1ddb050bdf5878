use clinker_core::{ScenarioRecord, ScenarioRunStatus, ScenarioType};
use sqlx::{Executor, Sqlite};

use crate::error::DbResult;

fn scenario_type_str(t: ScenarioType) -> &'static str {
    match t {
        ScenarioType::Base => "base",
        ScenarioType::High => "high",
        ScenarioType::Low => "low",
        ScenarioType::Stochastic => "stochastic",
    }
}

fn status_str(s: ScenarioRunStatus) -> &'static str {
    match s {
        ScenarioRunStatus::Completed => "completed",
        ScenarioRunStatus::InvalidScenario => "invalid_scenario",
        ScenarioRunStatus::Failed => "failed",
    }
}

pub async fn upsert<'e, E>(executor: E, record: &ScenarioRecord) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO scenario_record (scenario_name, scenario_type, run_id, status, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(scenario_name) DO UPDATE SET
            scenario_type = excluded.scenario_type,
            run_id = excluded.run_id,
            status = excluded.status,
            created_at = excluded.created_at
        "#,
    )
    .bind(&record.scenario_name)
    .bind(scenario_type_str(record.scenario_type))
    .bind(&record.run_id)
    .bind(status_str(record.status))
    .bind(record.created_at.to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}
