//! [`JobHandler`] implementation backing the `submit-optimization`
//! command: runs one scenario through the Scenario Runner and, on
//! success, materializes its KPIs as the next pipeline stage (§4.8, §4.10).

use async_trait::async_trait;
use clinker_core::{JobId, ScenarioConfig};
use clinker_jobs::{CancelToken, JobHandler, JobOutcome, ProgressReporter};
use clinker_scenario::{ScenarioOutcomeStatus, ScenarioRunner};
use clinker_solver::PlanningDataset;

pub struct OptimizeJobHandler {
    pub runner: ScenarioRunner,
    pub dataset: PlanningDataset,
    pub scenario: ScenarioConfig,
}

#[async_trait]
impl JobHandler for OptimizeJobHandler {
    async fn run(&self, _job_id: &JobId, cancel: CancelToken, progress: ProgressReporter) -> Result<JobOutcome, String> {
        progress.update(10.0, "solving").await;
        let result = self.runner.run_one(&self.dataset, &self.scenario, &cancel).await;

        match result.status {
            ScenarioOutcomeStatus::Completed => {
                let plan = result.plan.expect("completed scenario always carries a plan");
                if cancel.is_cancelled() {
                    return Err("cancelled before kpi materialization".to_string());
                }
                progress.update(80.0, "materializing kpis").await;
                if let Err(err) = clinker_kpi::materialize(self.runner.pool(), &self.scenario.name, &self.dataset, &plan).await {
                    return Err(format!("kpi materialization failed: {err}"));
                }
                Ok(JobOutcome {
                    result_ref: self.scenario.name.clone(),
                    result_summary: format!("objective={:.2} solver={}", plan.objective_value, plan.solver),
                })
            }
            ScenarioOutcomeStatus::InvalidScenario | ScenarioOutcomeStatus::Failed => {
                Err(result.error.unwrap_or_else(|| "scenario run failed".to_string()))
            }
        }
    }
}
