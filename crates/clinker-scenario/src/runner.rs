//! Scenario Runner: perturbs demand per scenario configuration and drives
//! each through Model Builder -> Solver Driver -> Result Extractor,
//! capturing failures into the result rather than propagating them (§4.8).
//! KPI materialization is a separate pipeline stage the caller runs
//! against a successful [`ScenarioRunResult`] (§5: stages run sequentially
//! on one worker, and materialize is its own stage).

use clinker_core::{RunId, ScenarioConfig, ScenarioRecord, ScenarioRunStatus};
use clinker_jobs::CancelToken;
use clinker_solver::{PenaltyPolicy, PlanResult, PlanningDataset, SolverDriver, SolverOptions};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

use crate::error::ScenarioError;
use crate::perturb::perturb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioOutcomeStatus {
    Completed,
    InvalidScenario,
    Failed,
}

pub struct ScenarioRunResult {
    pub name: String,
    pub status: ScenarioOutcomeStatus,
    pub plan: Option<PlanResult>,
    pub error: Option<String>,
}

pub struct ScenarioRunner {
    pool: Pool<Sqlite>,
    driver: SolverDriver,
    options: SolverOptions,
    penalty: PenaltyPolicy,
}

impl ScenarioRunner {
    pub fn new(pool: Pool<Sqlite>, driver: SolverDriver, options: SolverOptions, penalty: PenaltyPolicy) -> Self {
        Self { pool, driver, options, penalty }
    }

    /// The connection pool this runner persists optimization runs and
    /// scenario records against, for callers that chain a further
    /// pipeline stage (e.g. KPI materialization) onto a successful run.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Runs every scenario in `configs` sequentially against `base_dataset`,
    /// each with its own perturbed demand frame (§4.8). Checked against
    /// `cancel` between scenarios, so a cancelled batch stops picking up
    /// new work even though a scenario already mid-solve runs to completion.
    pub async fn run_batch(
        &self,
        base_dataset: &PlanningDataset,
        configs: &[ScenarioConfig],
        cancel: &CancelToken,
    ) -> Vec<ScenarioRunResult> {
        let mut results = Vec::with_capacity(configs.len());
        for config in configs {
            results.push(self.run_one(base_dataset, config, cancel).await);
        }
        results
    }

    /// Drives one scenario through perturb -> build -> solve -> extract.
    /// `cancel` is checked between stages (§4.9, §5) but never inside the
    /// opaque `clinker_solver::plan` call itself, which cannot be
    /// interrupted mid-solve.
    pub async fn run_one(&self, base_dataset: &PlanningDataset, config: &ScenarioConfig, cancel: &CancelToken) -> ScenarioRunResult {
        if cancel.is_cancelled() {
            info!(scenario = %config.name, "scenario run cancelled before starting");
            self.record(config, ScenarioRunStatus::Failed, None).await;
            return ScenarioRunResult {
                name: config.name.clone(),
                status: ScenarioOutcomeStatus::Failed,
                plan: None,
                error: Some("cancelled before starting".to_string()),
            };
        }

        let perturbed_demand = match perturb(&base_dataset.demand, config) {
            Ok(demand) => demand,
            Err(err) => {
                warn!(scenario = %config.name, %err, "scenario rejected before solve");
                self.record(config, ScenarioRunStatus::InvalidScenario, None).await;
                return ScenarioRunResult {
                    name: config.name.clone(),
                    status: ScenarioOutcomeStatus::InvalidScenario,
                    plan: None,
                    error: Some(err.to_string()),
                };
            }
        };

        let mut dataset = base_dataset.clone();
        dataset.demand = perturbed_demand;

        if cancel.is_cancelled() {
            info!(scenario = %config.name, "scenario run cancelled before solve");
            self.record(config, ScenarioRunStatus::Failed, None).await;
            return ScenarioRunResult {
                name: config.name.clone(),
                status: ScenarioOutcomeStatus::Failed,
                plan: None,
                error: Some("cancelled before solve".to_string()),
            };
        }

        let run_id = RunId::new();
        if let Err(err) = clinker_db::optimization_run::start(
            &self.pool,
            &run_id,
            &config.name,
            self.options.time_limit_seconds,
            self.options.mip_gap,
        )
        .await
        {
            warn!(scenario = %config.name, %err, "failed to persist optimization run start");
        }

        match clinker_solver::plan(&dataset, self.penalty, &self.options, &self.driver) {
            Ok(plan) => {
                info!(scenario = %config.name, objective = plan.objective_value, "scenario completed");
                let _ = clinker_db::optimization_run::finish(
                    &self.pool,
                    &run_id,
                    &plan.solver,
                    "optimal",
                    Some(plan.objective_value),
                    plan.runtime_seconds,
                    "passed",
                )
                .await;
                self.record(config, ScenarioRunStatus::Completed, Some(run_id.as_str().to_string())).await;
                ScenarioRunResult {
                    name: config.name.clone(),
                    status: ScenarioOutcomeStatus::Completed,
                    plan: Some(plan),
                    error: None,
                }
            }
            Err(err) => {
                warn!(scenario = %config.name, %err, "scenario solve failed");
                let _ = clinker_db::optimization_run::finish(
                    &self.pool,
                    &run_id,
                    "",
                    "failed",
                    None,
                    0.0,
                    "failed",
                )
                .await;
                self.record(config, ScenarioRunStatus::Failed, Some(run_id.as_str().to_string())).await;
                ScenarioRunResult {
                    name: config.name.clone(),
                    status: ScenarioOutcomeStatus::Failed,
                    plan: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn record(&self, config: &ScenarioConfig, status: ScenarioRunStatus, run_id: Option<String>) {
        let record = ScenarioRecord {
            scenario_name: config.name.clone(),
            scenario_type: config.scenario_type,
            run_id,
            status,
            created_at: chrono::Utc::now(),
        };
        if let Err(err) = clinker_db::scenario_record::upsert(&self.pool, &record).await {
            warn!(scenario = %config.name, %err, "failed to persist scenario record");
        }
    }
}
