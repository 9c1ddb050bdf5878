//! Solver Driver: runs the [`BuiltModel`] through the configured backend
//! fallback chain, normalizing whatever each backend reports into a
//! common [`SolveOutcome`] (§4.6).

use std::collections::HashMap;
use std::time::Instant;

use good_lp::{Solution, SolverModel, Variable};
use tracing::{info, warn};

use crate::error::SolverError;
use crate::model::BuiltModel;

#[derive(Debug, Clone)]
pub struct SolverOptions {
    pub time_limit_seconds: f64,
    pub mip_gap: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self { time_limit_seconds: 600.0, mip_gap: 0.01 }
    }
}

/// Values for every variable the model declared, keyed by the variable
/// handle. The Result Extractor reads back through `BuiltModel`'s index
/// maps against this.
pub struct SolveOutcome {
    pub backend: String,
    pub objective_value: f64,
    pub runtime_seconds: f64,
    pub values: HashMap<Variable, f64>,
}

/// One entry in the solver fallback chain. Each backend knows whether it
/// can even attempt the model it's handed (§4.6: microlp cannot handle
/// integer or binary variables, so it reports itself unavailable rather
/// than attempting and failing).
pub trait SolverBackend: Send + Sync {
    fn name(&self) -> &str;
    fn is_available(&self, model: &BuiltModel) -> bool;
    fn solve(&self, model: &BuiltModel, options: &SolverOptions) -> Result<SolveOutcome, SolverError>;
}

fn all_variables(model: &BuiltModel) -> Vec<Variable> {
    model
        .prod
        .values()
        .chain(model.ship.values())
        .chain(model.trips.values())
        .chain(model.use_mode.values())
        .chain(model.inv.values())
        .chain(model.unmet_demand.values())
        .copied()
        .collect()
}

fn read_values(model: &BuiltModel, solution: &impl Solution) -> HashMap<Variable, f64> {
    all_variables(model).into_iter().map(|v| (v, solution.value(v))).collect()
}

pub struct CbcBackend;

impl SolverBackend for CbcBackend {
    fn name(&self) -> &str {
        "coin_cbc"
    }

    fn is_available(&self, _model: &BuiltModel) -> bool {
        true
    }

    fn solve(&self, model: &BuiltModel, options: &SolverOptions) -> Result<SolveOutcome, SolverError> {
        use good_lp::solvers::coin_cbc::coin_cbc;

        let start = Instant::now();
        let vars = model.vars.clone();
        let mut problem = vars.minimise(model.objective.clone()).using(coin_cbc);
        problem.set_parameter("sec", &format!("{}", options.time_limit_seconds as i64));
        problem.set_parameter("ratio", &format!("{}", options.mip_gap));
        let problem = model.constraints.iter().cloned().fold(problem, |p, c| p.with(c));

        let solution = problem.solve().map_err(|err| classify_resolution_error(self.name(), err))?;

        let values = read_values(model, &solution);
        let objective_value = model.objective.eval_with(&solution);
        Ok(SolveOutcome {
            backend: self.name().to_string(),
            objective_value,
            runtime_seconds: start.elapsed().as_secs_f64(),
            values,
        })
    }
}

pub struct HighsBackend;

impl SolverBackend for HighsBackend {
    fn name(&self) -> &str {
        "highs"
    }

    fn is_available(&self, _model: &BuiltModel) -> bool {
        true
    }

    fn solve(&self, model: &BuiltModel, options: &SolverOptions) -> Result<SolveOutcome, SolverError> {
        use good_lp::solvers::highs::highs;

        let start = Instant::now();
        let vars = model.vars.clone();
        let mut problem = vars.minimise(model.objective.clone()).using(highs);
        problem.set_option("time_limit", options.time_limit_seconds);
        problem.set_option("mip_rel_gap", options.mip_gap);
        let problem = model.constraints.iter().cloned().fold(problem, |p, c| p.with(c));

        let solution = problem.solve().map_err(|err| classify_resolution_error(self.name(), err))?;

        let values = read_values(model, &solution);
        let objective_value = model.objective.eval_with(&solution);
        Ok(SolveOutcome {
            backend: self.name().to_string(),
            objective_value,
            runtime_seconds: start.elapsed().as_secs_f64(),
            values,
        })
    }
}

/// Pure-Rust fallback. Cannot solve MIPs, so §4.6 requires it to report
/// itself unavailable whenever the model carries integer or binary
/// variables rather than attempt and silently relax them.
pub struct MicrolpBackend;

impl SolverBackend for MicrolpBackend {
    fn name(&self) -> &str {
        "microlp"
    }

    fn is_available(&self, model: &BuiltModel) -> bool {
        !model.has_integer_vars
    }

    fn solve(&self, model: &BuiltModel, _options: &SolverOptions) -> Result<SolveOutcome, SolverError> {
        use good_lp::solvers::microlp::microlp;

        let start = Instant::now();
        let vars = model.vars.clone();
        let problem = vars.minimise(model.objective.clone()).using(microlp);
        let problem = model.constraints.iter().cloned().fold(problem, |p, c| p.with(c));

        let solution = problem.solve().map_err(|err| classify_resolution_error(self.name(), err))?;

        let values = read_values(model, &solution);
        let objective_value = model.objective.eval_with(&solution);
        Ok(SolveOutcome {
            backend: self.name().to_string(),
            objective_value,
            runtime_seconds: start.elapsed().as_secs_f64(),
            values,
        })
    }
}

/// Maps a `good_lp` resolution failure onto the concrete outcome it
/// reports, rather than folding everything into `BackendFailure` — an
/// infeasible or unbounded model is the same for every exact solver, so
/// the fallback loop needs to tell that apart from a backend-specific error.
fn classify_resolution_error(backend: &str, err: good_lp::ResolutionError) -> SolverError {
    match err {
        good_lp::ResolutionError::Infeasible => SolverError::Infeasible { backend: backend.to_string() },
        good_lp::ResolutionError::Unbounded => SolverError::Unbounded { backend: backend.to_string() },
        other => SolverError::BackendFailure { backend: backend.to_string(), message: other.to_string() },
    }
}

/// Runs backends in priority order, falling through on any failure,
/// skipping any that report themselves unavailable for this model (§4.6).
pub struct SolverDriver {
    chain: Vec<Box<dyn SolverBackend>>,
}

impl SolverDriver {
    pub fn new(chain: Vec<Box<dyn SolverBackend>>) -> Self {
        Self { chain }
    }

    /// The default chain: commercial-grade, then modern open-source,
    /// then legacy/pure-Rust open-source.
    pub fn default_chain() -> Self {
        Self::new(vec![Box::new(CbcBackend), Box::new(HighsBackend), Box::new(MicrolpBackend)])
    }

    pub fn solve(&self, model: &BuiltModel, options: &SolverOptions) -> Result<SolveOutcome, SolverError> {
        for backend in &self.chain {
            if !backend.is_available(model) {
                info!(backend = backend.name(), "backend unavailable for this model, skipping");
                continue;
            }
            match backend.solve(model, options) {
                Ok(outcome) => {
                    info!(backend = backend.name(), objective = outcome.objective_value, "solve succeeded");
                    return Ok(outcome);
                }
                Err(err @ (SolverError::Infeasible { .. } | SolverError::Unbounded { .. })) => {
                    warn!(backend = backend.name(), %err, "model is infeasible/unbounded for every exact solver, not trying the rest of the chain");
                    return Err(err);
                }
                Err(err) => {
                    warn!(backend = backend.name(), %err, "backend failed, falling through");
                }
            }
        }
        Err(SolverError::NoBackendAvailable)
    }
}
