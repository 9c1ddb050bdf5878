use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("unsupported distribution for stochastic scenario: {0}")]
    UnsupportedDistribution(String),

    #[error("stochastic scenario requires a distribution")]
    MissingDistribution,

    #[error(transparent)]
    Storage(#[from] clinker_db::DbError),

    #[error(transparent)]
    Solver(#[from] clinker_solver::SolverError),
}
