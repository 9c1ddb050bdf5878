use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("planning dataset has no periods to plan over")]
    EmptyHorizon,

    #[error("plant {plant_id} has no capacity/cost record for period {period}")]
    MissingCapacityCost { plant_id: String, period: String },

    #[error("route {origin} -> {destination} has non-positive vehicle capacity")]
    DegenerateRoute { origin: String, destination: String },

    #[error("good_lp rejected the model: {0}")]
    Formulation(String),
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("model construction failed: {0}")]
    Model(#[from] ModelError),

    #[error("no solver backend in the fallback chain is available for this model")]
    NoBackendAvailable,

    #[error("solver {backend} reported infeasible")]
    Infeasible { backend: String },

    #[error("solver {backend} reported unbounded")]
    Unbounded { backend: String },

    #[error("solver {backend} failed: {message}")]
    BackendFailure { backend: String, message: String },

    #[error("solution extraction produced an inconsistent cost breakdown: objective {objective} vs summed {summed}")]
    InconsistentCostBreakdown { objective: f64, summed: f64 },
}
