//! Model Builder, Solver Driver, and Result Extractor: the MILP core.
//!
//! `good_lp` is the one dependency in this workspace with no counterpart
//! anywhere in the example pack — no example repo models mathematical
//! programming. It is used here because the planning problem this crate
//! solves is, at its core, a mixed-integer linear program, and `good_lp`
//! is the idiomatic way to express one in Rust: a solver-agnostic model
//! builder over pluggable backends (coin_cbc, highs, microlp), matching
//! the fallback-chain shape this crate's Solver Driver already needs.

pub mod dataset;
pub mod driver;
pub mod error;
pub mod extract;
pub mod model;
pub mod penalty;

pub use dataset::PlanningDataset;
pub use driver::{CbcBackend, HighsBackend, MicrolpBackend, SolveOutcome, SolverBackend, SolverDriver, SolverOptions};
pub use error::{ModelError, SolverError};
pub use extract::{CostBreakdown, InventoryEntry, PlanResult, ProductionEntry, ShipmentEntry, UnmetDemandEntry};
pub use model::{build, BuiltModel};
pub use penalty::PenaltyPolicy;

/// Runs the full Model Builder -> Solver Driver -> Result Extractor
/// pipeline in one call, the shape every caller (scenario runner, job
/// worker, CLI) actually wants.
pub fn plan(
    dataset: &PlanningDataset,
    penalty: PenaltyPolicy,
    options: &SolverOptions,
    driver: &SolverDriver,
) -> Result<PlanResult, SolverError> {
    let rate = penalty.rate();
    let built = model::build(dataset, rate)?;
    let outcome = driver.solve(&built, options)?;
    extract::extract(&built, &outcome, dataset, rate)
}
