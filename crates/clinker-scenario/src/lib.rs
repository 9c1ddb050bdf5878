//! Scenario Runner: demand perturbation and per-scenario orchestration.

pub mod error;
pub mod perturb;
pub mod runner;

pub use error::ScenarioError;
pub use perturb::perturb;
pub use runner::{ScenarioOutcomeStatus, ScenarioRunResult, ScenarioRunner};
