//! Scenario configuration shapes shared between the scenario runner and
//! job payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    Base,
    High,
    Low,
    Stochastic,
}

/// Distribution used by a `stochastic` scenario to sample a per-row
/// demand multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    Normal { mean: f64, std: f64 },
    Triangular { low: f64, mode: f64, high: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub scenario_type: ScenarioType,
    /// Multiplicative factor for `high`/`low`. Defaults applied by the
    /// runner when absent: 1.1 for high, 0.9 for low.
    pub scaling_factor: Option<f64>,
    /// Distribution and seed for `stochastic`.
    pub distribution: Option<Distribution>,
    pub seed: Option<u64>,
}

impl ScenarioConfig {
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenario_type: ScenarioType::Base,
            scaling_factor: None,
            distribution: None,
            seed: None,
        }
    }

    pub fn effective_scaling_factor(&self) -> f64 {
        match self.scenario_type {
            ScenarioType::High => self.scaling_factor.unwrap_or(1.1),
            ScenarioType::Low => self.scaling_factor.unwrap_or(0.9),
            ScenarioType::Base | ScenarioType::Stochastic => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioRunStatus {
    Completed,
    InvalidScenario,
    Failed,
}

/// Ambient bookkeeping row recording which scenario configs were run as
/// part of a batch of scenario invocations, independent of the
/// per-period/per-scenario KPI tables. Grounded in the original's
/// `scenario_metadata` table, which the distilled spec dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub scenario_name: String,
    pub scenario_type: ScenarioType,
    pub run_id: Option<String>,
    pub status: ScenarioRunStatus,
    pub created_at: DateTime<Utc>,
}
