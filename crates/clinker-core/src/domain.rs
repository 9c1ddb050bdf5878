//! Canonical entity shapes: plants, costs, routes, demand, inventory,
//! policies, batches, jobs, runs, and KPI rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BatchId, JobId, RunId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantType {
    Clinker,
    Grinding,
    Terminal,
    Customer,
}

impl PlantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlantType::Clinker => "clinker",
            PlantType::Grinding => "grinding",
            PlantType::Terminal => "terminal",
            PlantType::Customer => "customer",
        }
    }
}

impl std::str::FromStr for PlantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clinker" => Ok(PlantType::Clinker),
            "grinding" => Ok(PlantType::Grinding),
            "terminal" => Ok(PlantType::Terminal),
            "customer" => Ok(PlantType::Customer),
            other => Err(format!("unknown plant type: {other}")),
        }
    }
}

/// A node in the supply-chain graph. Created and mutated only by promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub plant_id: String,
    pub name: String,
    pub plant_type: PlantType,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// Composite key (plant_id, period).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionCapacityCost {
    pub max_capacity_tonnes: f64,
    pub variable_cost_per_tonne: f64,
    pub fixed_cost_per_period: f64,
    pub min_run_level: f64,
    pub holding_cost_per_tonne: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Road,
    Rail,
    Sea,
    Barge,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Road => "road",
            TransportMode::Rail => "rail",
            TransportMode::Sea => "sea",
            TransportMode::Barge => "barge",
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "road" => Ok(TransportMode::Road),
            "rail" => Ok(TransportMode::Rail),
            "sea" => Ok(TransportMode::Sea),
            "barge" => Ok(TransportMode::Barge),
            other => Err(format!("unknown transport mode: {other}")),
        }
    }
}

/// Composite key (origin_plant_id, destination_node_id, transport_mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRoute {
    pub origin_plant_id: String,
    pub destination_node_id: String,
    pub transport_mode: TransportMode,
    pub distance_km: Option<f64>,
    pub cost_per_tonne: Option<f64>,
    pub cost_per_tonne_km: Option<f64>,
    pub fixed_cost_per_trip: f64,
    pub vehicle_capacity_tonnes: f64,
    pub minimum_batch_quantity_tonnes: f64,
    pub is_active: bool,
}

impl TransportRoute {
    /// Total per-tonne transport cost, per §4.5: direct if present,
    /// else distance-expanded, else zero.
    pub fn per_tonne_cost(&self) -> f64 {
        if let Some(direct) = self.cost_per_tonne {
            return direct;
        }
        match (self.cost_per_tonne_km, self.distance_km) {
            (Some(per_km), Some(distance)) => per_km * distance,
            _ => 0.0,
        }
    }
}

/// Composite key (customer_node_id, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub customer_node_id: String,
    pub period: String,
    pub demand_tonnes: f64,
    pub low_band_tonnes: Option<f64>,
    pub high_band_tonnes: Option<f64>,
    pub confidence: Option<f64>,
    pub source: Option<String>,
}

/// Composite key (node_id, period). Only the earliest period per node is
/// consumed by the planner as the opening balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialInventory {
    pub tonnes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyStockPolicyType {
    DaysOfCover,
    PercentOfDemand,
    Absolute,
}

impl std::str::FromStr for SafetyStockPolicyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days_of_cover" => Ok(SafetyStockPolicyType::DaysOfCover),
            "percent_of_demand" => Ok(SafetyStockPolicyType::PercentOfDemand),
            "absolute" => Ok(SafetyStockPolicyType::Absolute),
            other => Err(format!("unknown safety stock policy type: {other}")),
        }
    }
}

/// Key (node_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyStockPolicy {
    pub node_id: String,
    pub policy_type: SafetyStockPolicyType,
    pub policy_value: f64,
    pub safety_stock_tonnes: f64,
    pub max_inventory_tonnes: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Validated,
    Promoted,
    Failed,
    Expired,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Validated => "validated",
            BatchStatus::Promoted => "promoted",
            BatchStatus::Failed => "failed",
            BatchStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTable {
    Plants,
    ProductionCapacityCost,
    TransportRoutes,
    DemandForecast,
    InitialInventory,
    SafetyStockPolicy,
}

impl TargetTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTable::Plants => "plants",
            TargetTable::ProductionCapacityCost => "production_capacity_cost",
            TargetTable::TransportRoutes => "transport_routes",
            TargetTable::DemandForecast => "demand_forecast",
            TargetTable::InitialInventory => "initial_inventory",
            TargetTable::SafetyStockPolicy => "safety_stock_policy",
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            TargetTable::Plants => &["plant_id", "name", "plant_type"],
            TargetTable::ProductionCapacityCost => {
                &["plant_id", "period", "max_capacity_tonnes"]
            }
            TargetTable::TransportRoutes => {
                &["origin_plant_id", "destination_node_id", "transport_mode"]
            }
            TargetTable::DemandForecast => &["customer_node_id", "period", "demand_tonnes"],
            TargetTable::InitialInventory => &["node_id", "period", "tonnes"],
            TargetTable::SafetyStockPolicy => &["node_id", "policy_type", "policy_value"],
        }
    }
}

impl std::str::FromStr for TargetTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plants" => Ok(TargetTable::Plants),
            "production_capacity_cost" => Ok(TargetTable::ProductionCapacityCost),
            "transport_routes" => Ok(TargetTable::TransportRoutes),
            "demand_forecast" => Ok(TargetTable::DemandForecast),
            "initial_inventory" => Ok(TargetTable::InitialInventory),
            "safety_stock_policy" => Ok(TargetTable::SafetyStockPolicy),
            other => Err(format!("unknown target table: {other}")),
        }
    }
}

/// Lifecycle record for one ingested batch. Status transitions are
/// append-only: once written, a timestamp is never cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationBatch {
    pub batch_id: BatchId,
    pub source_descriptor: String,
    pub target_table: TargetTable,
    pub total_rows: i64,
    pub valid_rows: i64,
    pub invalid_rows: i64,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub promoted_at: Option<DateTime<Utc>>,
    pub error_summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingRowStatus {
    Pending,
    Valid,
    Invalid,
}

impl StagingRowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StagingRowStatus::Pending => "pending",
            StagingRowStatus::Valid => "valid",
            StagingRowStatus::Invalid => "invalid",
        }
    }
}

/// Idempotent (origin, destination, mode) lookup result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCacheEntry {
    pub origin_id: String,
    pub destination_id: String,
    pub transport_mode: TransportMode,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Whether `self -> next` is a permitted transition per §4.9.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Cancelled)
                | (JobStatus::Running, JobStatus::Success)
                | (JobStatus::Running, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub job_type: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub scenario_name: Option<String>,
    pub user_id: Option<String>,
    pub progress_percent: f64,
    pub progress_message: Option<String>,
    pub error_payload: Option<String>,
    pub result_ref: Option<String>,
    pub result_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRun {
    pub run_id: RunId,
    pub scenario_name: String,
    pub solver_name: String,
    pub solver_status: String,
    pub objective_value: Option<f64>,
    pub solve_time_seconds: Option<f64>,
    pub time_limit_seconds: f64,
    pub gap_tolerance: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub validation_status: String,
}

/// Materialized per-(scenario, period) summary. Overwritten on re-run
/// with the same scenario name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_cost: f64,
    pub production_cost: f64,
    pub transport_cost: f64,
    pub fixed_trip_cost: f64,
    pub holding_cost: f64,
    pub penalty_cost: f64,
    pub total_production_tonnes: f64,
    pub production_utilization: f64,
    pub total_shipment_tonnes: f64,
    pub total_trips: i64,
    pub transport_utilization: f64,
    pub sbq_compliance_rate: f64,
    pub average_inventory_tonnes: f64,
    pub inventory_turns: f64,
    pub total_demand_tonnes: f64,
    pub total_unmet_demand_tonnes: f64,
    pub demand_fulfillment_rate: f64,
    pub service_level: f64,
    pub stockout_events: i64,
}

/// Materialized per-scenario aggregate across all periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiAggregated {
    pub total_cost: f64,
    pub total_production_tonnes: f64,
    pub total_shipment_tonnes: f64,
    pub total_trips: i64,
    pub average_service_level: f64,
    pub total_unmet_demand_tonnes: f64,
    pub stockout_events: i64,
}
