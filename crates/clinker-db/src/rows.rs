//! sqlx row shapes and their conversions to `clinker_core::domain` types.
//!
//! Kept separate from the core domain structs so that `clinker-core`
//! stays free of any I/O dependency, matching its "inert" contract.

use chrono::{DateTime, Utc};
use clinker_core::{
    BatchStatus, DemandForecast, InitialInventory, Job, JobStatus, KpiAggregated, KpiSummary,
    OptimizationRun, Plant, PlantType, ProductionCapacityCost, RouteCacheEntry, SafetyStockPolicy,
    SafetyStockPolicyType, TargetTable, TransportMode, TransportRoute, ValidationBatch,
};

use crate::error::{DbError, DbResult};

fn parse_dt(raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Schema(sqlx::Error::Decode(Box::new(e))))
}

fn parse_opt_dt(raw: Option<String>) -> DbResult<Option<DateTime<Utc>>> {
    raw.map(|s| parse_dt(&s)).transpose()
}

#[derive(Debug, sqlx::FromRow)]
pub struct PlantRow {
    pub plant_id: String,
    pub name: String,
    pub plant_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl TryFrom<PlantRow> for Plant {
    type Error = DbError;

    fn try_from(row: PlantRow) -> DbResult<Self> {
        Ok(Plant {
            plant_id: row.plant_id,
            name: row.name,
            plant_type: row
                .plant_type
                .parse::<PlantType>()
                .map_err(|_| DbError::NotFound)?,
            latitude: row.latitude,
            longitude: row.longitude,
            region: row.region,
            country: row.country,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProductionCapacityCostRow {
    pub plant_id: String,
    pub period: String,
    pub max_capacity_tonnes: f64,
    pub variable_cost_per_tonne: f64,
    pub fixed_cost_per_period: f64,
    pub min_run_level: f64,
    pub holding_cost_per_tonne: f64,
}

impl ProductionCapacityCostRow {
    pub fn into_domain(self) -> (String, String, ProductionCapacityCost) {
        (
            self.plant_id,
            self.period,
            ProductionCapacityCost {
                max_capacity_tonnes: self.max_capacity_tonnes,
                variable_cost_per_tonne: self.variable_cost_per_tonne,
                fixed_cost_per_period: self.fixed_cost_per_period,
                min_run_level: self.min_run_level,
                holding_cost_per_tonne: self.holding_cost_per_tonne,
            },
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct TransportRouteRow {
    pub origin_plant_id: String,
    pub destination_node_id: String,
    pub transport_mode: String,
    pub distance_km: Option<f64>,
    pub cost_per_tonne: Option<f64>,
    pub cost_per_tonne_km: Option<f64>,
    pub fixed_cost_per_trip: f64,
    pub vehicle_capacity_tonnes: f64,
    pub minimum_batch_quantity_tonnes: f64,
    pub is_active: i64,
}

impl TryFrom<TransportRouteRow> for TransportRoute {
    type Error = DbError;

    fn try_from(row: TransportRouteRow) -> DbResult<Self> {
        Ok(TransportRoute {
            origin_plant_id: row.origin_plant_id,
            destination_node_id: row.destination_node_id,
            transport_mode: row
                .transport_mode
                .parse::<TransportMode>()
                .map_err(|_| DbError::NotFound)?,
            distance_km: row.distance_km,
            cost_per_tonne: row.cost_per_tonne,
            cost_per_tonne_km: row.cost_per_tonne_km,
            fixed_cost_per_trip: row.fixed_cost_per_trip,
            vehicle_capacity_tonnes: row.vehicle_capacity_tonnes,
            minimum_batch_quantity_tonnes: row.minimum_batch_quantity_tonnes,
            is_active: row.is_active != 0,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DemandForecastRow {
    pub customer_node_id: String,
    pub period: String,
    pub demand_tonnes: f64,
    pub low_band_tonnes: Option<f64>,
    pub high_band_tonnes: Option<f64>,
    pub confidence: Option<f64>,
    pub source: Option<String>,
}

impl From<DemandForecastRow> for DemandForecast {
    fn from(row: DemandForecastRow) -> Self {
        DemandForecast {
            customer_node_id: row.customer_node_id,
            period: row.period,
            demand_tonnes: row.demand_tonnes,
            low_band_tonnes: row.low_band_tonnes,
            high_band_tonnes: row.high_band_tonnes,
            confidence: row.confidence,
            source: row.source,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct InitialInventoryRow {
    pub node_id: String,
    pub period: String,
    pub tonnes: f64,
}

impl InitialInventoryRow {
    pub fn into_domain(self) -> (String, String, InitialInventory) {
        (self.node_id, self.period, InitialInventory { tonnes: self.tonnes })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct SafetyStockPolicyRow {
    pub node_id: String,
    pub policy_type: String,
    pub policy_value: f64,
    pub safety_stock_tonnes: f64,
    pub max_inventory_tonnes: Option<f64>,
}

impl TryFrom<SafetyStockPolicyRow> for SafetyStockPolicy {
    type Error = DbError;

    fn try_from(row: SafetyStockPolicyRow) -> DbResult<Self> {
        Ok(SafetyStockPolicy {
            node_id: row.node_id,
            policy_type: row
                .policy_type
                .parse::<SafetyStockPolicyType>()
                .map_err(|_| DbError::NotFound)?,
            policy_value: row.policy_value,
            safety_stock_tonnes: row.safety_stock_tonnes,
            max_inventory_tonnes: row.max_inventory_tonnes,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ValidationBatchRow {
    pub batch_id: String,
    pub source_descriptor: String,
    pub target_table: String,
    pub total_rows: i64,
    pub valid_rows: i64,
    pub invalid_rows: i64,
    pub status: String,
    pub created_at: String,
    pub validated_at: Option<String>,
    pub promoted_at: Option<String>,
    pub error_summary: Option<String>,
}

impl TryFrom<ValidationBatchRow> for ValidationBatch {
    type Error = DbError;

    fn try_from(row: ValidationBatchRow) -> DbResult<Self> {
        Ok(ValidationBatch {
            batch_id: row.batch_id.into(),
            source_descriptor: row.source_descriptor,
            target_table: row
                .target_table
                .parse::<TargetTable>()
                .map_err(|_| DbError::NotFound)?,
            total_rows: row.total_rows,
            valid_rows: row.valid_rows,
            invalid_rows: row.invalid_rows,
            status: match row.status.as_str() {
                "pending" => BatchStatus::Pending,
                "validated" => BatchStatus::Validated,
                "promoted" => BatchStatus::Promoted,
                "failed" => BatchStatus::Failed,
                "expired" => BatchStatus::Expired,
                _ => return Err(DbError::NotFound),
            },
            created_at: parse_dt(&row.created_at)?,
            validated_at: parse_opt_dt(row.validated_at)?,
            promoted_at: parse_opt_dt(row.promoted_at)?,
            error_summary: row.error_summary,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct RouteCacheRow {
    pub origin_id: String,
    pub destination_id: String,
    pub transport_mode: String,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub provider: String,
    pub created_at: String,
    pub expires_at: Option<String>,
}

impl TryFrom<RouteCacheRow> for RouteCacheEntry {
    type Error = DbError;

    fn try_from(row: RouteCacheRow) -> DbResult<Self> {
        Ok(RouteCacheEntry {
            origin_id: row.origin_id,
            destination_id: row.destination_id,
            transport_mode: row
                .transport_mode
                .parse::<TransportMode>()
                .map_err(|_| DbError::NotFound)?,
            distance_km: row.distance_km,
            duration_minutes: row.duration_minutes,
            provider: row.provider,
            created_at: parse_dt(&row.created_at)?,
            expires_at: parse_opt_dt(row.expires_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct JobRow {
    pub job_id: String,
    pub job_type: String,
    pub status: String,
    pub submitted_at: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub scenario_name: Option<String>,
    pub user_id: Option<String>,
    pub progress_percent: f64,
    pub progress_message: Option<String>,
    pub error_payload: Option<String>,
    pub result_ref: Option<String>,
    pub result_summary: Option<String>,
}

impl TryFrom<JobRow> for Job {
    type Error = DbError;

    fn try_from(row: JobRow) -> DbResult<Self> {
        Ok(Job {
            job_id: row.job_id.into(),
            job_type: row.job_type,
            status: match row.status.as_str() {
                "pending" => JobStatus::Pending,
                "running" => JobStatus::Running,
                "success" => JobStatus::Success,
                "failed" => JobStatus::Failed,
                "cancelled" => JobStatus::Cancelled,
                _ => return Err(DbError::NotFound),
            },
            submitted_at: parse_dt(&row.submitted_at)?,
            started_at: parse_opt_dt(row.started_at)?,
            finished_at: parse_opt_dt(row.finished_at)?,
            scenario_name: row.scenario_name,
            user_id: row.user_id,
            progress_percent: row.progress_percent,
            progress_message: row.progress_message,
            error_payload: row.error_payload,
            result_ref: row.result_ref,
            result_summary: row.result_summary,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct OptimizationRunRow {
    pub run_id: String,
    pub scenario_name: String,
    pub solver_name: String,
    pub solver_status: String,
    pub objective_value: Option<f64>,
    pub solve_time_seconds: Option<f64>,
    pub time_limit_seconds: f64,
    pub gap_tolerance: f64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub validation_status: String,
}

impl TryFrom<OptimizationRunRow> for OptimizationRun {
    type Error = DbError;

    fn try_from(row: OptimizationRunRow) -> DbResult<Self> {
        Ok(OptimizationRun {
            run_id: row.run_id.into(),
            scenario_name: row.scenario_name,
            solver_name: row.solver_name,
            solver_status: row.solver_status,
            objective_value: row.objective_value,
            solve_time_seconds: row.solve_time_seconds,
            time_limit_seconds: row.time_limit_seconds,
            gap_tolerance: row.gap_tolerance,
            started_at: parse_dt(&row.started_at)?,
            finished_at: parse_opt_dt(row.finished_at)?,
            validation_status: row.validation_status,
        })
    }
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct KpiSummaryRow {
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

impl From<KpiSummaryRow> for KpiSummary {
    fn from(row: KpiSummaryRow) -> Self {
        KpiSummary {
            total_cost: row.total_cost,
            production_cost: row.production_cost,
            transport_cost: row.transport_cost,
            fixed_trip_cost: row.fixed_trip_cost,
            holding_cost: row.holding_cost,
            penalty_cost: row.penalty_cost,
            total_production_tonnes: row.total_production_tonnes,
            production_utilization: row.production_utilization,
            total_shipment_tonnes: row.total_shipment_tonnes,
            total_trips: row.total_trips,
            transport_utilization: row.transport_utilization,
            sbq_compliance_rate: row.sbq_compliance_rate,
            average_inventory_tonnes: row.average_inventory_tonnes,
            inventory_turns: row.inventory_turns,
            total_demand_tonnes: row.total_demand_tonnes,
            total_unmet_demand_tonnes: row.total_unmet_demand_tonnes,
            demand_fulfillment_rate: row.demand_fulfillment_rate,
            service_level: row.service_level,
            stockout_events: row.stockout_events,
        }
    }
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct KpiAggregatedRow {
    pub total_cost: f64,
    pub total_production_tonnes: f64,
    pub total_shipment_tonnes: f64,
    pub total_trips: i64,
    pub average_service_level: f64,
    pub total_unmet_demand_tonnes: f64,
    pub stockout_events: i64,
}

impl From<KpiAggregatedRow> for KpiAggregated {
    fn from(row: KpiAggregatedRow) -> Self {
        KpiAggregated {
            total_cost: row.total_cost,
            total_production_tonnes: row.total_production_tonnes,
            total_shipment_tonnes: row.total_shipment_tonnes,
            total_trips: row.total_trips,
            average_service_level: row.average_service_level,
            total_unmet_demand_tonnes: row.total_unmet_demand_tonnes,
            stockout_events: row.stockout_events,
        }
    }
}
