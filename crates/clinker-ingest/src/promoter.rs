//! Promoter: copies a validated batch into canonical tables under a
//! single transaction boundary (§4.3). All-or-nothing.

use clinker_core::{
    BatchStatus, CellValue, DemandForecast, InitialInventory, Plant, ProductionCapacityCost,
    RawRow, SafetyStockPolicy, SafetyStockPolicyType, TargetTable, TransportMode, TransportRoute,
};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::error::PromoteError;

pub struct Promoter {
    pool: Pool<Sqlite>,
}

impl Promoter {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn promote(&self, batch_id: &str) -> Result<i64, PromoteError> {
        let batch = clinker_db::batches::get(&self.pool, batch_id)
            .await
            .map_err(PromoteError::Storage)?;

        if batch.status != BatchStatus::Validated || batch.invalid_rows != 0 {
            return Err(PromoteError::IllegalState { batch_id: batch.batch_id });
        }

        let rows = clinker_db::staging::fetch_valid_rows(&self.pool, batch_id, batch.target_table)
            .await
            .map_err(PromoteError::Storage)?;

        let mut tx = self.pool.begin().await.map_err(clinker_db::DbError::from)?;

        for (idx, row) in rows.iter().enumerate() {
            promote_row(&mut tx, batch.target_table, row).await.map_err(|reason| {
                PromoteError::Conversion {
                    batch_id: batch.batch_id.clone(),
                    row_number: idx as i64 + 1,
                    reason,
                }
            })?;
        }

        clinker_db::batches::mark_promoted(&mut *tx, batch_id).await?;
        tx.commit().await.map_err(clinker_db::DbError::from)?;

        info!(batch_id, rows = rows.len(), "batch promoted");
        clinker_db::audit::log_event(
            &self.pool,
            "batch_promoted",
            Some(batch_id),
            None,
            Some(&format!("rows_promoted={}", rows.len())),
        )
        .await;
        Ok(rows.len() as i64)
    }
}

fn text(row: &RawRow, col: &str) -> Option<String> {
    row.get(col).and_then(CellValue::as_str).map(str::to_string)
}

fn number(row: &RawRow, col: &str) -> Option<f64> {
    row.get(col).and_then(CellValue::as_f64)
}

async fn promote_row(
    tx: &mut sqlx::SqliteConnection,
    target: TargetTable,
    row: &RawRow,
) -> Result<(), String> {
    match target {
        TargetTable::Plants => {
            let plant = Plant {
                plant_id: text(row, "plant_id").ok_or("missing plant_id")?,
                name: text(row, "name").ok_or("missing name")?,
                plant_type: text(row, "plant_type")
                    .ok_or("missing plant_type")?
                    .parse()
                    .map_err(|e: String| e)?,
                latitude: number(row, "latitude"),
                longitude: number(row, "longitude"),
                region: text(row, "region"),
                country: text(row, "country"),
            };
            clinker_db::canonical::upsert_plant(&mut *tx, &plant).await.map_err(|e| e.to_string())
        }
        TargetTable::ProductionCapacityCost => {
            let plant_id = text(row, "plant_id").ok_or("missing plant_id")?;
            let period = text(row, "period").ok_or("missing period")?;
            let cost = ProductionCapacityCost {
                max_capacity_tonnes: number(row, "max_capacity_tonnes")
                    .ok_or("missing max_capacity_tonnes")?,
                variable_cost_per_tonne: number(row, "variable_cost_per_tonne").unwrap_or(0.0),
                fixed_cost_per_period: number(row, "fixed_cost_per_period").unwrap_or(0.0),
                min_run_level: number(row, "min_run_level").unwrap_or(0.0),
                holding_cost_per_tonne: number(row, "holding_cost_per_tonne").unwrap_or(0.0),
            };
            clinker_db::canonical::upsert_capacity_cost(&mut *tx, &plant_id, &period, &cost)
                .await
                .map_err(|e| e.to_string())
        }
        TargetTable::TransportRoutes => {
            let mode: TransportMode = text(row, "transport_mode")
                .ok_or("missing transport_mode")?
                .parse()
                .map_err(|e: String| e)?;
            let is_active = row
                .get("is_active")
                .map(|v| !matches!(v, CellValue::Bool(false) | CellValue::Integer(0)))
                .unwrap_or(true);
            let route = TransportRoute {
                origin_plant_id: text(row, "origin_plant_id").ok_or("missing origin_plant_id")?,
                destination_node_id: text(row, "destination_node_id")
                    .ok_or("missing destination_node_id")?,
                transport_mode: mode,
                distance_km: number(row, "distance_km"),
                cost_per_tonne: number(row, "cost_per_tonne"),
                cost_per_tonne_km: number(row, "cost_per_tonne_km"),
                fixed_cost_per_trip: number(row, "fixed_cost_per_trip").unwrap_or(0.0),
                vehicle_capacity_tonnes: number(row, "vehicle_capacity_tonnes").unwrap_or(0.0),
                minimum_batch_quantity_tonnes: number(row, "minimum_batch_quantity_tonnes")
                    .unwrap_or(0.0),
                is_active,
            };
            clinker_db::canonical::upsert_route(&mut *tx, &route).await.map_err(|e| e.to_string())
        }
        TargetTable::DemandForecast => {
            let demand = DemandForecast {
                customer_node_id: text(row, "customer_node_id")
                    .ok_or("missing customer_node_id")?,
                period: text(row, "period").ok_or("missing period")?,
                demand_tonnes: number(row, "demand_tonnes").ok_or("missing demand_tonnes")?,
                low_band_tonnes: number(row, "low_band_tonnes"),
                high_band_tonnes: number(row, "high_band_tonnes"),
                confidence: number(row, "confidence"),
                source: text(row, "source"),
            };
            clinker_db::canonical::upsert_demand(&mut *tx, &demand).await.map_err(|e| e.to_string())
        }
        TargetTable::InitialInventory => {
            let node_id = text(row, "node_id").ok_or("missing node_id")?;
            let period = text(row, "period").ok_or("missing period")?;
            let inventory =
                InitialInventory { tonnes: number(row, "tonnes").ok_or("missing tonnes")? };
            clinker_db::canonical::upsert_initial_inventory(&mut *tx, &node_id, &period, &inventory)
                .await
                .map_err(|e| e.to_string())
        }
        TargetTable::SafetyStockPolicy => {
            let policy_type: SafetyStockPolicyType = text(row, "policy_type")
                .ok_or("missing policy_type")?
                .parse()
                .map_err(|e: String| e)?;
            let policy = SafetyStockPolicy {
                node_id: text(row, "node_id").ok_or("missing node_id")?,
                policy_type,
                policy_value: number(row, "policy_value").ok_or("missing policy_value")?,
                safety_stock_tonnes: number(row, "safety_stock_tonnes").unwrap_or(0.0),
                max_inventory_tonnes: number(row, "max_inventory_tonnes"),
            };
            clinker_db::canonical::upsert_safety_stock(&mut *tx, &policy)
                .await
                .map_err(|e| e.to_string())
        }
    }
}
