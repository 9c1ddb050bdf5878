//! Writes rows into a staging table under a batch id, and reads them
//! back for the Validator and Promoter.

use clinker_core::{CellValue, RawRow, StagingRowStatus, TargetTable};
use sqlx::{Executor, Row, Sqlite, SqliteConnection};

use crate::error::DbResult;

fn staging_table_name(target: TargetTable) -> &'static str {
    match target {
        TargetTable::Plants => "staging_plants",
        TargetTable::ProductionCapacityCost => "staging_production_capacity_cost",
        TargetTable::TransportRoutes => "staging_transport_routes",
        TargetTable::DemandForecast => "staging_demand_forecast",
        TargetTable::InitialInventory => "staging_initial_inventory",
        TargetTable::SafetyStockPolicy => "staging_safety_stock_policy",
    }
}

/// Domain columns of each staging table, in the order they should be
/// bound. Excludes the four bookkeeping columns every staging table
/// carries (batch_id, source_row_number, validation_status, errors).
fn domain_columns(target: TargetTable) -> &'static [&'static str] {
    match target {
        TargetTable::Plants => {
            &["plant_id", "name", "plant_type", "latitude", "longitude", "region", "country"]
        }
        TargetTable::ProductionCapacityCost => &[
            "plant_id",
            "period",
            "max_capacity_tonnes",
            "variable_cost_per_tonne",
            "fixed_cost_per_period",
            "min_run_level",
            "holding_cost_per_tonne",
        ],
        TargetTable::TransportRoutes => &[
            "origin_plant_id",
            "destination_node_id",
            "transport_mode",
            "distance_km",
            "cost_per_tonne",
            "cost_per_tonne_km",
            "fixed_cost_per_trip",
            "vehicle_capacity_tonnes",
            "minimum_batch_quantity_tonnes",
            "is_active",
        ],
        TargetTable::DemandForecast => &[
            "customer_node_id",
            "period",
            "demand_tonnes",
            "low_band_tonnes",
            "high_band_tonnes",
            "confidence",
            "source",
        ],
        TargetTable::InitialInventory => &["node_id", "period", "tonnes"],
        TargetTable::SafetyStockPolicy => &[
            "node_id",
            "policy_type",
            "policy_value",
            "safety_stock_tonnes",
            "max_inventory_tonnes",
        ],
    }
}

/// Insert every row of `rows` into the staging table for `target`,
/// tagged with `batch_id` and a 1-based `source_row_number`. Returns the
/// count inserted. Column names are assumed already normalized by the
/// caller (trim/lowercase/underscore) per the ingestion contract.
pub async fn insert_rows(
    conn: &mut SqliteConnection,
    batch_id: &str,
    target: TargetTable,
    rows: &[RawRow],
) -> DbResult<i64> {
    let table = staging_table_name(target);
    let columns = domain_columns(target);

    let mut placeholders = String::from("?, ?, 'pending', NULL");
    let mut column_list = String::from("batch_id, source_row_number, validation_status, errors");
    for col in columns {
        column_list.push_str(", ");
        column_list.push_str(col);
        placeholders.push_str(", ?");
    }
    let sql = format!("INSERT INTO {table} ({column_list}) VALUES ({placeholders})");

    let mut inserted = 0i64;
    for (idx, row) in rows.iter().enumerate() {
        let mut query = sqlx::query(&sql).bind(batch_id).bind((idx + 1) as i64);
        for col in columns {
            query = match row.get(*col) {
                Some(CellValue::Text(s)) => query.bind(s.clone()),
                Some(CellValue::Integer(i)) => query.bind(*i),
                Some(CellValue::Float(f)) => query.bind(*f),
                Some(CellValue::Bool(b)) => query.bind(*b as i64),
                Some(CellValue::Null) | None => query.bind(Option::<String>::None),
            };
        }
        query.execute(&mut *conn).await?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Fetch every staging row of a batch as a generic typed row, keyed by
/// its `source_row_number`, for the Validator to sweep.
pub async fn fetch_batch_rows<'e, E>(
    executor: E,
    batch_id: &str,
    target: TargetTable,
) -> DbResult<Vec<(i64, RawRow)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let table = staging_table_name(target);
    let sql = format!("SELECT * FROM {table} WHERE batch_id = ? ORDER BY source_row_number");
    let rows = sqlx::query(&sql).bind(batch_id).fetch_all(executor).await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let source_row_number: i64 = row.try_get("source_row_number")?;
        let mut raw = RawRow::new();
        for col in domain_columns(target) {
            let value = row
                .try_get::<Option<f64>, _>(*col)
                .ok()
                .flatten()
                .map(CellValue::Float)
                .or_else(|| {
                    row.try_get::<Option<String>, _>(*col)
                        .ok()
                        .flatten()
                        .map(CellValue::Text)
                })
                .unwrap_or(CellValue::Null);
            raw.insert((*col).to_string(), value);
        }
        out.push((source_row_number, raw));
    }
    Ok(out)
}

pub async fn update_row_status<'e, E>(
    executor: E,
    batch_id: &str,
    target: TargetTable,
    source_row_number: i64,
    status: StagingRowStatus,
    errors_json: Option<&str>,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let table = staging_table_name(target);
    let sql = format!(
        "UPDATE {table} SET validation_status = ?, errors = ? \
         WHERE batch_id = ? AND source_row_number = ?"
    );
    sqlx::query(&sql)
        .bind(status.as_str())
        .bind(errors_json)
        .bind(batch_id)
        .bind(source_row_number)
        .execute(executor)
        .await?;
    Ok(())
}

/// Rows with `validation_status = 'valid'`, for the Promoter.
pub async fn fetch_valid_rows<'e, E>(
    executor: E,
    batch_id: &str,
    target: TargetTable,
) -> DbResult<Vec<RawRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let table = staging_table_name(target);
    let sql = format!(
        "SELECT * FROM {table} WHERE batch_id = ? AND validation_status = 'valid' \
         ORDER BY source_row_number"
    );
    let rows = sqlx::query(&sql).bind(batch_id).fetch_all(executor).await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut raw = RawRow::new();
        for col in domain_columns(target) {
            let value = row
                .try_get::<Option<f64>, _>(*col)
                .ok()
                .flatten()
                .map(CellValue::Float)
                .or_else(|| {
                    row.try_get::<Option<String>, _>(*col)
                        .ok()
                        .flatten()
                        .map(CellValue::Text)
                })
                .unwrap_or(CellValue::Null);
            raw.insert((*col).to_string(), value);
        }
        out.push(raw);
    }
    Ok(out)
}
