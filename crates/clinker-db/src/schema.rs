//! Canonical and staging table definitions.
//!
//! Pre-v1: there is no migration history. `init_schema` issues
//! `CREATE TABLE IF NOT EXISTS` for every known table and is safe to run
//! on every process start.

use sqlx::{Pool, Sqlite};

use crate::error::DbResult;

/// Canonical tables, in dependency order (plants before anything that
/// references a plant_id).
pub const CANONICAL_TABLES: &[&str] = &[
    "plants",
    "production_capacity_cost",
    "transport_routes",
    "demand_forecast",
    "initial_inventory",
    "safety_stock_policy",
];

const CANONICAL_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS plants (
        plant_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        plant_type TEXT NOT NULL,
        latitude REAL,
        longitude REAL,
        region TEXT,
        country TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS production_capacity_cost (
        plant_id TEXT NOT NULL,
        period TEXT NOT NULL,
        max_capacity_tonnes REAL NOT NULL,
        variable_cost_per_tonne REAL NOT NULL,
        fixed_cost_per_period REAL NOT NULL,
        min_run_level REAL NOT NULL,
        holding_cost_per_tonne REAL NOT NULL,
        PRIMARY KEY (plant_id, period)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transport_routes (
        origin_plant_id TEXT NOT NULL,
        destination_node_id TEXT NOT NULL,
        transport_mode TEXT NOT NULL,
        distance_km REAL,
        cost_per_tonne REAL,
        cost_per_tonne_km REAL,
        fixed_cost_per_trip REAL NOT NULL,
        vehicle_capacity_tonnes REAL NOT NULL,
        minimum_batch_quantity_tonnes REAL NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (origin_plant_id, destination_node_id, transport_mode)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS demand_forecast (
        customer_node_id TEXT NOT NULL,
        period TEXT NOT NULL,
        demand_tonnes REAL NOT NULL,
        low_band_tonnes REAL,
        high_band_tonnes REAL,
        confidence REAL,
        source TEXT,
        PRIMARY KEY (customer_node_id, period)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS initial_inventory (
        node_id TEXT NOT NULL,
        period TEXT NOT NULL,
        tonnes REAL NOT NULL,
        PRIMARY KEY (node_id, period)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS safety_stock_policy (
        node_id TEXT PRIMARY KEY,
        policy_type TEXT NOT NULL,
        policy_value REAL NOT NULL,
        safety_stock_tonnes REAL NOT NULL,
        max_inventory_tonnes REAL
    )
    "#,
];

/// Each staging table mirrors its canonical counterpart's columns (all
/// nullable) plus (batch_id, source_row_number, validation_status, errors).
const STAGING_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS staging_plants (
        batch_id TEXT NOT NULL,
        source_row_number INTEGER NOT NULL,
        validation_status TEXT NOT NULL DEFAULT 'pending',
        errors TEXT,
        plant_id TEXT,
        name TEXT,
        plant_type TEXT,
        latitude REAL,
        longitude REAL,
        region TEXT,
        country TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staging_production_capacity_cost (
        batch_id TEXT NOT NULL,
        source_row_number INTEGER NOT NULL,
        validation_status TEXT NOT NULL DEFAULT 'pending',
        errors TEXT,
        plant_id TEXT,
        period TEXT,
        max_capacity_tonnes REAL,
        variable_cost_per_tonne REAL,
        fixed_cost_per_period REAL,
        min_run_level REAL,
        holding_cost_per_tonne REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staging_transport_routes (
        batch_id TEXT NOT NULL,
        source_row_number INTEGER NOT NULL,
        validation_status TEXT NOT NULL DEFAULT 'pending',
        errors TEXT,
        origin_plant_id TEXT,
        destination_node_id TEXT,
        transport_mode TEXT,
        distance_km REAL,
        cost_per_tonne REAL,
        cost_per_tonne_km REAL,
        fixed_cost_per_trip REAL,
        vehicle_capacity_tonnes REAL,
        minimum_batch_quantity_tonnes REAL,
        is_active INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staging_demand_forecast (
        batch_id TEXT NOT NULL,
        source_row_number INTEGER NOT NULL,
        validation_status TEXT NOT NULL DEFAULT 'pending',
        errors TEXT,
        customer_node_id TEXT,
        period TEXT,
        demand_tonnes REAL,
        low_band_tonnes REAL,
        high_band_tonnes REAL,
        confidence REAL,
        source TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staging_initial_inventory (
        batch_id TEXT NOT NULL,
        source_row_number INTEGER NOT NULL,
        validation_status TEXT NOT NULL DEFAULT 'pending',
        errors TEXT,
        node_id TEXT,
        period TEXT,
        tonnes REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staging_safety_stock_policy (
        batch_id TEXT NOT NULL,
        source_row_number INTEGER NOT NULL,
        validation_status TEXT NOT NULL DEFAULT 'pending',
        errors TEXT,
        node_id TEXT,
        policy_type TEXT,
        policy_value REAL,
        safety_stock_tonnes REAL,
        max_inventory_tonnes REAL
    )
    "#,
];

const ANCILLARY_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS validation_batch (
        batch_id TEXT PRIMARY KEY,
        source_descriptor TEXT NOT NULL,
        target_table TEXT NOT NULL,
        total_rows INTEGER NOT NULL,
        valid_rows INTEGER NOT NULL,
        invalid_rows INTEGER NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        validated_at TEXT,
        promoted_at TEXT,
        error_summary TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS route_cache (
        origin_id TEXT NOT NULL,
        destination_id TEXT NOT NULL,
        transport_mode TEXT NOT NULL,
        distance_km REAL NOT NULL,
        duration_minutes REAL NOT NULL,
        provider TEXT NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT,
        PRIMARY KEY (origin_id, destination_id, transport_mode)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        job_id TEXT PRIMARY KEY,
        job_type TEXT NOT NULL,
        status TEXT NOT NULL,
        submitted_at TEXT NOT NULL,
        started_at TEXT,
        finished_at TEXT,
        scenario_name TEXT,
        user_id TEXT,
        progress_percent REAL NOT NULL DEFAULT 0,
        progress_message TEXT,
        error_payload TEXT,
        result_ref TEXT,
        result_summary TEXT,
        payload TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS optimization_run (
        run_id TEXT PRIMARY KEY,
        scenario_name TEXT NOT NULL,
        solver_name TEXT NOT NULL,
        solver_status TEXT NOT NULL,
        objective_value REAL,
        solve_time_seconds REAL,
        time_limit_seconds REAL NOT NULL,
        gap_tolerance REAL NOT NULL,
        started_at TEXT NOT NULL,
        finished_at TEXT,
        validation_status TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS kpi_summary (
        scenario_name TEXT NOT NULL,
        period TEXT NOT NULL,
        total_cost REAL NOT NULL,
        production_cost REAL NOT NULL,
        transport_cost REAL NOT NULL,
        fixed_trip_cost REAL NOT NULL,
        holding_cost REAL NOT NULL,
        penalty_cost REAL NOT NULL,
        total_production_tonnes REAL NOT NULL,
        production_utilization REAL NOT NULL,
        total_shipment_tonnes REAL NOT NULL,
        total_trips INTEGER NOT NULL,
        transport_utilization REAL NOT NULL,
        sbq_compliance_rate REAL NOT NULL,
        average_inventory_tonnes REAL NOT NULL,
        inventory_turns REAL NOT NULL,
        total_demand_tonnes REAL NOT NULL,
        total_unmet_demand_tonnes REAL NOT NULL,
        demand_fulfillment_rate REAL NOT NULL,
        service_level REAL NOT NULL,
        stockout_events INTEGER NOT NULL,
        PRIMARY KEY (scenario_name, period)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS kpi_aggregated (
        scenario_name TEXT PRIMARY KEY,
        total_cost REAL NOT NULL,
        total_production_tonnes REAL NOT NULL,
        total_shipment_tonnes REAL NOT NULL,
        total_trips INTEGER NOT NULL,
        average_service_level REAL NOT NULL,
        total_unmet_demand_tonnes REAL NOT NULL,
        stockout_events INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scenario_record (
        scenario_name TEXT PRIMARY KEY,
        scenario_type TEXT NOT NULL,
        run_id TEXT,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_type TEXT NOT NULL,
        entity_id TEXT,
        user_id TEXT,
        detail TEXT,
        created_at TEXT NOT NULL
    )
    "#,
];

pub async fn init_schema(pool: &Pool<Sqlite>) -> DbResult<()> {
    for ddl in CANONICAL_DDL.iter().chain(STAGING_DDL).chain(ANCILLARY_DDL) {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(crate::error::DbError::Schema)?;
    }
    Ok(())
}
