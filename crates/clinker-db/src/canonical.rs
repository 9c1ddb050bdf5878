//! Reads and upserts against the canonical tables. Upserts are only ever
//! called from the Promoter (see `clinker-ingest`); everything else reads.

use clinker_core::{
    DemandForecast, InitialInventory, Plant, ProductionCapacityCost, SafetyStockPolicy,
    TransportRoute,
};
use sqlx::{Executor, Sqlite};
use std::collections::BTreeMap;

use crate::error::DbResult;
use crate::rows::{
    DemandForecastRow, InitialInventoryRow, PlantRow, ProductionCapacityCostRow,
    SafetyStockPolicyRow, TransportRouteRow,
};

pub async fn fetch_plants<'e, E>(executor: E) -> DbResult<Vec<Plant>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<PlantRow> = sqlx::query_as("SELECT * FROM plants").fetch_all(executor).await?;
    rows.into_iter().map(Plant::try_from).collect()
}

pub async fn fetch_capacity_costs<'e, E>(
    executor: E,
) -> DbResult<BTreeMap<(String, String), ProductionCapacityCost>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<ProductionCapacityCostRow> =
        sqlx::query_as("SELECT * FROM production_capacity_cost")
            .fetch_all(executor)
            .await?;
    Ok(rows
        .into_iter()
        .map(ProductionCapacityCostRow::into_domain)
        .map(|(plant, period, cost)| ((plant, period), cost))
        .collect())
}

pub async fn fetch_active_routes<'e, E>(executor: E) -> DbResult<Vec<TransportRoute>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<TransportRouteRow> =
        sqlx::query_as("SELECT * FROM transport_routes WHERE is_active = 1")
            .fetch_all(executor)
            .await?;
    rows.into_iter().map(TransportRoute::try_from).collect()
}

pub async fn fetch_demand<'e, E>(executor: E) -> DbResult<Vec<DemandForecast>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<DemandForecastRow> =
        sqlx::query_as("SELECT * FROM demand_forecast").fetch_all(executor).await?;
    Ok(rows.into_iter().map(DemandForecast::from).collect())
}

pub async fn fetch_initial_inventory<'e, E>(
    executor: E,
) -> DbResult<BTreeMap<(String, String), InitialInventory>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<InitialInventoryRow> =
        sqlx::query_as("SELECT * FROM initial_inventory").fetch_all(executor).await?;
    Ok(rows
        .into_iter()
        .map(InitialInventoryRow::into_domain)
        .map(|(node, period, inv)| ((node, period), inv))
        .collect())
}

pub async fn fetch_safety_stock<'e, E>(
    executor: E,
) -> DbResult<Vec<SafetyStockPolicy>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<SafetyStockPolicyRow> =
        sqlx::query_as("SELECT * FROM safety_stock_policy").fetch_all(executor).await?;
    rows.into_iter().map(SafetyStockPolicy::try_from).collect()
}

pub async fn upsert_plant<'e, E>(executor: E, plant: &Plant) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO plants (plant_id, name, plant_type, latitude, longitude, region, country)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(plant_id) DO UPDATE SET
            name = excluded.name,
            plant_type = excluded.plant_type,
            latitude = excluded.latitude,
            longitude = excluded.longitude,
            region = excluded.region,
            country = excluded.country
        "#,
    )
    .bind(&plant.plant_id)
    .bind(&plant.name)
    .bind(plant.plant_type.as_str())
    .bind(plant.latitude)
    .bind(plant.longitude)
    .bind(&plant.region)
    .bind(&plant.country)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_capacity_cost<'e, E>(
    executor: E,
    plant_id: &str,
    period: &str,
    cost: &ProductionCapacityCost,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO production_capacity_cost
            (plant_id, period, max_capacity_tonnes, variable_cost_per_tonne,
             fixed_cost_per_period, min_run_level, holding_cost_per_tonne)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(plant_id, period) DO UPDATE SET
            max_capacity_tonnes = excluded.max_capacity_tonnes,
            variable_cost_per_tonne = excluded.variable_cost_per_tonne,
            fixed_cost_per_period = excluded.fixed_cost_per_period,
            min_run_level = excluded.min_run_level,
            holding_cost_per_tonne = excluded.holding_cost_per_tonne
        "#,
    )
    .bind(plant_id)
    .bind(period)
    .bind(cost.max_capacity_tonnes)
    .bind(cost.variable_cost_per_tonne)
    .bind(cost.fixed_cost_per_period)
    .bind(cost.min_run_level)
    .bind(cost.holding_cost_per_tonne)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_route<'e, E>(executor: E, route: &TransportRoute) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO transport_routes
            (origin_plant_id, destination_node_id, transport_mode, distance_km,
             cost_per_tonne, cost_per_tonne_km, fixed_cost_per_trip,
             vehicle_capacity_tonnes, minimum_batch_quantity_tonnes, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(origin_plant_id, destination_node_id, transport_mode) DO UPDATE SET
            distance_km = excluded.distance_km,
            cost_per_tonne = excluded.cost_per_tonne,
            cost_per_tonne_km = excluded.cost_per_tonne_km,
            fixed_cost_per_trip = excluded.fixed_cost_per_trip,
            vehicle_capacity_tonnes = excluded.vehicle_capacity_tonnes,
            minimum_batch_quantity_tonnes = excluded.minimum_batch_quantity_tonnes,
            is_active = excluded.is_active
        "#,
    )
    .bind(&route.origin_plant_id)
    .bind(&route.destination_node_id)
    .bind(route.transport_mode.as_str())
    .bind(route.distance_km)
    .bind(route.cost_per_tonne)
    .bind(route.cost_per_tonne_km)
    .bind(route.fixed_cost_per_trip)
    .bind(route.vehicle_capacity_tonnes)
    .bind(route.minimum_batch_quantity_tonnes)
    .bind(route.is_active as i64)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_demand<'e, E>(executor: E, demand: &DemandForecast) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO demand_forecast
            (customer_node_id, period, demand_tonnes, low_band_tonnes,
             high_band_tonnes, confidence, source)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(customer_node_id, period) DO UPDATE SET
            demand_tonnes = excluded.demand_tonnes,
            low_band_tonnes = excluded.low_band_tonnes,
            high_band_tonnes = excluded.high_band_tonnes,
            confidence = excluded.confidence,
            source = excluded.source
        "#,
    )
    .bind(&demand.customer_node_id)
    .bind(&demand.period)
    .bind(demand.demand_tonnes)
    .bind(demand.low_band_tonnes)
    .bind(demand.high_band_tonnes)
    .bind(demand.confidence)
    .bind(&demand.source)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_initial_inventory<'e, E>(
    executor: E,
    node_id: &str,
    period: &str,
    inventory: &InitialInventory,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO initial_inventory (node_id, period, tonnes)
        VALUES (?, ?, ?)
        ON CONFLICT(node_id, period) DO UPDATE SET tonnes = excluded.tonnes
        "#,
    )
    .bind(node_id)
    .bind(period)
    .bind(inventory.tonnes)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_safety_stock<'e, E>(executor: E, policy: &SafetyStockPolicy) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO safety_stock_policy
            (node_id, policy_type, policy_value, safety_stock_tonnes, max_inventory_tonnes)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(node_id) DO UPDATE SET
            policy_type = excluded.policy_type,
            policy_value = excluded.policy_value,
            safety_stock_tonnes = excluded.safety_stock_tonnes,
            max_inventory_tonnes = excluded.max_inventory_tonnes
        "#,
    )
    .bind(&policy.node_id)
    .bind(match policy.policy_type {
        clinker_core::SafetyStockPolicyType::DaysOfCover => "days_of_cover",
        clinker_core::SafetyStockPolicyType::PercentOfDemand => "percent_of_demand",
        clinker_core::SafetyStockPolicyType::Absolute => "absolute",
    })
    .bind(policy.policy_value)
    .bind(policy.safety_stock_tonnes)
    .bind(policy.max_inventory_tonnes)
    .execute(executor)
    .await?;
    Ok(())
}

/// Used by the Validator's referential-integrity stage: a reference
/// check is skipped entirely when the referenced table has no rows yet.
pub async fn table_is_empty<'e, E>(executor: E, table: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(executor)
        .await?;
    Ok(count == 0)
}

/// Used by the Validator's missing-data-scan stage: the distinct set of
/// periods that have a production capacity/cost row, to flag demand rows
/// forecasting a period planning has no capacity data for.
pub async fn capacity_cost_periods<'e, E>(executor: E) -> DbResult<std::collections::HashSet<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let periods: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT period FROM production_capacity_cost")
            .fetch_all(executor)
            .await?;
    Ok(periods.into_iter().collect())
}

pub async fn fetch_plant<'e, E>(executor: E, plant_id: &str) -> DbResult<Option<Plant>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<PlantRow> = sqlx::query_as("SELECT * FROM plants WHERE plant_id = ?")
        .bind(plant_id)
        .fetch_optional(executor)
        .await?;
    row.map(Plant::try_from).transpose()
}

pub async fn plant_exists<'e, E>(executor: E, plant_id: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plants WHERE plant_id = ?")
        .bind(plant_id)
        .fetch_one(executor)
        .await?;
    Ok(count > 0)
}
