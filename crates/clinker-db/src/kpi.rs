use clinker_core::{KpiAggregated, KpiSummary};
use sqlx::{Executor, Sqlite};

use crate::error::DbResult;
use crate::rows::{KpiAggregatedRow, KpiSummaryRow};

/// Per-(scenario, period) summary. Overwritten on re-run with the same
/// scenario name, per §3.
pub async fn upsert_summary<'e, E>(
    executor: E,
    scenario_name: &str,
    period: &str,
    kpi: &KpiSummary,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO kpi_summary (
            scenario_name, period, total_cost, production_cost, transport_cost,
            fixed_trip_cost, holding_cost, penalty_cost, total_production_tonnes,
            production_utilization, total_shipment_tonnes, total_trips,
            transport_utilization, sbq_compliance_rate, average_inventory_tonnes,
            inventory_turns, total_demand_tonnes, total_unmet_demand_tonnes,
            demand_fulfillment_rate, service_level, stockout_events
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(scenario_name, period) DO UPDATE SET
            total_cost = excluded.total_cost,
            production_cost = excluded.production_cost,
            transport_cost = excluded.transport_cost,
            fixed_trip_cost = excluded.fixed_trip_cost,
            holding_cost = excluded.holding_cost,
            penalty_cost = excluded.penalty_cost,
            total_production_tonnes = excluded.total_production_tonnes,
            production_utilization = excluded.production_utilization,
            total_shipment_tonnes = excluded.total_shipment_tonnes,
            total_trips = excluded.total_trips,
            transport_utilization = excluded.transport_utilization,
            sbq_compliance_rate = excluded.sbq_compliance_rate,
            average_inventory_tonnes = excluded.average_inventory_tonnes,
            inventory_turns = excluded.inventory_turns,
            total_demand_tonnes = excluded.total_demand_tonnes,
            total_unmet_demand_tonnes = excluded.total_unmet_demand_tonnes,
            demand_fulfillment_rate = excluded.demand_fulfillment_rate,
            service_level = excluded.service_level,
            stockout_events = excluded.stockout_events
        "#,
    )
    .bind(scenario_name)
    .bind(period)
    .bind(kpi.total_cost)
    .bind(kpi.production_cost)
    .bind(kpi.transport_cost)
    .bind(kpi.fixed_trip_cost)
    .bind(kpi.holding_cost)
    .bind(kpi.penalty_cost)
    .bind(kpi.total_production_tonnes)
    .bind(kpi.production_utilization)
    .bind(kpi.total_shipment_tonnes)
    .bind(kpi.total_trips)
    .bind(kpi.transport_utilization)
    .bind(kpi.sbq_compliance_rate)
    .bind(kpi.average_inventory_tonnes)
    .bind(kpi.inventory_turns)
    .bind(kpi.total_demand_tonnes)
    .bind(kpi.total_unmet_demand_tonnes)
    .bind(kpi.demand_fulfillment_rate)
    .bind(kpi.service_level)
    .bind(kpi.stockout_events)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_aggregated<'e, E>(
    executor: E,
    scenario_name: &str,
    kpi: &KpiAggregated,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO kpi_aggregated (
            scenario_name, total_cost, total_production_tonnes, total_shipment_tonnes,
            total_trips, average_service_level, total_unmet_demand_tonnes, stockout_events
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(scenario_name) DO UPDATE SET
            total_cost = excluded.total_cost,
            total_production_tonnes = excluded.total_production_tonnes,
            total_shipment_tonnes = excluded.total_shipment_tonnes,
            total_trips = excluded.total_trips,
            average_service_level = excluded.average_service_level,
            total_unmet_demand_tonnes = excluded.total_unmet_demand_tonnes,
            stockout_events = excluded.stockout_events
        "#,
    )
    .bind(scenario_name)
    .bind(kpi.total_cost)
    .bind(kpi.total_production_tonnes)
    .bind(kpi.total_shipment_tonnes)
    .bind(kpi.total_trips)
    .bind(kpi.average_service_level)
    .bind(kpi.total_unmet_demand_tonnes)
    .bind(kpi.stockout_events)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn fetch_summaries<'e, E>(
    executor: E,
    scenario_name: &str,
) -> DbResult<Vec<(String, KpiSummary)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(String, KpiSummaryRow)> = sqlx::query_as(
        "SELECT period, total_cost, production_cost, transport_cost, fixed_trip_cost, \
         holding_cost, penalty_cost, total_production_tonnes, production_utilization, \
         total_shipment_tonnes, total_trips, transport_utilization, sbq_compliance_rate, \
         average_inventory_tonnes, inventory_turns, total_demand_tonnes, \
         total_unmet_demand_tonnes, demand_fulfillment_rate, service_level, stockout_events \
         FROM kpi_summary WHERE scenario_name = ? ORDER BY period",
    )
    .bind(scenario_name)
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(|(period, row)| (period, row.into())).collect())
}

pub async fn fetch_aggregated<'e, E>(
    executor: E,
    scenario_name: &str,
) -> DbResult<Option<KpiAggregated>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<KpiAggregatedRow> = sqlx::query_as(
        "SELECT total_cost, total_production_tonnes, total_shipment_tonnes, total_trips, \
         average_service_level, total_unmet_demand_tonnes, stockout_events \
         FROM kpi_aggregated WHERE scenario_name = ?",
    )
    .bind(scenario_name)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(KpiAggregated::from))
}
