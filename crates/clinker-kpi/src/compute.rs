//! Pure KPI computation from a solved plan, exactly as §4.10 specifies.
//! No I/O; the materializer persists what this returns.

use std::collections::BTreeMap;

use clinker_core::{KpiAggregated, KpiSummary};
use clinker_solver::{PlanResult, PlanningDataset};

/// Per-(scenario, period) summaries plus the per-scenario aggregate
/// across all periods.
pub struct KpiReport {
    pub per_period: Vec<(String, KpiSummary)>,
    pub aggregated: KpiAggregated,
}

pub fn compute(dataset: &PlanningDataset, plan: &PlanResult) -> KpiReport {
    let periods = dataset.period_order();
    let mut per_period = Vec::with_capacity(periods.len());

    for period in &periods {
        per_period.push((period.clone(), compute_period(dataset, plan, period)));
    }

    let aggregated = aggregate(&per_period);
    KpiReport { per_period, aggregated }
}

fn compute_period(dataset: &PlanningDataset, plan: &PlanResult, period: &str) -> KpiSummary {
    let production_for_period: Vec<_> = plan.production.iter().filter(|p| p.period == period).collect();
    let shipments_for_period: Vec<_> = plan.shipments.iter().filter(|s| s.period == period).collect();
    let inventory_for_period: Vec<_> = plan.inventory.iter().filter(|i| i.period == period).collect();

    let total_production_tonnes: f64 = production_for_period.iter().map(|p| p.tonnes).sum();
    let total_capacity: f64 = dataset.plant_ids().iter().map(|plant| dataset.capacity_of(plant, period)).sum();
    let production_utilization = if total_capacity > 0.0 { total_production_tonnes / total_capacity } else { 0.0 };

    let total_shipment_tonnes: f64 = shipments_for_period.iter().map(|s| s.tonnes).sum();
    let total_trips: i64 = shipments_for_period.iter().map(|s| s.trips).sum();
    let mean_vehicle_capacity = {
        let routes = dataset.active_routes();
        if routes.is_empty() {
            0.0
        } else {
            routes.iter().map(|r| r.vehicle_capacity_tonnes).sum::<f64>() / routes.len() as f64
        }
    };
    let transport_utilization = if total_trips > 0 && mean_vehicle_capacity > 0.0 {
        total_shipment_tonnes / (total_trips as f64 * mean_vehicle_capacity)
    } else {
        0.0
    };

    let active_routes_with_sbq: Vec<_> = dataset
        .active_routes()
        .into_iter()
        .filter(|r| r.minimum_batch_quantity_tonnes > 0.0)
        .collect();
    let sbq_compliance_rate = if active_routes_with_sbq.is_empty() {
        1.0
    } else {
        let compliant = shipments_for_period
            .iter()
            .filter(|s| {
                active_routes_with_sbq.iter().any(|r| {
                    r.origin_plant_id == s.origin_plant_id
                        && r.destination_node_id == s.destination_node_id
                        && r.transport_mode.as_str() == s.transport_mode
                        && s.tonnes + 1e-6 >= r.minimum_batch_quantity_tonnes
                })
            })
            .count();
        let relevant = shipments_for_period
            .iter()
            .filter(|s| s.tonnes > 1e-6)
            .filter(|s| {
                active_routes_with_sbq.iter().any(|r| {
                    r.origin_plant_id == s.origin_plant_id
                        && r.destination_node_id == s.destination_node_id
                        && r.transport_mode.as_str() == s.transport_mode
                })
            })
            .count();
        if relevant == 0 {
            1.0
        } else {
            compliant as f64 / relevant as f64
        }
    };

    let average_inventory_tonnes = if inventory_for_period.is_empty() {
        0.0
    } else {
        inventory_for_period.iter().map(|i| i.tonnes).sum::<f64>() / inventory_for_period.len() as f64
    };
    let inventory_turns = if average_inventory_tonnes > 0.0 {
        total_shipment_tonnes / average_inventory_tonnes
    } else {
        0.0
    };

    let mut fulfilled_by_node: BTreeMap<String, f64> = BTreeMap::new();
    let mut demand_total = 0.0;
    for node in dataset.demand_node_ids() {
        let demand = dataset.demand_of(&node, period);
        demand_total += demand;
        let fulfilled: f64 = shipments_for_period.iter().filter(|s| s.destination_node_id == node).map(|s| s.tonnes).sum();
        fulfilled_by_node.insert(node, fulfilled);
    }

    let total_fulfilled_capped: f64 = fulfilled_by_node
        .iter()
        .map(|(node, fulfilled)| fulfilled.min(dataset.demand_of(node, period)))
        .sum();
    let service_level = if demand_total > 0.0 { (total_fulfilled_capped / demand_total).min(1.0) } else { 1.0 };

    let total_unmet_demand_tonnes: f64 = plan
        .unmet_demand
        .iter()
        .filter(|u| u.period == period)
        .map(|u| u.tonnes)
        .sum();
    let demand_fulfillment_rate = if demand_total > 0.0 { (demand_total - total_unmet_demand_tonnes) / demand_total } else { 1.0 };

    let stockout_events = fulfilled_by_node
        .iter()
        .filter(|(node, fulfilled)| **fulfilled + 1e-6 < dataset.demand_of(node, period))
        .count() as i64;

    let period_production_cost: f64 = production_for_period
        .iter()
        .map(|p| {
            dataset
                .capacity_costs
                .get(&(p.plant_id.clone(), period.to_string()))
                .map(|c| c.variable_cost_per_tonne * p.tonnes)
                .unwrap_or(0.0)
        })
        .sum();
    let period_transport_cost: f64 = shipments_for_period
        .iter()
        .map(|s| {
            dataset
                .active_routes()
                .into_iter()
                .find(|r| {
                    r.origin_plant_id == s.origin_plant_id
                        && r.destination_node_id == s.destination_node_id
                        && r.transport_mode.as_str() == s.transport_mode
                })
                .map(|r| r.per_tonne_cost() * s.tonnes)
                .unwrap_or(0.0)
        })
        .sum();
    let period_fixed_trip_cost: f64 = shipments_for_period
        .iter()
        .map(|s| {
            dataset
                .active_routes()
                .into_iter()
                .find(|r| {
                    r.origin_plant_id == s.origin_plant_id
                        && r.destination_node_id == s.destination_node_id
                        && r.transport_mode.as_str() == s.transport_mode
                })
                .map(|r| r.fixed_cost_per_trip * s.trips as f64)
                .unwrap_or(0.0)
        })
        .sum();
    let period_holding_cost: f64 = inventory_for_period.iter().map(|i| i.tonnes * dataset.holding_cost_of(&i.plant_id)).sum();

    // The penalty rate is flat across the plan, so recover it from the
    // solver's totals rather than threading `PenaltyPolicy` through here.
    let total_unmet_all_periods: f64 = plan.unmet_demand.iter().map(|u| u.tonnes).sum();
    let penalty_rate = if total_unmet_all_periods > 1e-9 {
        plan.cost_breakdown.penalty_cost / total_unmet_all_periods
    } else {
        0.0
    };
    let period_penalty_cost = total_unmet_demand_tonnes * penalty_rate;

    KpiSummary {
        total_cost: period_production_cost + period_transport_cost + period_fixed_trip_cost + period_holding_cost + period_penalty_cost,
        production_cost: period_production_cost,
        transport_cost: period_transport_cost,
        fixed_trip_cost: period_fixed_trip_cost,
        holding_cost: period_holding_cost,
        penalty_cost: period_penalty_cost,
        total_production_tonnes,
        production_utilization,
        total_shipment_tonnes,
        total_trips,
        transport_utilization,
        sbq_compliance_rate,
        average_inventory_tonnes,
        inventory_turns,
        total_demand_tonnes: demand_total,
        total_unmet_demand_tonnes,
        demand_fulfillment_rate,
        service_level,
        stockout_events,
    }
}

fn aggregate(per_period: &[(String, KpiSummary)]) -> KpiAggregated {
    let total_cost = per_period.iter().map(|(_, k)| k.total_cost).sum();
    let total_production_tonnes = per_period.iter().map(|(_, k)| k.total_production_tonnes).sum();
    let total_shipment_tonnes = per_period.iter().map(|(_, k)| k.total_shipment_tonnes).sum();
    let total_trips = per_period.iter().map(|(_, k)| k.total_trips).sum();
    let total_unmet_demand_tonnes = per_period.iter().map(|(_, k)| k.total_unmet_demand_tonnes).sum();
    let stockout_events = per_period.iter().map(|(_, k)| k.stockout_events).sum();
    let average_service_level = if per_period.is_empty() {
        1.0
    } else {
        per_period.iter().map(|(_, k)| k.service_level).sum::<f64>() / per_period.len() as f64
    };

    KpiAggregated {
        total_cost,
        total_production_tonnes,
        total_shipment_tonnes,
        total_trips,
        average_service_level,
        total_unmet_demand_tonnes,
        stockout_events,
    }
}
