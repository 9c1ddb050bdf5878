//! Result Extractor: reads a [`SolveOutcome`] back through a
//! [`BuiltModel`]'s index maps into plan terms, with a cost-breakdown
//! consistency check against the reported objective (§4.7).

use serde::{Deserialize, Serialize};

use crate::driver::SolveOutcome;
use crate::error::SolverError;
use crate::model::BuiltModel;

const COST_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionEntry {
    pub plant_id: String,
    pub period: String,
    pub tonnes: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentEntry {
    pub origin_plant_id: String,
    pub destination_node_id: String,
    pub transport_mode: String,
    pub period: String,
    pub tonnes: f64,
    pub trips: i64,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub plant_id: String,
    pub period: String,
    pub tonnes: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmetDemandEntry {
    pub node_id: String,
    pub period: String,
    pub tonnes: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub production_cost: f64,
    pub transport_cost: f64,
    pub fixed_trip_cost: f64,
    pub holding_cost: f64,
    pub penalty_cost: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.production_cost + self.transport_cost + self.fixed_trip_cost + self.holding_cost + self.penalty_cost
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub solver: String,
    pub objective_value: f64,
    pub runtime_seconds: f64,
    pub production: Vec<ProductionEntry>,
    pub shipments: Vec<ShipmentEntry>,
    pub inventory: Vec<InventoryEntry>,
    pub unmet_demand: Vec<UnmetDemandEntry>,
    pub cost_breakdown: CostBreakdown,
}

/// Rounds variable values that good_lp returns with floating-point noise
/// (e.g. `2.0000000003` for an integer variable) back to a clean value.
fn clean(value: f64) -> f64 {
    if (value - value.round()).abs() < 1e-6 {
        value.round()
    } else {
        value
    }
}

pub fn extract(
    model: &BuiltModel,
    outcome: &SolveOutcome,
    dataset: &crate::dataset::PlanningDataset,
    penalty_rate: Option<f64>,
) -> Result<PlanResult, SolverError> {
    let mut production = Vec::new();
    for plant in &model.plants {
        for period in &model.periods {
            let var = model.prod[&(plant.clone(), period.clone())];
            production.push(ProductionEntry {
                plant_id: plant.clone(),
                period: period.clone(),
                tonnes: clean(outcome.values[&var]),
            });
        }
    }

    let mut inventory = Vec::new();
    for plant in &model.plants {
        for period in &model.periods {
            let var = model.inv[&(plant.clone(), period.clone())];
            inventory.push(InventoryEntry {
                plant_id: plant.clone(),
                period: period.clone(),
                tonnes: clean(outcome.values[&var]),
            });
        }
    }

    let mut shipments = Vec::new();
    let mut transport_cost = 0.0;
    let mut fixed_trip_cost = 0.0;
    for route_key in &model.routes {
        let route = dataset
            .active_routes()
            .into_iter()
            .find(|r| r.origin_plant_id == route_key.0 && r.destination_node_id == route_key.1 && r.transport_mode.as_str() == route_key.2)
            .expect("route present in model was sourced from dataset");
        for period in &model.periods {
            let ship_var = model.ship[&(route_key.clone(), period.clone())];
            let trips_var = model.trips[&(route_key.clone(), period.clone())];
            let use_var = model.use_mode[&(route_key.clone(), period.clone())];

            let tonnes = clean(outcome.values[&ship_var]);
            let trips = clean(outcome.values[&trips_var]) as i64;
            let active = outcome.values[&use_var] > 0.5;

            transport_cost += tonnes * route.per_tonne_cost();
            fixed_trip_cost += trips as f64 * route.fixed_cost_per_trip;

            if tonnes > 0.0 {
                shipments.push(ShipmentEntry {
                    origin_plant_id: route_key.0.clone(),
                    destination_node_id: route_key.1.clone(),
                    transport_mode: route_key.2.clone(),
                    period: period.clone(),
                    tonnes,
                    trips,
                    active,
                });
            }
        }
    }

    let mut production_cost = 0.0;
    let mut holding_cost = 0.0;
    for entry in &production {
        let cost = dataset
            .capacity_costs
            .get(&(entry.plant_id.clone(), entry.period.clone()))
            .map(|c| c.variable_cost_per_tonne)
            .unwrap_or(0.0);
        production_cost += entry.tonnes * cost;
    }
    for entry in &inventory {
        holding_cost += entry.tonnes * dataset.holding_cost_of(&entry.plant_id);
    }

    let mut unmet_demand = Vec::new();
    let mut penalty_cost = 0.0;
    if let Some(rate) = penalty_rate {
        for ((node, period), var) in &model.unmet_demand {
            let tonnes = clean(outcome.values[var]);
            penalty_cost += tonnes * rate;
            unmet_demand.push(UnmetDemandEntry { node_id: node.clone(), period: period.clone(), tonnes });
        }
    }

    let cost_breakdown =
        CostBreakdown { production_cost, transport_cost, fixed_trip_cost, holding_cost, penalty_cost };
    let summed = cost_breakdown.total();
    let objective = outcome.objective_value;
    let relative_gap = if objective.abs() > COST_TOLERANCE {
        ((summed - objective) / objective).abs()
    } else {
        (summed - objective).abs()
    };
    if relative_gap > COST_TOLERANCE {
        return Err(SolverError::InconsistentCostBreakdown { objective, summed });
    }

    Ok(PlanResult {
        solver: outcome.backend.clone(),
        objective_value: objective,
        runtime_seconds: outcome.runtime_seconds,
        production,
        shipments,
        inventory,
        unmet_demand,
        cost_breakdown,
    })
}
