//! Model Builder: turns a [`PlanningDataset`] into sets, parameters,
//! variables, constraints, and an objective, per §4.5. Pure; no I/O.

use std::collections::BTreeMap;

use good_lp::{variable, Expression, ProblemVariables, Variable};

use crate::dataset::PlanningDataset;
use crate::error::ModelError;

/// Key for a route across the planning horizon: (origin, destination, mode-as-str).
pub type RouteKey = (String, String, String);

/// Variable handles and the index maps needed to read a solution back
/// into domain terms. Built once, consumed by the Result Extractor.
pub struct BuiltModel {
    pub vars: ProblemVariables,
    pub objective: Expression,
    pub constraints: Vec<good_lp::Constraint>,

    pub plants: Vec<String>,
    pub periods: Vec<String>,
    pub routes: Vec<RouteKey>,

    pub prod: BTreeMap<(String, String), Variable>,
    pub ship: BTreeMap<(RouteKey, String), Variable>,
    pub trips: BTreeMap<(RouteKey, String), Variable>,
    pub use_mode: BTreeMap<(RouteKey, String), Variable>,
    pub inv: BTreeMap<(String, String), Variable>,
    /// Unmet-demand slack per (node, period), present only when a penalty
    /// rate was supplied to `build` (§4.5 edge policy: opt-in, off by default).
    pub unmet_demand: BTreeMap<(String, String), Variable>,

    pub has_integer_vars: bool,
}

/// Builds the MILP per the sets/parameters/variables/constraints/objective
/// laid out in §4.5. Production is indexed by plant×period, shipments and
/// trips by route×period, inventory by plant×period (plants double as
/// the only inventory-holding nodes in this model).
///
/// `penalty_rate`, when `Some`, relaxes the demand equality into
/// `received + unmet == demand` and charges `unmet * rate` in the
/// objective instead of leaving the model infeasible under a shortfall.
pub fn build(dataset: &PlanningDataset, penalty_rate: Option<f64>) -> Result<BuiltModel, ModelError> {
    let periods = dataset.period_order();
    if periods.is_empty() {
        return Err(ModelError::EmptyHorizon);
    }
    let plants = dataset.plant_ids();
    let routes: Vec<RouteKey> = dataset
        .active_routes()
        .into_iter()
        .map(|r| {
            (r.origin_plant_id.clone(), r.destination_node_id.clone(), r.transport_mode.as_str().to_string())
        })
        .collect();

    for key in &routes {
        let route = dataset
            .active_routes()
            .into_iter()
            .find(|r| r.origin_plant_id == key.0 && r.destination_node_id == key.1 && r.transport_mode.as_str() == key.2)
            .expect("route key derived from active_routes()");
        if route.vehicle_capacity_tonnes <= 0.0 {
            return Err(ModelError::DegenerateRoute {
                origin: route.origin_plant_id.clone(),
                destination: route.destination_node_id.clone(),
            });
        }
    }

    let mut vars = ProblemVariables::new();
    let mut prod = BTreeMap::new();
    let mut ship = BTreeMap::new();
    let mut trips = BTreeMap::new();
    let mut use_mode = BTreeMap::new();
    let mut inv = BTreeMap::new();
    let mut unmet_demand = BTreeMap::new();

    for plant in &plants {
        for period in &periods {
            prod.insert((plant.clone(), period.clone()), vars.add(variable().min(0.0)));
            inv.insert((plant.clone(), period.clone()), vars.add(variable().min(0.0)));
        }
    }
    for route in &routes {
        for period in &periods {
            ship.insert((route.clone(), period.clone()), vars.add(variable().min(0.0)));
            trips.insert((route.clone(), period.clone()), vars.add(variable().integer().min(0.0)));
            use_mode.insert((route.clone(), period.clone()), vars.add(variable().binary()));
        }
    }

    let big_m = dataset.big_m();
    let mut constraints = Vec::new();

    // Capacity: prod[i,t] <= cap[i,t]
    for plant in &plants {
        for period in &periods {
            let capacity = dataset.capacity_of(plant, period);
            let p = prod[&(plant.clone(), period.clone())];
            constraints.push(Expression::from(p).leq(capacity));
        }
    }

    // Inventory balance: inv[i,t] = inv[i,t-1] + prod[i,t] - shipped_out[i,t]
    for plant in &plants {
        for (t_idx, period) in periods.iter().enumerate() {
            let inv_prev: Expression = if t_idx == 0 {
                Expression::from(dataset.initial_inventory_of(plant, period))
            } else {
                Expression::from(inv[&(plant.clone(), periods[t_idx - 1].clone())])
            };
            let shipped_out: Expression = routes
                .iter()
                .filter(|r| &r.0 == plant)
                .map(|r| Expression::from(ship[&(r.clone(), period.clone())]))
                .sum();
            let p = prod[&(plant.clone(), period.clone())];
            let this_inv = inv[&(plant.clone(), period.clone())];
            let balance = inv_prev + Expression::from(p) - shipped_out - Expression::from(this_inv);
            constraints.push(balance.eq(0.0));

            // Safety stock floor and max-inventory ceiling (when the
            // plant also carries a safety-stock policy as a node).
            let floor = dataset.safety_stock_of(plant);
            if floor > 0.0 {
                constraints.push(Expression::from(this_inv).geq(floor));
            }
            let ceiling = dataset.max_inventory_of(plant);
            if ceiling.is_finite() {
                constraints.push(Expression::from(this_inv).leq(ceiling));
            }
        }
    }

    // Demand equality: sum of shipments into node j in period t == demand[j,t],
    // optionally relaxed by an unmet-demand slack when penalties are enabled.
    for node in dataset.demand_node_ids() {
        for period in &periods {
            let received: Expression = routes
                .iter()
                .filter(|r| r.1 == node)
                .map(|r| Expression::from(ship[&(r.clone(), period.clone())]))
                .sum();
            if penalty_rate.is_some() {
                let slack = vars.add(variable().min(0.0));
                unmet_demand.insert((node.clone(), period.clone()), slack);
                constraints.push((received + Expression::from(slack)).eq(dataset.demand_of(&node, period)));
            } else {
                constraints.push(received.eq(dataset.demand_of(&node, period)));
            }
        }
    }

    // Trip capacity and SBQ big-M linking.
    for route_key in &routes {
        let route = dataset
            .active_routes()
            .into_iter()
            .find(|r| r.origin_plant_id == route_key.0 && r.destination_node_id == route_key.1 && r.transport_mode.as_str() == route_key.2)
            .expect("route key derived from active_routes()");
        for period in &periods {
            let s = ship[&(route_key.clone(), period.clone())];
            let k = trips[&(route_key.clone(), period.clone())];
            let u = use_mode[&(route_key.clone(), period.clone())];

            // ship[r,t] <= vehicle_capacity * trips[r,t]
            constraints.push(
                (Expression::from(s) - Expression::from(k) * route.vehicle_capacity_tonnes).leq(0.0),
            );

            // Minimum-batch-quantity big-M linking: shipping only when active,
            // and at least the minimum batch quantity when active.
            constraints.push((Expression::from(s) - Expression::from(u) * big_m).leq(0.0));
            if route.minimum_batch_quantity_tonnes > 0.0 {
                constraints.push(
                    (Expression::from(s) - Expression::from(u) * route.minimum_batch_quantity_tonnes)
                        .geq(0.0),
                );
            }
        }
    }

    // Objective: production + transport + fixed-trip + holding cost.
    let mut objective = Expression::from(0.0);
    for plant in &plants {
        for period in &periods {
            let cost = dataset
                .capacity_costs
                .get(&(plant.clone(), period.clone()))
                .map(|c| c.variable_cost_per_tonne)
                .unwrap_or(0.0);
            objective += Expression::from(prod[&(plant.clone(), period.clone())]) * cost;
            objective += Expression::from(inv[&(plant.clone(), period.clone())]) * dataset.holding_cost_of(plant);
        }
    }
    for route_key in &routes {
        let route = dataset
            .active_routes()
            .into_iter()
            .find(|r| r.origin_plant_id == route_key.0 && r.destination_node_id == route_key.1 && r.transport_mode.as_str() == route_key.2)
            .expect("route key derived from active_routes()");
        for period in &periods {
            objective += Expression::from(ship[&(route_key.clone(), period.clone())]) * route.per_tonne_cost();
            objective += Expression::from(trips[&(route_key.clone(), period.clone())]) * route.fixed_cost_per_trip;
        }
    }

    if let Some(rate) = penalty_rate {
        for slack in unmet_demand.values() {
            objective += Expression::from(*slack) * rate;
        }
    }

    Ok(BuiltModel {
        vars,
        objective,
        constraints,
        plants,
        periods,
        routes,
        prod,
        ship,
        trips,
        use_mode,
        inv,
        unmet_demand,
        has_integer_vars: true,
    })
}
