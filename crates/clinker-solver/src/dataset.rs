//! Cleaned planning data handed to the Model Builder. Assembling this
//! from canonical tables (I/O) is the caller's job; this type and
//! everything downstream of it is pure.

use std::collections::{BTreeMap, BTreeSet};

use clinker_core::{
    DemandForecast, InitialInventory, Plant, ProductionCapacityCost, SafetyStockPolicy,
    TransportRoute,
};

#[derive(Debug, Clone, Default)]
pub struct PlanningDataset {
    pub plants: Vec<Plant>,
    pub capacity_costs: BTreeMap<(String, String), ProductionCapacityCost>,
    pub routes: Vec<TransportRoute>,
    pub demand: Vec<DemandForecast>,
    pub initial_inventory: BTreeMap<(String, String), InitialInventory>,
    pub safety_stock: Vec<SafetyStockPolicy>,
    /// Explicit period order. When empty, derived as the sorted union of
    /// periods appearing in `demand` (§4.5).
    pub periods: Vec<String>,
}

impl PlanningDataset {
    /// I: plants, ordered and deduplicated.
    pub fn plant_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        for plant in &self.plants {
            if seen.insert(plant.plant_id.clone()) {
                ordered.push(plant.plant_id.clone());
            }
        }
        ordered
    }

    /// J: customer demand nodes.
    pub fn demand_node_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        for d in &self.demand {
            if seen.insert(d.customer_node_id.clone()) {
                ordered.push(d.customer_node_id.clone());
            }
        }
        ordered
    }

    /// T: time periods, explicit or derived from demand.
    pub fn period_order(&self) -> Vec<String> {
        if !self.periods.is_empty() {
            return self.periods.clone();
        }
        self.demand.iter().map(|d| d.period.clone()).collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// R: active routes with positive vehicle capacity only (§4.5 edge policy).
    pub fn active_routes(&self) -> Vec<&TransportRoute> {
        self.routes.iter().filter(|r| r.is_active && r.vehicle_capacity_tonnes > 0.0).collect()
    }

    pub fn demand_of(&self, node: &str, period: &str) -> f64 {
        self.demand
            .iter()
            .find(|d| d.customer_node_id == node && d.period == period)
            .map(|d| d.demand_tonnes)
            .unwrap_or(0.0)
    }

    pub fn capacity_of(&self, plant: &str, period: &str) -> f64 {
        self.capacity_costs.get(&(plant.to_string(), period.to_string())).map(|c| c.max_capacity_tonnes).unwrap_or(0.0)
    }

    /// Holding cost is plant-level, taken as the first-period value
    /// when specified per-period (§4.5).
    pub fn holding_cost_of(&self, plant: &str) -> f64 {
        self.capacity_costs
            .iter()
            .filter(|((p, _), _)| p == plant)
            .min_by_key(|((_, period), _)| period.clone())
            .map(|(_, cost)| cost.holding_cost_per_tonne)
            .unwrap_or(0.0)
    }

    pub fn initial_inventory_of(&self, plant: &str, first_period: &str) -> f64 {
        self.initial_inventory
            .get(&(plant.to_string(), first_period.to_string()))
            .map(|inv| inv.tonnes)
            .unwrap_or(0.0)
    }

    pub fn safety_stock_of(&self, node: &str) -> f64 {
        self.safety_stock
            .iter()
            .find(|s| s.node_id == node)
            .map(|s| s.safety_stock_tonnes)
            .unwrap_or(0.0)
    }

    pub fn max_inventory_of(&self, node: &str) -> f64 {
        self.safety_stock
            .iter()
            .find(|s| s.node_id == node)
            .and_then(|s| s.max_inventory_tonnes)
            .unwrap_or(f64::INFINITY)
    }

    /// The big-M constant used to link route activation to positive
    /// shipments: the sum of all demand (§4.5).
    pub fn big_m(&self) -> f64 {
        let total: f64 = self.demand.iter().map(|d| d.demand_tonnes).sum();
        total.max(1.0)
    }
}
