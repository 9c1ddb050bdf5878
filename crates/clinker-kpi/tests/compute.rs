use std::collections::BTreeMap;

use clinker_core::{DemandForecast, Plant, PlantType, ProductionCapacityCost, TransportMode, TransportRoute};
use clinker_solver::{
    CostBreakdown, InventoryEntry, PlanResult, PlanningDataset, ProductionEntry, ShipmentEntry, UnmetDemandEntry,
};

fn plant(id: &str) -> Plant {
    Plant {
        plant_id: id.to_string(),
        name: id.to_string(),
        plant_type: PlantType::Clinker,
        latitude: None,
        longitude: None,
        region: None,
        country: None,
    }
}

fn road_route(origin: &str, destination: &str, capacity: f64, sbq: f64) -> TransportRoute {
    TransportRoute {
        origin_plant_id: origin.to_string(),
        destination_node_id: destination.to_string(),
        transport_mode: TransportMode::Road,
        distance_km: None,
        cost_per_tonne: Some(5.0),
        cost_per_tonne_km: None,
        fixed_cost_per_trip: 0.0,
        vehicle_capacity_tonnes: capacity,
        minimum_batch_quantity_tonnes: sbq,
        is_active: true,
    }
}

fn demand(node: &str, period: &str, tonnes: f64) -> DemandForecast {
    DemandForecast {
        customer_node_id: node.to_string(),
        period: period.to_string(),
        demand_tonnes: tonnes,
        low_band_tonnes: None,
        high_band_tonnes: None,
        confidence: None,
        source: None,
    }
}

fn single_period_dataset() -> PlanningDataset {
    let mut capacity_costs = BTreeMap::new();
    capacity_costs.insert(
        ("P1".to_string(), "t1".to_string()),
        ProductionCapacityCost {
            max_capacity_tonnes: 200.0,
            variable_cost_per_tonne: 10.0,
            fixed_cost_per_period: 0.0,
            min_run_level: 0.0,
            holding_cost_per_tonne: 1.0,
        },
    );

    PlanningDataset {
        plants: vec![plant("P1")],
        capacity_costs,
        routes: vec![road_route("P1", "C1", 1000.0, 0.0)],
        demand: vec![demand("C1", "t1", 100.0)],
        initial_inventory: BTreeMap::new(),
        safety_stock: vec![],
        periods: vec!["t1".to_string()],
    }
}

#[test]
fn fully_served_demand_yields_full_service_level_and_no_stockouts() {
    let dataset = single_period_dataset();
    let plan = PlanResult {
        solver: "test".to_string(),
        objective_value: 1500.0,
        runtime_seconds: 0.01,
        production: vec![ProductionEntry { plant_id: "P1".to_string(), period: "t1".to_string(), tonnes: 100.0 }],
        shipments: vec![ShipmentEntry {
            origin_plant_id: "P1".to_string(),
            destination_node_id: "C1".to_string(),
            transport_mode: "road".to_string(),
            period: "t1".to_string(),
            tonnes: 100.0,
            trips: 1,
            active: true,
        }],
        inventory: vec![],
        unmet_demand: vec![],
        cost_breakdown: CostBreakdown {
            production_cost: 1000.0,
            transport_cost: 500.0,
            fixed_trip_cost: 0.0,
            holding_cost: 0.0,
            penalty_cost: 0.0,
        },
    };

    let report = clinker_kpi::compute(&dataset, &plan);
    assert_eq!(report.per_period.len(), 1);
    let (period, summary) = &report.per_period[0];
    assert_eq!(period, "t1");
    assert!((summary.service_level - 1.0).abs() < 1e-9);
    assert_eq!(summary.stockout_events, 0);
    assert!((summary.production_utilization - 0.5).abs() < 1e-9);
    assert!((summary.total_demand_tonnes - 100.0).abs() < 1e-9);
    assert!((summary.total_cost - 1500.0).abs() < 1e-6);
    assert!((report.aggregated.average_service_level - 1.0).abs() < 1e-9);
}

#[test]
fn partially_served_demand_lowers_service_level_and_counts_a_stockout() {
    let dataset = single_period_dataset();
    let plan = PlanResult {
        solver: "test".to_string(),
        objective_value: 1100.0,
        runtime_seconds: 0.01,
        production: vec![ProductionEntry { plant_id: "P1".to_string(), period: "t1".to_string(), tonnes: 60.0 }],
        shipments: vec![ShipmentEntry {
            origin_plant_id: "P1".to_string(),
            destination_node_id: "C1".to_string(),
            transport_mode: "road".to_string(),
            period: "t1".to_string(),
            tonnes: 60.0,
            trips: 1,
            active: true,
        }],
        inventory: vec![],
        unmet_demand: vec![UnmetDemandEntry { node_id: "C1".to_string(), period: "t1".to_string(), tonnes: 40.0 }],
        cost_breakdown: CostBreakdown {
            production_cost: 600.0,
            transport_cost: 300.0,
            fixed_trip_cost: 0.0,
            holding_cost: 0.0,
            penalty_cost: 200.0,
        },
    };

    let report = clinker_kpi::compute(&dataset, &plan);
    let (_, summary) = &report.per_period[0];
    assert!((summary.service_level - 0.6).abs() < 1e-9);
    assert_eq!(summary.stockout_events, 1);
    assert!((summary.total_unmet_demand_tonnes - 40.0).abs() < 1e-9);
    assert!((summary.demand_fulfillment_rate - 0.6).abs() < 1e-9);
    assert!((summary.penalty_cost - 200.0).abs() < 1e-6);
}

#[test]
fn inventory_holding_feeds_average_inventory_and_turns() {
    let mut dataset = single_period_dataset();
    dataset.periods = vec!["t1".to_string(), "t2".to_string()];
    dataset.demand.push(demand("C1", "t2", 100.0));
    dataset.capacity_costs.insert(
        ("P1".to_string(), "t2".to_string()),
        dataset.capacity_costs[&("P1".to_string(), "t1".to_string())].clone(),
    );

    let plan = PlanResult {
        solver: "test".to_string(),
        objective_value: 3000.0,
        runtime_seconds: 0.01,
        production: vec![
            ProductionEntry { plant_id: "P1".to_string(), period: "t1".to_string(), tonnes: 110.0 },
            ProductionEntry { plant_id: "P1".to_string(), period: "t2".to_string(), tonnes: 90.0 },
        ],
        shipments: vec![
            ShipmentEntry {
                origin_plant_id: "P1".to_string(),
                destination_node_id: "C1".to_string(),
                transport_mode: "road".to_string(),
                period: "t1".to_string(),
                tonnes: 100.0,
                trips: 1,
                active: true,
            },
            ShipmentEntry {
                origin_plant_id: "P1".to_string(),
                destination_node_id: "C1".to_string(),
                transport_mode: "road".to_string(),
                period: "t2".to_string(),
                tonnes: 100.0,
                trips: 1,
                active: true,
            },
        ],
        inventory: vec![InventoryEntry { plant_id: "P1".to_string(), period: "t1".to_string(), tonnes: 10.0 }],
        unmet_demand: vec![],
        cost_breakdown: CostBreakdown {
            production_cost: 2000.0,
            transport_cost: 1000.0,
            fixed_trip_cost: 0.0,
            holding_cost: 10.0,
            penalty_cost: 0.0,
        },
    };

    let report = clinker_kpi::compute(&dataset, &plan);
    let t1 = &report.per_period[0].1;
    assert!((t1.average_inventory_tonnes - 10.0).abs() < 1e-9);
    assert!((t1.inventory_turns - 10.0).abs() < 1e-9);
    let t2 = &report.per_period[1].1;
    assert_eq!(t2.average_inventory_tonnes, 0.0);
    assert_eq!(t2.inventory_turns, 0.0);
}
