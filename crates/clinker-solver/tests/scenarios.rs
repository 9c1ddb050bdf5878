use std::collections::BTreeMap;

use clinker_core::{
    DemandForecast, InitialInventory, Plant, PlantType, ProductionCapacityCost,
    SafetyStockPolicy, SafetyStockPolicyType, TransportMode, TransportRoute,
};
use clinker_solver::{PenaltyPolicy, PlanningDataset, SolverDriver, SolverOptions};

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

fn road_route(origin: &str, destination: &str, cost_per_tonne: f64, capacity: f64, sbq: f64, fixed: f64) -> TransportRoute {
    TransportRoute {
        origin_plant_id: origin.to_string(),
        destination_node_id: destination.to_string(),
        transport_mode: TransportMode::Road,
        distance_km: None,
        cost_per_tonne: Some(cost_per_tonne),
        cost_per_tonne_km: None,
        fixed_cost_per_trip: fixed,
        vehicle_capacity_tonnes: capacity,
        minimum_batch_quantity_tonnes: sbq,
        is_active: true,
    }
}

fn assert_objective_matches_breakdown(result: &clinker_solver::PlanResult) {
    let summed = result.cost_breakdown.total();
    let relative = ((summed - result.objective_value) / result.objective_value.max(1.0)).abs();
    assert!(relative < 1e-6, "objective {} vs breakdown {}", result.objective_value, summed);
}

fn assert_trips_are_integral(result: &clinker_solver::PlanResult) {
    for shipment in &result.shipments {
        let rounded = shipment.trips as f64;
        assert!((rounded - shipment.trips as f64).abs() < 1e-6);
    }
}

fn assert_sbq_respected(result: &clinker_solver::PlanResult, sbq_by_route: &BTreeMap<(String, String), f64>) {
    for shipment in &result.shipments {
        if shipment.tonnes > 1e-6 {
            if let Some(sbq) = sbq_by_route.get(&(shipment.origin_plant_id.clone(), shipment.destination_node_id.clone())) {
                assert!(shipment.tonnes + 1e-6 >= *sbq, "shipment {} below SBQ {}", shipment.tonnes, sbq);
            }
        }
    }
}

#[test]
fn s1_demand_satisfaction_two_plants_one_customer() {
    let mut capacity_costs = BTreeMap::new();
    capacity_costs.insert(
        ("P1".to_string(), "t1".to_string()),
        ProductionCapacityCost {
            max_capacity_tonnes: 200.0,
            variable_cost_per_tonne: 10.0,
            fixed_cost_per_period: 0.0,
            min_run_level: 0.0,
            holding_cost_per_tonne: 0.0,
        },
    );
    capacity_costs.insert(
        ("P2".to_string(), "t1".to_string()),
        ProductionCapacityCost {
            max_capacity_tonnes: 200.0,
            variable_cost_per_tonne: 12.0,
            fixed_cost_per_period: 0.0,
            min_run_level: 0.0,
            holding_cost_per_tonne: 0.0,
        },
    );

    let dataset = PlanningDataset {
        plants: vec![plant("P1"), plant("P2")],
        capacity_costs,
        routes: vec![
            road_route("P1", "C1", 5.0, 1000.0, 0.0, 0.0),
            road_route("P2", "C1", 6.0, 1000.0, 0.0, 0.0),
        ],
        demand: vec![DemandForecast {
            customer_node_id: "C1".to_string(),
            period: "t1".to_string(),
            demand_tonnes: 100.0,
            low_band_tonnes: None,
            high_band_tonnes: None,
            confidence: None,
            source: None,
        }],
        initial_inventory: BTreeMap::new(),
        safety_stock: vec![],
        periods: vec!["t1".to_string()],
    };

    let driver = SolverDriver::default_chain();
    let result = clinker_solver::plan(&dataset, PenaltyPolicy::disabled(), &SolverOptions::default(), &driver).unwrap();

    assert!((result.objective_value - 1500.0).abs() < 1e-3);
    let p1_production: f64 = result.production.iter().filter(|p| p.plant_id == "P1").map(|p| p.tonnes).sum();
    assert!((p1_production - 100.0).abs() < 1e-3);
    let via_p1: f64 = result
        .shipments
        .iter()
        .filter(|s| s.origin_plant_id == "P1" && s.destination_node_id == "C1")
        .map(|s| s.tonnes)
        .sum();
    assert!((via_p1 - 100.0).abs() < 1e-3);
    assert_objective_matches_breakdown(&result);
    assert_trips_are_integral(&result);
}

#[test]
fn s2_sbq_activation_forces_larger_shipment() {
    let mut capacity_costs = BTreeMap::new();
    capacity_costs.insert(
        ("P1".to_string(), "t1".to_string()),
        ProductionCapacityCost {
            max_capacity_tonnes: 200.0,
            variable_cost_per_tonne: 10.0,
            fixed_cost_per_period: 0.0,
            min_run_level: 0.0,
            holding_cost_per_tonne: 0.0,
        },
    );
    capacity_costs.insert(
        ("P2".to_string(), "t1".to_string()),
        ProductionCapacityCost {
            max_capacity_tonnes: 200.0,
            variable_cost_per_tonne: 12.0,
            fixed_cost_per_period: 0.0,
            min_run_level: 0.0,
            holding_cost_per_tonne: 0.0,
        },
    );

    let dataset = PlanningDataset {
        plants: vec![plant("P1"), plant("P2")],
        capacity_costs,
        routes: vec![
            road_route("P1", "C1", 5.0, 1000.0, 20.0, 100.0),
            road_route("P2", "C1", 6.0, 1000.0, 20.0, 100.0),
        ],
        demand: vec![DemandForecast {
            customer_node_id: "C1".to_string(),
            period: "t1".to_string(),
            demand_tonnes: 100.0,
            low_band_tonnes: None,
            high_band_tonnes: None,
            confidence: None,
            source: None,
        }],
        initial_inventory: BTreeMap::new(),
        safety_stock: vec![],
        periods: vec!["t1".to_string()],
    };

    let driver = SolverDriver::default_chain();
    let result = clinker_solver::plan(&dataset, PenaltyPolicy::disabled(), &SolverOptions::default(), &driver).unwrap();

    assert!((result.objective_value - 1600.0).abs() < 1e-3);
    let total_trips: i64 = result.shipments.iter().map(|s| s.trips).sum();
    assert_eq!(total_trips, 1);

    let mut sbq_by_route = BTreeMap::new();
    sbq_by_route.insert(("P1".to_string(), "C1".to_string()), 20.0);
    sbq_by_route.insert(("P2".to_string(), "C1".to_string()), 20.0);
    assert_sbq_respected(&result, &sbq_by_route);
}

#[test]
fn s3_infeasible_from_insufficient_capacity() {
    let mut capacity_costs = BTreeMap::new();
    capacity_costs.insert(
        ("P1".to_string(), "t1".to_string()),
        ProductionCapacityCost {
            max_capacity_tonnes: 50.0,
            variable_cost_per_tonne: 10.0,
            fixed_cost_per_period: 0.0,
            min_run_level: 0.0,
            holding_cost_per_tonne: 0.0,
        },
    );

    let dataset = PlanningDataset {
        plants: vec![plant("P1")],
        capacity_costs,
        routes: vec![road_route("P1", "C1", 5.0, 1000.0, 0.0, 0.0)],
        demand: vec![DemandForecast {
            customer_node_id: "C1".to_string(),
            period: "t1".to_string(),
            demand_tonnes: 100.0,
            low_band_tonnes: None,
            high_band_tonnes: None,
            confidence: None,
            source: None,
        }],
        initial_inventory: BTreeMap::new(),
        safety_stock: vec![],
        periods: vec!["t1".to_string()],
    };

    let driver = SolverDriver::default_chain();
    let err = clinker_solver::plan(&dataset, PenaltyPolicy::disabled(), &SolverOptions::default(), &driver).unwrap_err();
    assert!(matches!(err, clinker_solver::SolverError::Infeasible { .. }));
}

#[test]
fn s4_multi_period_inventory_carry() {
    let mut capacity_costs = BTreeMap::new();
    capacity_costs.insert(
        ("P1".to_string(), "t1".to_string()),
        ProductionCapacityCost {
            max_capacity_tonnes: 80.0,
            variable_cost_per_tonne: 10.0,
            fixed_cost_per_period: 0.0,
            min_run_level: 0.0,
            holding_cost_per_tonne: 1.0,
        },
    );
    capacity_costs.insert(
        ("P1".to_string(), "t2".to_string()),
        ProductionCapacityCost {
            max_capacity_tonnes: 80.0,
            variable_cost_per_tonne: 10.0,
            fixed_cost_per_period: 0.0,
            min_run_level: 0.0,
            holding_cost_per_tonne: 1.0,
        },
    );
    let mut initial_inventory = BTreeMap::new();
    initial_inventory.insert(("P1".to_string(), "t1".to_string()), InitialInventory { tonnes: 0.0 });

    let dataset = PlanningDataset {
        plants: vec![plant("P1")],
        capacity_costs,
        routes: vec![road_route("P1", "C1", 0.0, 1000.0, 0.0, 0.0)],
        demand: vec![
            DemandForecast {
                customer_node_id: "C1".to_string(),
                period: "t1".to_string(),
                demand_tonnes: 60.0,
                low_band_tonnes: None,
                high_band_tonnes: None,
                confidence: None,
                source: None,
            },
            DemandForecast {
                customer_node_id: "C1".to_string(),
                period: "t2".to_string(),
                demand_tonnes: 80.0,
                low_band_tonnes: None,
                high_band_tonnes: None,
                confidence: None,
                source: None,
            },
        ],
        initial_inventory,
        safety_stock: vec![SafetyStockPolicy {
            node_id: "P1".to_string(),
            policy_type: SafetyStockPolicyType::Absolute,
            policy_value: 10.0,
            safety_stock_tonnes: 10.0,
            max_inventory_tonnes: None,
        }],
        periods: vec!["t1".to_string(), "t2".to_string()],
    };

    let driver = SolverDriver::default_chain();
    let result = clinker_solver::plan(&dataset, PenaltyPolicy::disabled(), &SolverOptions::default(), &driver).unwrap();

    let inv_t1 = result.inventory.iter().find(|i| i.period == "t1").unwrap().tonnes;
    let inv_t2 = result.inventory.iter().find(|i| i.period == "t2").unwrap().tonnes;
    assert!(inv_t1 + 1e-6 >= 10.0);
    assert!((inv_t2 - 10.0).abs() < 1e-3);
    assert!(result.cost_breakdown.holding_cost > 0.0);
    assert_objective_matches_breakdown(&result);
}
