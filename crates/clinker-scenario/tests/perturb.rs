use clinker_core::{DemandForecast, Distribution, ScenarioConfig, ScenarioType};
use clinker_scenario::perturb;

fn demand(tonnes: f64) -> Vec<DemandForecast> {
    vec![DemandForecast {
        customer_node_id: "C1".to_string(),
        period: "t1".to_string(),
        demand_tonnes: tonnes,
        low_band_tonnes: None,
        high_band_tonnes: None,
        confidence: None,
        source: None,
    }]
}

#[test]
fn base_scenario_is_a_no_op() {
    let base = demand(100.0);
    let config = ScenarioConfig::base("base");
    let perturbed = perturb(&base, &config).unwrap();
    assert_eq!(perturbed[0].demand_tonnes, 100.0);
}

#[test]
fn high_scenario_defaults_to_1_1x() {
    let base = demand(100.0);
    let config = ScenarioConfig {
        name: "high".to_string(),
        scenario_type: ScenarioType::High,
        scaling_factor: None,
        distribution: None,
        seed: None,
    };
    let perturbed = perturb(&base, &config).unwrap();
    assert_eq!(perturbed[0].demand_tonnes, 110.0);
}

#[test]
fn low_scenario_defaults_to_0_9x() {
    let base = demand(100.0);
    let config = ScenarioConfig {
        name: "low".to_string(),
        scenario_type: ScenarioType::Low,
        scaling_factor: None,
        distribution: None,
        seed: None,
    };
    let perturbed = perturb(&base, &config).unwrap();
    assert_eq!(perturbed[0].demand_tonnes, 90.0);
}

#[test]
fn explicit_scaling_factor_overrides_default() {
    let base = demand(100.0);
    let config = ScenarioConfig {
        name: "high".to_string(),
        scenario_type: ScenarioType::High,
        scaling_factor: Some(1.5),
        distribution: None,
        seed: None,
    };
    let perturbed = perturb(&base, &config).unwrap();
    assert_eq!(perturbed[0].demand_tonnes, 150.0);
}

#[test]
fn stochastic_scenario_is_reproducible_with_same_seed() {
    let base = demand(100.0);
    let config = ScenarioConfig {
        name: "stochastic".to_string(),
        scenario_type: ScenarioType::Stochastic,
        scaling_factor: None,
        distribution: Some(Distribution::Normal { mean: 1.0, std: 0.1 }),
        seed: Some(42),
    };
    let first = perturb(&base, &config).unwrap();
    let second = perturb(&base, &config).unwrap();
    assert_eq!(first[0].demand_tonnes, second[0].demand_tonnes);
}

#[test]
fn stochastic_without_distribution_is_rejected() {
    let base = demand(100.0);
    let config = ScenarioConfig {
        name: "stochastic".to_string(),
        scenario_type: ScenarioType::Stochastic,
        scaling_factor: None,
        distribution: None,
        seed: Some(1),
    };
    assert!(perturb(&base, &config).is_err());
}
