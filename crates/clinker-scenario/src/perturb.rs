//! Demand perturbation. Mirrors `generate_demand_for_scenario`: `base` is
//! a no-op, `high`/`low` scale deterministically, `stochastic` draws a
//! per-row multiplicative noise factor from a seeded RNG (§4.8).

use clinker_core::{DemandForecast, Distribution, ScenarioConfig, ScenarioType};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution as _, Normal, Triangular};

use crate::error::ScenarioError;

/// Rounds to 2 decimal places, matching the source generator's `.round(2)`.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn scale(demand: &[DemandForecast], factor: f64) -> Vec<DemandForecast> {
    demand
        .iter()
        .map(|d| DemandForecast {
            demand_tonnes: round2(d.demand_tonnes * factor),
            low_band_tonnes: d.low_band_tonnes.map(|v| round2(v * factor)),
            high_band_tonnes: d.high_band_tonnes.map(|v| round2(v * factor)),
            ..d.clone()
        })
        .collect()
}

/// Produces the perturbed demand frame for one scenario configuration,
/// leaving `base_demand` untouched.
pub fn perturb(base_demand: &[DemandForecast], config: &ScenarioConfig) -> Result<Vec<DemandForecast>, ScenarioError> {
    match config.scenario_type {
        ScenarioType::Base => Ok(base_demand.to_vec()),
        ScenarioType::High | ScenarioType::Low => Ok(scale(base_demand, config.effective_scaling_factor())),
        ScenarioType::Stochastic => {
            let distribution = config.distribution.ok_or(ScenarioError::MissingDistribution)?;
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let perturbed = base_demand
                .iter()
                .map(|d| {
                    let noise = sample_noise(&distribution, &mut rng)?;
                    Ok(DemandForecast { demand_tonnes: round2(d.demand_tonnes * noise), ..d.clone() })
                })
                .collect::<Result<Vec<_>, ScenarioError>>()?;
            Ok(perturbed)
        }
    }
}

fn sample_noise(distribution: &Distribution, rng: &mut StdRng) -> Result<f64, ScenarioError> {
    match *distribution {
        Distribution::Normal { mean, std } => {
            let normal = Normal::new(mean, std)
                .map_err(|err| ScenarioError::UnsupportedDistribution(err.to_string()))?;
            Ok(normal.sample(rng))
        }
        Distribution::Triangular { low, mode, high } => {
            let triangular = Triangular::new(low, high, mode)
                .map_err(|err| ScenarioError::UnsupportedDistribution(err.to_string()))?;
            Ok(triangular.sample(rng))
        }
    }
}
