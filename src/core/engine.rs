use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use super::aggregate::{AggregateResult, aggregate};
use super::distribution::EmpiricalDistribution;
use super::error::ConfigError;
use super::schedule::OutflowSchedule;
use super::types::{AssetAllocation, ForecastConfig, RebalancingPolicy, SimulationPath};

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct ForecastResult {
    pub aggregate: AggregateResult,
    pub sample_paths: Vec<SimulationPath>,
}

/// Runs the full Monte Carlo forecast: builds the outflow schedule from the
/// config, simulates `trial_count` independent paths in parallel, and
/// aggregates terminal outcomes.
pub fn run_forecast(
    config: &ForecastConfig,
    distributions: &HashMap<String, EmpiricalDistribution>,
) -> Result<ForecastResult, ConfigError> {
    let outflows = OutflowSchedule::linear(
        config.initial_outflow,
        config.outflow_growth_rate,
        config.outflow_stride,
        config.period_count,
    )?;
    run_forecast_with_schedule(config, distributions, &outflows)
}

/// Like [`run_forecast`] but with a caller-supplied withdrawal schedule.
pub fn run_forecast_with_schedule(
    config: &ForecastConfig,
    distributions: &HashMap<String, EmpiricalDistribution>,
    outflows: &OutflowSchedule,
) -> Result<ForecastResult, ConfigError> {
    validate_config(config)?;
    if outflows.len() != config.period_count + 1 {
        return Err(ConfigError::ScheduleLengthMismatch {
            schedule_len: outflows.len(),
            expected: config.period_count + 1,
            periods: config.period_count,
        });
    }

    let fitted: Vec<&EmpiricalDistribution> = config
        .allocations
        .iter()
        .map(|allocation| {
            distributions
                .get(&allocation.id)
                .ok_or_else(|| ConfigError::MissingDistribution {
                    id: allocation.id.clone(),
                })
        })
        .collect::<Result<_, _>>()?;

    info!(
        trials = config.trial_count,
        periods = config.period_count,
        assets = config.allocations.len(),
        "running drawdown forecast"
    );

    let trials: Vec<(Option<f64>, Option<SimulationPath>)> = (0..config.trial_count)
        .into_par_iter()
        .map(|trial| {
            let mut rng = StdRng::seed_from_u64(derive_seed(config.seed, trial as u64));
            let path = simulate_path(
                &config.allocations,
                config.rebalancing,
                &fitted,
                outflows,
                &mut rng,
            );
            let terminal = path.terminal_total();
            let retained = (trial < config.retained_paths).then_some(path);
            (terminal, retained)
        })
        .collect();

    let mut terminals = Vec::with_capacity(config.trial_count);
    let mut sample_paths = Vec::with_capacity(config.retained_paths.min(config.trial_count));
    for (terminal, retained) in trials {
        terminals.push(terminal);
        if let Some(path) = retained {
            sample_paths.push(path);
        }
    }

    let aggregate = aggregate(&terminals, config.histogram_bins, config.success_threshold)?;
    debug!(
        success_rate = aggregate.success_rate,
        ruined = aggregate.ruined_count,
        "forecast complete"
    );

    Ok(ForecastResult {
        aggregate,
        sample_paths,
    })
}

/// One independent trial: draws a return-ratio sequence per asset, then
/// walks the growth / rebalance / withdraw / ruin-check loop.
pub fn simulate_path<R: Rng + ?Sized>(
    allocations: &[AssetAllocation],
    policy: RebalancingPolicy,
    distributions: &[&EmpiricalDistribution],
    outflows: &OutflowSchedule,
    rng: &mut R,
) -> SimulationPath {
    let period_count = outflows.period_count();
    let rates: Vec<Vec<f64>> = distributions
        .iter()
        .map(|distribution| distribution.sample_n(rng, period_count))
        .collect();
    run_path(allocations, policy, &rates, outflows)
}

/// Walks one path for a fixed draw of return ratios (`rates[asset][period]`).
/// Periods are strictly sequential; ruin is absorbing.
pub fn run_path(
    allocations: &[AssetAllocation],
    policy: RebalancingPolicy,
    rates: &[Vec<f64>],
    outflows: &OutflowSchedule,
) -> SimulationPath {
    let period_count = outflows.period_count();
    let mut current: Vec<f64> = allocations.iter().map(|a| a.initial_value).collect();
    let mut values = Vec::with_capacity(period_count + 1);
    values.push(current.clone());
    let mut ruined_at = None;

    for t in 0..period_count {
        for (asset, value) in current.iter_mut().enumerate() {
            *value *= rates[asset][t];
        }

        if policy == RebalancingPolicy::TargetWeights {
            let total: f64 = current.iter().sum();
            for (asset, value) in current.iter_mut().enumerate() {
                *value = allocations[asset].target_weight * total;
            }
        }

        let outflow = outflows.amounts()[t];
        let ruined = match policy {
            RebalancingPolicy::TargetWeights => {
                for (asset, value) in current.iter_mut().enumerate() {
                    *value -= outflow * allocations[asset].outflow_split;
                }
                current.iter().sum::<f64>() < 0.0
            }
            RebalancingPolicy::None => {
                // The first asset that cannot cover its share of the
                // withdrawal ruins the whole portfolio, even if the others
                // are still positive.
                let shortfall = current.iter().enumerate().any(|(asset, &value)| {
                    value <= outflow * allocations[asset].outflow_split
                });
                if !shortfall {
                    for (asset, value) in current.iter_mut().enumerate() {
                        *value -= outflow * allocations[asset].outflow_split;
                    }
                }
                shortfall
            }
        };

        if ruined {
            ruined_at = Some(t + 1);
            break;
        }
        values.push(current.clone());
    }

    SimulationPath {
        values,
        period_count,
        ruined_at,
    }
}

fn validate_config(config: &ForecastConfig) -> Result<(), ConfigError> {
    if config.allocations.is_empty() {
        return Err(ConfigError::NoAllocations);
    }

    // A NaN weight makes the sum NaN, which the tolerance comparison alone
    // would wave through.
    let weight_sum: f64 = config.allocations.iter().map(|a| a.target_weight).sum();
    if !weight_sum.is_finite() || (weight_sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ConfigError::WeightsNotNormalized { sum: weight_sum });
    }

    let split_sum: f64 = config.allocations.iter().map(|a| a.outflow_split).sum();
    if !split_sum.is_finite() || (split_sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ConfigError::SplitsNotNormalized { sum: split_sum });
    }

    for allocation in &config.allocations {
        if !allocation.initial_value.is_finite() || allocation.initial_value < 0.0 {
            return Err(ConfigError::NegativeInitialValue {
                id: allocation.id.clone(),
                value: allocation.initial_value,
            });
        }
    }

    if !config.initial_outflow.is_finite() || config.initial_outflow < 0.0 {
        return Err(ConfigError::NegativeOutflow {
            value: config.initial_outflow,
        });
    }
    if config.outflow_stride == 0 {
        return Err(ConfigError::ZeroStride);
    }
    if config.trial_count == 0 {
        return Err(ConfigError::ZeroTrials);
    }
    if config.histogram_bins == 0 {
        return Err(ConfigError::ZeroHistogramBins);
    }

    Ok(())
}

fn derive_seed(base_seed: u64, trial: u64) -> u64 {
    splitmix64(base_seed ^ trial.wrapping_mul(0x9E3779B97F4A7C15))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
