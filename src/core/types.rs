use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::DistributionError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Chronological price history for one asset. Owned by the market-data
/// collaborator; read-only here.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, DistributionError> {
        if points.len() < 2 {
            return Err(DistributionError::TooFewPrices);
        }
        for (index, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(DistributionError::NonPositivePrice {
                    index,
                    price: point.price,
                });
            }
            if index > 0 && point.date <= points[index - 1].date {
                return Err(DistributionError::NonChronological { index });
            }
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Period-over-period return ratios; one fewer than the price count.
    pub fn returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|pair| pair[1].price / pair[0].price)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetAllocation {
    pub id: String,
    pub target_weight: f64,
    pub outflow_split: f64,
    pub initial_value: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RebalancingPolicy {
    None,
    TargetWeights,
}

#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub allocations: Vec<AssetAllocation>,
    pub rebalancing: RebalancingPolicy,
    pub initial_outflow: f64,
    pub outflow_growth_rate: f64,
    pub outflow_stride: usize,
    pub period_count: usize,
    pub trial_count: usize,
    pub distribution_bins: usize,
    pub histogram_bins: usize,
    pub success_threshold: f64,
    pub seed: u64,
    pub retained_paths: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        let initial_value = 2_500_000.0;
        Self {
            allocations: vec![
                AssetAllocation {
                    id: "spx".to_string(),
                    target_weight: 0.5,
                    outflow_split: 0.5,
                    initial_value: initial_value * 0.5,
                },
                AssetAllocation {
                    id: "vbmfx".to_string(),
                    target_weight: 0.5,
                    outflow_split: 0.5,
                    initial_value: initial_value * 0.5,
                },
            ],
            rebalancing: RebalancingPolicy::TargetWeights,
            initial_outflow: 100_000.0 / 12.0 / 21.0,
            outflow_growth_rate: 0.04 / 12.0 / 21.0,
            outflow_stride: 1,
            period_count: 30 * 12 * 21,
            trial_count: 1000,
            distribution_bins: 100,
            histogram_bins: 50,
            success_threshold: 1.0,
            seed: 42,
            retained_paths: 5,
        }
    }
}

/// One simulated trajectory. `values` holds one row of per-asset values per
/// defined period; no rows exist at or after ruin, so the absorbing state
/// holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationPath {
    pub(crate) values: Vec<Vec<f64>>,
    pub(crate) period_count: usize,
    pub(crate) ruined_at: Option<usize>,
}

impl SimulationPath {
    pub fn period_count(&self) -> usize {
        self.period_count
    }

    pub fn ruined_at(&self) -> Option<usize> {
        self.ruined_at
    }

    pub fn is_ruined(&self) -> bool {
        self.ruined_at.is_some()
    }

    /// Per-asset values at `period`, or `None` at or after ruin.
    pub fn asset_values(&self, period: usize) -> Option<&[f64]> {
        if period > self.period_count {
            return None;
        }
        self.values.get(period).map(Vec::as_slice)
    }

    /// Portfolio total at `period`, or `None` at or after ruin.
    pub fn total(&self, period: usize) -> Option<f64> {
        self.asset_values(period).map(|values| values.iter().sum())
    }

    pub fn totals(&self) -> Vec<Option<f64>> {
        (0..=self.period_count).map(|t| self.total(t)).collect()
    }

    pub fn terminal_total(&self) -> Option<f64> {
        self.total(self.period_count)
    }
}
