mod aggregate;
mod distribution;
mod engine;
mod error;
mod schedule;
mod types;

pub use aggregate::{AggregateResult, aggregate};
pub use distribution::{EmpiricalDistribution, price_relatives};
pub use engine::{ForecastResult, run_forecast, run_forecast_with_schedule, run_path, simulate_path};
pub use error::{ConfigError, DistributionError};
pub use schedule::OutflowSchedule;
pub use types::{
    AssetAllocation, ForecastConfig, PricePoint, PriceSeries, RebalancingPolicy, SimulationPath,
};
