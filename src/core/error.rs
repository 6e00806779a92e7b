use thiserror::Error;

/// Configuration problems caught before any simulation work begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no asset allocations configured")]
    NoAllocations,
    #[error("target weights sum to {sum}, expected 1.0")]
    WeightsNotNormalized { sum: f64 },
    #[error("outflow splits sum to {sum}, expected 1.0")]
    SplitsNotNormalized { sum: f64 },
    #[error("negative initial value {value} for asset '{id}'")]
    NegativeInitialValue { id: String, value: f64 },
    #[error("negative initial outflow {value}")]
    NegativeOutflow { value: f64 },
    #[error("outflow growth rate {value} is not finite")]
    NonFiniteGrowthRate { value: f64 },
    #[error("outflow stride must be at least 1")]
    ZeroStride,
    #[error("trial count must be at least 1")]
    ZeroTrials,
    #[error("histogram bin count must be at least 1")]
    ZeroHistogramBins,
    #[error("outflow schedule has {schedule_len} entries, expected {expected} for {periods} periods")]
    ScheduleLengthMismatch {
        schedule_len: usize,
        expected: usize,
        periods: usize,
    },
    #[error("no fitted distribution for asset '{id}'")]
    MissingDistribution { id: String },
}

/// Problems fitting an empirical return distribution. Raised at
/// construction time, before any trial runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    #[error("return series is empty")]
    EmptyReturns,
    #[error("price series needs at least two points")]
    TooFewPrices,
    #[error("non-positive price {price} at index {index}")]
    NonPositivePrice { index: usize, price: f64 },
    #[error("dates not strictly increasing at index {index}")]
    NonChronological { index: usize },
    #[error("non-positive return ratio {value} at index {index}")]
    NonPositiveReturn { index: usize, value: f64 },
    #[error("bin count must be at least 1")]
    ZeroBins,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_name_the_violated_invariant() {
        let err = ConfigError::WeightsNotNormalized { sum: 0.8 };
        assert!(err.to_string().contains("0.8"));

        let err = ConfigError::ScheduleLengthMismatch {
            schedule_len: 10,
            expected: 13,
            periods: 12,
        };
        let message = err.to_string();
        assert!(message.contains("10"));
        assert!(message.contains("13"));
    }

    #[test]
    fn distribution_errors_carry_the_offending_value() {
        let err = DistributionError::NonPositiveReturn {
            index: 3,
            value: -0.2,
        };
        let message = err.to_string();
        assert!(message.contains("-0.2"));
        assert!(message.contains("3"));
    }
}
