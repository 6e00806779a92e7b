use super::error::ConfigError;

/// Scheduled withdrawal amounts, one entry per period including period 0.
#[derive(Debug, Clone, PartialEq)]
pub struct OutflowSchedule {
    amounts: Vec<f64>,
}

impl OutflowSchedule {
    /// Geometric withdrawal schedule: the current amount lands on every
    /// period that is a multiple of `stride` and compounds by
    /// `1 + growth_rate` for the next occurrence; other periods carry zero.
    pub fn linear(
        initial: f64,
        growth_rate: f64,
        stride: usize,
        period_count: usize,
    ) -> Result<Self, ConfigError> {
        if stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        if !initial.is_finite() || initial < 0.0 {
            return Err(ConfigError::NegativeOutflow { value: initial });
        }
        if !growth_rate.is_finite() {
            return Err(ConfigError::NonFiniteGrowthRate { value: growth_rate });
        }

        let mut amount = initial;
        let mut amounts = Vec::with_capacity(period_count + 1);
        for period in 0..=period_count {
            if period % stride == 0 {
                amounts.push(amount);
                amount *= 1.0 + growth_rate;
            } else {
                amounts.push(0.0);
            }
        }
        Ok(Self { amounts })
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn period_count(&self) -> usize {
        self.amounts.len() - 1
    }

    /// Scheduled withdrawal at `period`, or `None` past the end of the
    /// schedule.
    pub fn amount(&self, period: usize) -> Option<f64> {
        self.amounts.get(period).copied()
    }

    pub fn amounts(&self) -> &[f64] {
        &self.amounts
    }
}
