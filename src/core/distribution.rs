use rand::Rng;

use super::error::DistributionError;

/// Return ratios from a bare price slice, for callers without dated series.
pub fn price_relatives(prices: &[f64]) -> Result<Vec<f64>, DistributionError> {
    if prices.len() < 2 {
        return Err(DistributionError::TooFewPrices);
    }
    for (index, &price) in prices.iter().enumerate() {
        if !price.is_finite() || price <= 0.0 {
            return Err(DistributionError::NonPositivePrice { index, price });
        }
    }
    Ok(prices.windows(2).map(|pair| pair[1] / pair[0]).collect())
}

/// A normalized histogram over observed return ratios, sampled by
/// inverse-CDF lookup. Piecewise-constant density, piecewise-linear CDF.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalDistribution {
    edges: Vec<f64>,
    densities: Vec<f64>,
    cdf: Vec<f64>,
}

impl EmpiricalDistribution {
    pub fn fit(returns: &[f64], bin_count: usize) -> Result<Self, DistributionError> {
        if bin_count == 0 {
            return Err(DistributionError::ZeroBins);
        }
        if returns.is_empty() {
            return Err(DistributionError::EmptyReturns);
        }
        for (index, &value) in returns.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(DistributionError::NonPositiveReturn { index, value });
            }
        }

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &value in returns {
            lo = lo.min(value);
            hi = hi.max(value);
        }
        if hi <= lo {
            // Degenerate range (all ratios equal): widen it, but never
            // below zero so samples stay strictly positive.
            let half_width = 0.5_f64.min(lo * 0.5);
            hi = lo + half_width;
            lo -= half_width;
        }

        let width = (hi - lo) / bin_count as f64;
        let mut counts = vec![0_usize; bin_count];
        for &value in returns {
            let bin = (((value - lo) / width) as usize).min(bin_count - 1);
            counts[bin] += 1;
        }

        let n = returns.len() as f64;
        let densities: Vec<f64> = counts
            .iter()
            .map(|&count| count as f64 / (n * width))
            .collect();

        let edges: Vec<f64> = (0..=bin_count)
            .map(|i| lo + width * i as f64)
            .collect();

        let mut cdf = Vec::with_capacity(bin_count + 1);
        cdf.push(0.0);
        let mut mass = 0.0;
        for &count in &counts {
            mass += count as f64 / n;
            cdf.push(mass);
        }
        // Guard against float drift so inverse lookup always terminates.
        cdf[bin_count] = 1.0;

        Ok(Self {
            edges,
            densities,
            cdf,
        })
    }

    pub fn fit_from_prices(prices: &[f64], bin_count: usize) -> Result<Self, DistributionError> {
        let returns = price_relatives(prices)?;
        Self::fit(&returns, bin_count)
    }

    pub fn bin_count(&self) -> usize {
        self.densities.len()
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    pub fn support(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inverse_cdf(rng.gen_range(0.0..1.0))
    }

    pub fn sample_n<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    fn inverse_cdf(&self, u: f64) -> f64 {
        let bins = self.densities.len();
        let bin = self.cdf[1..].partition_point(|&c| c <= u).min(bins - 1);
        let mass = self.cdf[bin + 1] - self.cdf[bin];
        let frac = if mass > 0.0 {
            (u - self.cdf[bin]) / mass
        } else {
            0.0
        };
        self.edges[bin] + frac * (self.edges[bin + 1] - self.edges[bin])
    }
}
