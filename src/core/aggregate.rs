use super::error::ConfigError;

const LOG_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub terminal_totals: Vec<Option<f64>>,
    pub histogram_edges: Vec<f64>,
    pub histogram_counts: Vec<u64>,
    pub success_rate: f64,
    pub trial_count: usize,
    pub ruined_count: usize,
    pub median_terminal: f64,
    pub p10_terminal: f64,
}

/// Folds terminal totals into a success rate and a log-scale outcome
/// histogram. An undefined terminal is a failure: it never reaches the
/// histogram or the success numerator, but still counts in the denominator.
pub fn aggregate(
    terminals: &[Option<f64>],
    bin_count: usize,
    success_threshold: f64,
) -> Result<AggregateResult, ConfigError> {
    if bin_count == 0 {
        return Err(ConfigError::ZeroHistogramBins);
    }

    let mut defined: Vec<f64> = terminals.iter().flatten().copied().collect();
    let trial_count = terminals.len();
    let ruined_count = trial_count - defined.len();

    let successes = defined.iter().filter(|&&v| v > success_threshold).count();
    let success_rate = if trial_count == 0 {
        0.0
    } else {
        successes as f64 / trial_count as f64
    };

    let (histogram_edges, histogram_counts) = log_histogram(&defined, bin_count);
    let median_terminal = percentile(&mut defined, 50.0);
    let p10_terminal = percentile(&mut defined, 10.0);

    Ok(AggregateResult {
        terminal_totals: terminals.to_vec(),
        histogram_edges,
        histogram_counts,
        success_rate,
        trial_count,
        ruined_count,
        median_terminal,
        p10_terminal,
    })
}

/// Base-10 log-spaced histogram spanning the decade floor below the
/// smallest value to the decade ceiling above the largest.
fn log_histogram(values: &[f64], bin_count: usize) -> (Vec<f64>, Vec<u64>) {
    if values.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &value in values {
        min = min.min(value);
        max = max.max(value);
    }

    let lo = (min + 0.1).max(LOG_EPSILON).log10().floor();
    let mut hi = (max + 0.1).max(LOG_EPSILON).log10().ceil();
    if hi <= lo {
        hi = lo + 1.0;
    }

    let edges: Vec<f64> = (0..=bin_count)
        .map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / bin_count as f64))
        .collect();

    let mut counts = vec![0_u64; bin_count];
    let inner_edges = &edges[1..bin_count];
    for &value in values {
        let bin = inner_edges.partition_point(|&edge| edge <= value);
        counts[bin] += 1;
    }

    (edges, counts)
}

/// Linear-interpolation percentile over a working buffer (sorts in place).
pub(crate) fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
