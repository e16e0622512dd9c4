//! Wealth-inequality instrument: Lorenz curve, Gini coefficient and the
//! descriptive moments of a final wealth vector.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("wealth vector is empty")]
    EmptyWealthVector,
    #[error("total wealth is zero; the Lorenz curve is undefined")]
    DegenerateDistribution,
    #[error("wealth vector holds a NaN or infinite value")]
    NonFiniteWealth,
}

/// Cumulative population share (`x`) against cumulative wealth share (`y`).
/// Both run from 0 to 1 over `n + 1` points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LorenzCurve {
    pub population_fractions: Vec<f64>,
    pub wealth_fractions: Vec<f64>,
}

impl LorenzCurve {
    /// Build the curve from raw wealth values in any order.
    pub fn try_from_wealth(wealth: &[f64]) -> Result<Self, AnalysisError> {
        if wealth.is_empty() {
            return Err(AnalysisError::EmptyWealthVector);
        }
        let sorted = sorted(wealth);
        let total: f64 = sorted.iter().sum();
        if !total.is_finite() {
            return Err(AnalysisError::NonFiniteWealth);
        }
        if total <= 0.0 {
            return Err(AnalysisError::DegenerateDistribution);
        }

        let mut wealth_fractions = Vec::with_capacity(sorted.len() + 1);
        wealth_fractions.push(0.0);
        let mut running = 0.0;
        for w in &sorted {
            running += w;
            wealth_fractions.push(running / total);
        }
        Ok(Self {
            population_fractions: evenly_spaced(sorted.len()),
            wealth_fractions,
        })
    }

    /// The line of perfect equality sampled at `n + 1` points.
    pub fn equality(n: usize) -> Self {
        let points = evenly_spaced(n);
        Self {
            wealth_fractions: points.clone(),
            population_fractions: points,
        }
    }

    pub fn len(&self) -> usize {
        self.population_fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population_fractions.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.population_fractions
            .iter()
            .copied()
            .zip(self.wealth_fractions.iter().copied())
    }

    /// Trapezoidal area under the curve.
    pub fn area(&self) -> f64 {
        self.population_fractions
            .windows(2)
            .zip(self.wealth_fractions.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) * 0.5)
            .sum()
    }

    /// Twice the area between the equality diagonal and the curve, clamped
    /// to [0, 1] against rounding.
    pub fn gini(&self) -> f64 {
        ((0.5 - self.area()) / 0.5).clamp(0.0, 1.0)
    }
}

/// Everything the reporting layer needs about one run's wealth distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InequalityReport {
    pub lorenz: LorenzCurve,
    pub gini: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub skewness: f64,
    /// Excess (Fisher) kurtosis.
    pub kurtosis: f64,
    /// Set when every agent ended with zero wealth and the curve fell back
    /// to the equality line.
    pub degenerate: bool,
}

/// Analyze a final wealth vector.
///
/// An all-zero vector is not an error: the Lorenz curve falls back to the
/// equality line and the Gini coefficient to 0.
pub fn analyze(wealth: &[u64]) -> Result<InequalityReport, AnalysisError> {
    let values: Vec<f64> = wealth.iter().map(|&w| w as f64).collect();
    analyze_values(&values)
}

pub fn analyze_values(values: &[f64]) -> Result<InequalityReport, AnalysisError> {
    let (lorenz, degenerate) = match LorenzCurve::try_from_wealth(values) {
        Ok(curve) => (curve, false),
        Err(AnalysisError::DegenerateDistribution) => (LorenzCurve::equality(values.len()), true),
        Err(e) => return Err(e),
    };
    let gini = if degenerate { 0.0 } else { lorenz.gini() };
    let moments = Moments::of(values);
    Ok(InequalityReport {
        lorenz,
        gini,
        mean: moments.mean,
        median: median(values),
        std_dev: moments.m2.sqrt(),
        skewness: moments.skewness(),
        kurtosis: moments.excess_kurtosis(),
        degenerate,
    })
}

/// Gini coefficient alone, 0 for empty or all-zero input.
pub fn gini_coefficient(wealth: &[u64]) -> f64 {
    let values: Vec<f64> = wealth.iter().map(|&w| w as f64).collect();
    LorenzCurve::try_from_wealth(&values)
        .map(|curve| curve.gini())
        .unwrap_or(0.0)
}

/// Central moments, biased (divide by n).
struct Moments {
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl Moments {
    fn of(values: &[f64]) -> Self {
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<f64>() / n;
        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        Self {
            mean,
            m2: m2 / n,
            m3: m3 / n,
            m4: m4 / n,
        }
    }

    /// Variance no larger than the rounding noise on the mean counts as zero.
    fn is_flat(&self) -> bool {
        self.m2 <= (f64::EPSILON * self.mean).powi(2)
    }

    // Zero variance leaves skewness and kurtosis undefined; report 0.
    fn skewness(&self) -> f64 {
        if self.is_flat() {
            return 0.0;
        }
        self.m3 / self.m2.powf(1.5)
    }

    fn excess_kurtosis(&self) -> f64 {
        if self.is_flat() {
            return 0.0;
        }
        self.m4 / (self.m2 * self.m2) - 3.0
    }
}

fn median(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) * 0.5,
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn evenly_spaced(n: usize) -> Vec<f64> {
    if n == 0 {
        return vec![0.0];
    }
    (0..=n).map(|i| i as f64 / n as f64).collect()
}
