//! Pearson correlation across weekly metrics
//!
//! Correlations need at least three paired weeks. When one series has no variance the
//! coefficient is reported as 0 rather than `None`, so "flat" and "uncorrelated" look
//! the same to callers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::weekly::WeeklySummary;

/// Minimum paired samples for a coefficient
pub const MIN_PAIRS: usize = 3;

/// Metrics in the correlation matrix, in matrix order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeeklyMetric {
    Tss,
    Atl,
    Ctl,
    Rhr,
    Hrv,
    Sleep,
}

impl WeeklyMetric {
    pub const ALL: [WeeklyMetric; 6] = [
        WeeklyMetric::Tss,
        WeeklyMetric::Atl,
        WeeklyMetric::Ctl,
        WeeklyMetric::Rhr,
        WeeklyMetric::Hrv,
        WeeklyMetric::Sleep,
    ];

    pub fn value_of(&self, week: &WeeklySummary) -> Option<f64> {
        match self {
            WeeklyMetric::Tss => Some(week.total_tss),
            WeeklyMetric::Atl => week.atl,
            WeeklyMetric::Ctl => week.ctl,
            WeeklyMetric::Rhr => week.resting_hr,
            WeeklyMetric::Hrv => week.hrv,
            WeeklyMetric::Sleep => week.sleep_score,
        }
    }
}

impl fmt::Display for WeeklyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeeklyMetric::Tss => "TSS",
            WeeklyMetric::Atl => "ATL",
            WeeklyMetric::Ctl => "CTL",
            WeeklyMetric::Rhr => "RHR",
            WeeklyMetric::Hrv => "HRV",
            WeeklyMetric::Sleep => "Sleep",
        };
        write!(f, "{}", name)
    }
}

/// Pearson correlation over index pairs where both values are present.
///
/// Returns `None` with fewer than [`MIN_PAIRS`] pairs and `Some(0.0)` when either series
/// has zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();

    if pairs.len() < MIN_PAIRS {
        return None;
    }

    let n = pairs.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_x2, sum_y2) = pairs.iter().fold(
        (0.0, 0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2, sy2), (x, y)| (sx + x, sy + y, sxy + x * y, sx2 + x * x, sy2 + y * y),
    );

    let var_x = n * sum_x2 - sum_x * sum_x;
    let var_y = n * sum_y2 - sum_y * sum_y;
    if var_x <= 0.0 || var_y <= 0.0 {
        return Some(0.0);
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator <= 0.0 || !denominator.is_finite() {
        return Some(0.0);
    }

    let r = (n * sum_xy - sum_x * sum_y) / denominator;
    Some(r.clamp(-1.0, 1.0))
}

/// Symmetric matrix of weekly metric correlations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub metrics: Vec<WeeklyMetric>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// One off-diagonal entry of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub first: WeeklyMetric,
    pub second: WeeklyMetric,
    pub r: f64,
}

impl CorrelationMatrix {
    pub fn get(&self, a: WeeklyMetric, b: WeeklyMetric) -> Option<f64> {
        let i = self.metrics.iter().position(|m| *m == a)?;
        let j = self.metrics.iter().position(|m| *m == b)?;
        self.values[i][j]
    }

    /// Distinct metric pairs with |r| at least `min_abs`, strongest first
    pub fn strongest_pairs(&self, min_abs: f64) -> Vec<CorrelationPair> {
        let mut pairs: Vec<CorrelationPair> = Vec::new();
        for i in 0..self.metrics.len() {
            for j in (i + 1)..self.metrics.len() {
                if let Some(r) = self.values[i][j] {
                    if r.abs() >= min_abs {
                        pairs.push(CorrelationPair {
                            first: self.metrics[i],
                            second: self.metrics[j],
                            r,
                        });
                    }
                }
            }
        }
        pairs.sort_by(|a, b| b.r.abs().total_cmp(&a.r.abs()));
        pairs
    }
}

/// 6x6 correlation matrix over TSS, ATL, CTL, RHR, HRV and sleep.
///
/// The diagonal is 1 for metrics with at least three valid weeks and `None` otherwise.
pub fn correlation_matrix(summaries: &[WeeklySummary]) -> CorrelationMatrix {
    let metrics = WeeklyMetric::ALL.to_vec();
    let series: Vec<Vec<Option<f64>>> = metrics
        .iter()
        .map(|metric| summaries.iter().map(|week| metric.value_of(week)).collect())
        .collect();

    let size = metrics.len();
    let mut values = vec![vec![None; size]; size];
    for i in 0..size {
        let valid = series[i].iter().flatten().count();
        values[i][i] = (valid >= MIN_PAIRS).then_some(1.0);

        for j in (i + 1)..size {
            let r = pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    tracing::debug!(weeks = summaries.len(), "Correlation matrix computed");
    CorrelationMatrix { metrics, values }
}
