//! Rolling baselines and stable-zone bands for HRV and resting heart rate
//!
//! The moving average covers the trailing samples that actually carry a value, so days
//! without a reading are skipped rather than counted as zero. The stable band comes
//! from a longer history and is supplied by the caller; [`StableBand::from_samples`]
//! builds one as mean ± k standard deviations.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::config::BaselineSettings;
use crate::models::DailyRecord;

/// Metric a baseline is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineMetric {
    Hrv,
    RestingHr,
}

impl BaselineMetric {
    pub fn value_of(&self, record: &DailyRecord) -> Option<f64> {
        match self {
            BaselineMetric::Hrv => record.hrv,
            BaselineMetric::RestingHr => record.resting_hr,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            BaselineMetric::Hrv => "ms",
            BaselineMetric::RestingHr => "bpm",
        }
    }
}

/// Stable-zone bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StableBand {
    pub lower: f64,
    pub upper: f64,
}

impl StableBand {
    /// Band of `mean ± width_sd * sample standard deviation`. Needs at least two samples.
    pub fn from_samples(samples: &[f64], width_sd: f64) -> Option<Self> {
        let valid: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if valid.len() < 2 {
            return None;
        }

        let mean = valid.iter().mean();
        let std_dev = valid.iter().std_dev();
        Some(StableBand {
            lower: mean - width_sd * std_dev,
            upper: mean + width_sd * std_dev,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Baseline snapshot for one metric. Every field is `None` when there is not enough data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineBand {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub moving_average: Option<f64>,
    pub current: Option<f64>,
    pub is_outside: Option<bool>,
    /// Valid samples in the moving-average window
    pub samples: usize,
}

impl BaselineBand {
    fn insufficient(samples: usize) -> Self {
        BaselineBand {
            lower: None,
            upper: None,
            moving_average: None,
            current: None,
            is_outside: None,
            samples,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.moving_average.is_none()
    }
}

/// Rolling baseline with the default window (7 samples, at least 2 required)
pub fn rolling_baseline(
    records: &[DailyRecord],
    metric: BaselineMetric,
    band: Option<StableBand>,
) -> BaselineBand {
    rolling_baseline_with(records, metric, band, &BaselineSettings::default())
}

/// Rolling baseline over the trailing `settings.window` records that carry `metric`.
///
/// Records may be passed in any order; they are ordered by date here.
pub fn rolling_baseline_with(
    records: &[DailyRecord],
    metric: BaselineMetric,
    band: Option<StableBand>,
    settings: &BaselineSettings,
) -> BaselineBand {
    let mut valid: Vec<_> = records
        .iter()
        .filter_map(|record| {
            metric
                .value_of(record)
                .filter(|v| v.is_finite())
                .map(|v| (record.date, v))
        })
        .collect();
    valid.sort_by_key(|(date, _)| *date);

    let window: Vec<f64> = valid
        .iter()
        .rev()
        .take(settings.window)
        .map(|(_, v)| *v)
        .collect();

    if window.len() < settings.min_samples.max(1) {
        tracing::debug!(?metric, samples = window.len(), "Insufficient baseline samples");
        return BaselineBand::insufficient(window.len());
    }

    let moving_average = window.iter().sum::<f64>() / window.len() as f64;
    let current = window[0];

    BaselineBand {
        lower: band.map(|b| b.lower),
        upper: band.map(|b| b.upper),
        moving_average: Some(moving_average),
        current: Some(current),
        is_outside: band.map(|b| !b.contains(current)),
        samples: window.len(),
    }
}
