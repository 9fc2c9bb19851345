//! Electrolyte ratios and multi-day mineral deficit detection
//!
//! Ratios are only defined when both operands are positive. Deficit streaks look at
//! the two most recent prior days in a bounded history snapshot, so the longest
//! reported streak is three days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::RatioThresholds;
use crate::history::MineralSnapshot;

/// Longest streak the tracker reports (today plus two prior days)
pub const MAX_DEFICIT_STREAK: u8 = 3;

/// Sodium:potassium and calcium:magnesium ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectrolyteRatios {
    pub na_k: Option<f64>,
    pub ca_mg: Option<f64>,
}

/// Classification of a ratio against its thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatioStatus {
    Unknown,
    Excellent,
    Attention,
    High,
}

impl RatioStatus {
    pub fn description(&self) -> &'static str {
        match self {
            RatioStatus::Unknown => "No data",
            RatioStatus::Excellent => "Excellent",
            RatioStatus::Attention => "Needs attention",
            RatioStatus::High => "Too high",
        }
    }
}

/// Minerals tracked for deficit streaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mineral {
    Na,
    K,
    Mg,
}

impl Mineral {
    pub const ALL: [Mineral; 3] = [Mineral::Na, Mineral::K, Mineral::Mg];

    /// Read this mineral's value from a snapshot
    pub fn value_in(&self, snapshot: &MineralSnapshot) -> f64 {
        match self {
            Mineral::Na => snapshot.na,
            Mineral::K => snapshot.k,
            Mineral::Mg => snapshot.mg,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Mineral::Na => "Na",
            Mineral::K => "K",
            Mineral::Mg => "Mg",
        }
    }
}

/// Result of a deficit streak check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeficitStreak {
    pub deficit: bool,
    pub days: u8,
}

impl DeficitStreak {
    pub const NONE: DeficitStreak = DeficitStreak {
        deficit: false,
        days: 0,
    };
}

fn positive_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if numerator > 0.0 && denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// Compute Na:K and Ca:Mg. A ratio is `None` unless both of its operands are positive.
pub fn compute_ratios(na: f64, k: f64, ca: f64, mg: f64) -> ElectrolyteRatios {
    ElectrolyteRatios {
        na_k: positive_ratio(na, k),
        ca_mg: positive_ratio(ca, mg),
    }
}

/// Classify a ratio. A value exactly at `ideal` is already `Attention`.
pub fn ratio_status(value: Option<f64>, thresholds: &RatioThresholds) -> RatioStatus {
    match value {
        None => RatioStatus::Unknown,
        Some(v) if v.is_nan() => RatioStatus::Unknown,
        Some(v) if v < thresholds.ideal => RatioStatus::Excellent,
        Some(v) if v <= thresholds.high => RatioStatus::Attention,
        Some(_) => RatioStatus::High,
    }
}

/// Detect a multi-day deficit for one mineral.
///
/// `history` holds the bounded snapshot of previous days; any entry dated on or after
/// `today` is ignored. The streak counts today plus consecutive deficient entries
/// walking back through the history, and is only reported once the most recent prior
/// entry is deficient too.
pub fn deficit_streak(
    mineral: Mineral,
    threshold: f64,
    today: NaiveDate,
    today_value: f64,
    history: &BTreeMap<NaiveDate, MineralSnapshot>,
) -> DeficitStreak {
    if today_value >= threshold {
        return DeficitStreak::NONE;
    }

    let mut prior = history.range(..today).rev();
    let deficient = |entry: Option<(&NaiveDate, &MineralSnapshot)>| {
        entry.is_some_and(|(_, snapshot)| mineral.value_in(snapshot) < threshold)
    };

    if !deficient(prior.next()) {
        return DeficitStreak::NONE;
    }

    let days = if deficient(prior.next()) {
        MAX_DEFICIT_STREAK
    } else {
        2
    };

    tracing::debug!(mineral = mineral.symbol(), days, "Mineral deficit streak");
    DeficitStreak {
        deficit: true,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NA_K: RatioThresholds = RatioThresholds {
        ideal: 1.0,
        high: 1.3,
    };

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn snapshot(na: f64, k: f64, mg: f64) -> MineralSnapshot {
        MineralSnapshot { na, k, mg }
    }

    #[test]
    fn test_ratios_require_positive_operands() {
        let ratios = compute_ratios(0.0, 3500.0, 900.0, 700.0);
        assert_eq!(ratios.na_k, None);
        let ca_mg = ratios.ca_mg.unwrap();
        assert!((ca_mg - 900.0 / 700.0).abs() < 1e-9);

        let ratios = compute_ratios(2000.0, 0.0, 900.0, -1.0);
        assert_eq!(ratios.na_k, None);
        assert_eq!(ratios.ca_mg, None);
    }

    #[test]
    fn test_ratio_status_bands() {
        assert_eq!(ratio_status(Some(0.95), &NA_K), RatioStatus::Excellent);
        assert_eq!(ratio_status(Some(1.0), &NA_K), RatioStatus::Attention);
        assert_eq!(ratio_status(Some(1.3), &NA_K), RatioStatus::Attention);
        assert_eq!(ratio_status(Some(1.4), &NA_K), RatioStatus::High);
    }

    #[test]
    fn test_ratio_status_unknown() {
        assert_eq!(ratio_status(None, &NA_K), RatioStatus::Unknown);
        assert_eq!(ratio_status(Some(f64::NAN), &NA_K), RatioStatus::Unknown);
    }

    #[test]
    fn test_no_deficit_when_today_meets_threshold() {
        let history = BTreeMap::from([(date(9), snapshot(0.0, 0.0, 0.0))]);
        let streak = deficit_streak(Mineral::K, 3300.0, date(10), 3300.0, &history);
        assert_eq!(streak, DeficitStreak::NONE);
    }

    #[test]
    fn test_three_day_potassium_streak() {
        let history = BTreeMap::from([
            (date(8), snapshot(2000.0, 3000.0, 450.0)),
            (date(9), snapshot(2000.0, 3100.0, 450.0)),
        ]);
        let streak = deficit_streak(Mineral::K, 3300.0, date(10), 2800.0, &history);
        assert_eq!(
            streak,
            DeficitStreak {
                deficit: true,
                days: 3
            }
        );
    }

    #[test]
    fn test_two_day_streak_when_earlier_day_is_fine() {
        let history = BTreeMap::from([
            (date(7), snapshot(2000.0, 3000.0, 450.0)),
            (date(8), snapshot(2000.0, 3600.0, 450.0)),
            (date(9), snapshot(2000.0, 3100.0, 450.0)),
        ]);
        let streak = deficit_streak(Mineral::K, 3300.0, date(10), 2800.0, &history);
        assert_eq!(streak.days, 2);
        assert!(streak.deficit);
    }

    #[test]
    fn test_streak_capped_at_three() {
        let history: BTreeMap<_, _> = (3..10).map(|d| (date(d), snapshot(100.0, 100.0, 100.0))).collect();
        let streak = deficit_streak(Mineral::Mg, 400.0, date(10), 50.0, &history);
        assert_eq!(streak.days, MAX_DEFICIT_STREAK);
    }

    #[test]
    fn test_missing_prior_day_means_no_streak() {
        let streak = deficit_streak(Mineral::Na, 1500.0, date(10), 900.0, &BTreeMap::new());
        assert_eq!(streak, DeficitStreak::NONE);
    }

    #[test]
    fn test_today_entry_in_history_is_ignored() {
        let history = BTreeMap::from([
            (date(9), snapshot(2000.0, 3500.0, 450.0)),
            (date(10), snapshot(900.0, 1000.0, 100.0)),
        ]);
        let streak = deficit_streak(Mineral::K, 3300.0, date(10), 1000.0, &history);
        assert_eq!(streak, DeficitStreak::NONE);
    }

    use proptest::prelude::*;

    fn rank(status: RatioStatus) -> u8 {
        match status {
            RatioStatus::Unknown => 0,
            RatioStatus::Excellent => 1,
            RatioStatus::Attention => 2,
            RatioStatus::High => 3,
        }
    }

    proptest! {
        #[test]
        fn test_ratio_status_monotone(a in 0.0f64..5.0, b in 0.0f64..5.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rank(ratio_status(Some(low), &NA_K)) <= rank(ratio_status(Some(high), &NA_K)));
        }

        #[test]
        fn test_ratios_absent_without_positive_operands(na in 0.0f64..5000.0, ca in 0.0f64..2000.0) {
            let ratios = compute_ratios(na, 0.0, ca, 0.0);
            prop_assert_eq!(ratios.na_k, None);
            prop_assert_eq!(ratios.ca_mg, None);
        }
    }
}
