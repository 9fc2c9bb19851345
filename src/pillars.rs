//! Daily bio-pillar states: regulation, energy and rest
//!
//! Each pillar is evaluated independently and is either green or amber.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::DailyRecord;

/// Minimum outdoor ride length that counts as a regulation session
pub const REGULATION_RIDE_MINUTES: f64 = 120.0;
/// Days looked back for a regulation session, including today
pub const REGULATION_WINDOW_DAYS: u64 = 7;
/// Prior-day calories below this (but above zero) flag low energy
pub const ENERGY_CALORIE_FLOOR: f64 = 1900.0;
/// HRV at or above this marks good rest
pub const REST_HRV_MS: f64 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PillarState {
    Green,
    Amber,
}

impl PillarState {
    fn from_ok(ok: bool) -> Self {
        if ok {
            PillarState::Green
        } else {
            PillarState::Amber
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BioPillars {
    pub regulation: PillarState,
    pub energy: PillarState,
    pub rest: PillarState,
}

fn regulation(records: &[DailyRecord], today: NaiveDate) -> PillarState {
    let start = today
        .checked_sub_days(Days::new(REGULATION_WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);

    let long_outdoor_ride = records
        .iter()
        .filter(|r| r.date >= start && r.date <= today)
        .flat_map(|r| r.activities.iter())
        .any(|a| {
            a.activity_type.is_ride()
                && !a.is_stationary
                && !a.is_virtual
                && a.moving_time_minutes() >= REGULATION_RIDE_MINUTES
        });

    PillarState::from_ok(long_outdoor_ride)
}

fn energy(records: &[DailyRecord], today: NaiveDate) -> PillarState {
    let calories = today
        .pred_opt()
        .and_then(|yesterday| records.iter().find(|r| r.date == yesterday))
        .map_or(0.0, |r| r.nutrition.calories);

    // Nothing logged counts as green as well
    PillarState::from_ok(!(calories > 0.0 && calories < ENERGY_CALORIE_FLOOR))
}

fn rest(records: &[DailyRecord], today: NaiveDate) -> PillarState {
    let latest_hrv = records
        .iter()
        .filter(|r| r.date <= today)
        .max_by_key(|r| r.date)
        .and_then(|r| r.hrv);

    PillarState::from_ok(latest_hrv.is_some_and(|hrv| hrv >= REST_HRV_MS))
}

/// Evaluate the three pillars for `today` from the surrounding daily records
pub fn bio_pillars(records: &[DailyRecord], today: NaiveDate) -> BioPillars {
    BioPillars {
        regulation: regulation(records, today),
        energy: energy(records, today),
        rest: rest(records, today),
    }
}
