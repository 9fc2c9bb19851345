//! Nocturnal digestive load
//!
//! Scores how much dinner-time fat and fiber will still be digesting at bedtime.
//! Only entries in the night block count, and the penalty grows the closer the meal is
//! to sleep:
//!
//! ```text
//! fat_penalty   = max(0, night_fat - 20) * 1.2
//! fiber_penalty = night_fiber * 0.8
//! load          = (fat_penalty + fiber_penalty) * time_factor
//! ```
//!
//! The time factor is 1.0 for more than two hours before sleep, 1.3 for one to two
//! hours and 1.6 for less than an hour.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{NutrientLogEntry, TimeBlock};

/// Fat grams tolerated before a penalty applies
pub const FAT_ALLOWANCE_G: f64 = 20.0;
const FAT_WEIGHT: f64 = 1.2;
const FIBER_WEIGHT: f64 = 0.8;

/// Loads below this are light
pub const LIGHT_LIMIT: f64 = 120.0;
/// Loads below this (and at least `LIGHT_LIMIT`) are moderate
pub const MODERATE_LIMIT: f64 = 180.0;

/// Gap between the last meal and going to sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeToSleep {
    #[serde(rename = ">2h")]
    OverTwoHours,
    #[serde(rename = "1-2h")]
    OneToTwoHours,
    #[serde(rename = "<1h")]
    UnderOneHour,
}

impl TimeToSleep {
    pub fn factor(&self) -> f64 {
        match self {
            TimeToSleep::OverTwoHours => 1.0,
            TimeToSleep::OneToTwoHours => 1.3,
            TimeToSleep::UnderOneHour => 1.6,
        }
    }
}

impl Default for TimeToSleep {
    fn default() -> Self {
        TimeToSleep::OverTwoHours
    }
}

impl std::str::FromStr for TimeToSleep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">2h" => Ok(TimeToSleep::OverTwoHours),
            "1-2h" => Ok(TimeToSleep::OneToTwoHours),
            "<1h" => Ok(TimeToSleep::UnderOneHour),
            other => Err(format!("Invalid time to sleep: {} (use >2h, 1-2h or <1h)", other)),
        }
    }
}

impl fmt::Display for TimeToSleep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeToSleep::OverTwoHours => write!(f, ">2h"),
            TimeToSleep::OneToTwoHours => write!(f, "1-2h"),
            TimeToSleep::UnderOneHour => write!(f, "<1h"),
        }
    }
}

/// Digestive load classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestiveLevel {
    Low,
    Medium,
    High,
}

impl DigestiveLevel {
    pub fn from_load(load: f64) -> Self {
        if load < LIGHT_LIMIT {
            DigestiveLevel::Low
        } else if load < MODERATE_LIMIT {
            DigestiveLevel::Medium
        } else {
            DigestiveLevel::High
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            DigestiveLevel::Low => "Ligera",
            DigestiveLevel::Medium => "Moderada",
            DigestiveLevel::High => "Pesada",
        }
    }
}

/// Computed digestive load for one night
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigestiveLoad {
    pub night_fat: f64,
    pub night_fiber: f64,
    pub time_to_sleep: TimeToSleep,
    pub load: f64,
    pub level: DigestiveLevel,
}

impl DigestiveLoad {
    /// Score from already-summed night fat and fiber grams
    pub fn from_totals(night_fat: f64, night_fiber: f64, time_to_sleep: TimeToSleep) -> Self {
        let fat_penalty = (night_fat - FAT_ALLOWANCE_G).max(0.0) * FAT_WEIGHT;
        let fiber_penalty = night_fiber * FIBER_WEIGHT;
        let load = (fat_penalty + fiber_penalty) * time_to_sleep.factor();

        DigestiveLoad {
            night_fat,
            night_fiber,
            time_to_sleep,
            load,
            level: DigestiveLevel::from_load(load),
        }
    }

    /// A heavy dinner is one classified at the high level
    pub fn is_heavy(&self) -> bool {
        self.level == DigestiveLevel::High
    }
}

/// Score the night-block entries among `entries`; other blocks are ignored.
pub fn digestive_load(entries: &[NutrientLogEntry], time_to_sleep: TimeToSleep) -> DigestiveLoad {
    let (night_fat, night_fiber) = entries
        .iter()
        .filter(|entry| entry.time_block() == TimeBlock::Night)
        .map(NutrientLogEntry::totals)
        .fold((0.0, 0.0), |(fat, fiber), totals| {
            (fat + totals.fat, fiber + totals.fiber)
        });

    DigestiveLoad::from_totals(night_fat, night_fiber, time_to_sleep)
}
