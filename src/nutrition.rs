//! Nutrition log and intake range classification
//!
//! Daily totals are never stored next to the log: they are summed from the entries of a
//! date each time they are asked for, so adding or removing an entry is always reflected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{DayThresholds, NutrientRange};
use crate::models::{NutrientLogEntry, Nutrients, TimeBlock};

/// Ordered collection of logged food entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionLog {
    entries: Vec<NutrientLogEntry>,
}

impl NutritionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<NutrientLogEntry>) -> Self {
        NutritionLog { entries }
    }

    pub fn entries(&self) -> &[NutrientLogEntry] {
        &self.entries
    }

    /// Append an entry
    pub fn add(&mut self, entry: NutrientLogEntry) {
        self.entries.push(entry);
    }

    /// Remove an entry by id, returning it if present
    pub fn remove(&mut self, id: Uuid) -> Option<NutrientLogEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Replace the entry carrying the same id as `entry`. Returns the previous entry.
    pub fn replace(&mut self, entry: NutrientLogEntry) -> Option<NutrientLogEntry> {
        let slot = self.entries.iter_mut().find(|existing| existing.id == entry.id)?;
        Some(std::mem::replace(slot, entry))
    }

    /// Entries logged on `date`, in log order
    pub fn entries_for(&self, date: NaiveDate) -> impl Iterator<Item = &NutrientLogEntry> {
        self.entries.iter().filter(move |entry| entry.date() == date)
    }

    /// Entries logged on `date` in the night block
    pub fn night_entries(&self, date: NaiveDate) -> Vec<NutrientLogEntry> {
        self.entries_for(date)
            .filter(|entry| entry.time_block() == TimeBlock::Night)
            .cloned()
            .collect()
    }

    /// Sum of all entries logged on `date`
    pub fn totals_for(&self, date: NaiveDate) -> Nutrients {
        self.entries_for(date).map(NutrientLogEntry::totals).sum()
    }
}

/// Position of an intake value within its configured range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeStatus {
    Deficient,
    Low,
    Optimal,
    High,
    Excess,
}

impl RangeStatus {
    pub fn description(&self) -> &'static str {
        match self {
            RangeStatus::Deficient => "Below minimum",
            RangeStatus::Low => "Below optimal",
            RangeStatus::Optimal => "Optimal",
            RangeStatus::High => "Above optimal",
            RangeStatus::Excess => "Above maximum",
        }
    }
}

/// Classify a value against `{min, opt_low, opt_high, max}`
pub fn range_status(value: f64, range: &NutrientRange) -> RangeStatus {
    match value {
        v if v < range.min => RangeStatus::Deficient,
        v if v < range.opt_low => RangeStatus::Low,
        v if v <= range.opt_high => RangeStatus::Optimal,
        v if v <= range.max => RangeStatus::High,
        _ => RangeStatus::Excess,
    }
}

/// One line of a nutrient report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientStatus {
    pub nutrient: &'static str,
    pub value: f64,
    pub status: RangeStatus,
}

/// Status of every tracked nutrient against a day-type profile
pub fn nutrient_report(totals: &Nutrients, thresholds: &DayThresholds) -> Vec<NutrientStatus> {
    [
        ("calories", totals.calories, &thresholds.calories),
        ("protein", totals.protein, &thresholds.protein),
        ("carbs", totals.carbs, &thresholds.carbs),
        ("fat", totals.fat, &thresholds.fat),
        ("fiber", totals.fiber, &thresholds.fiber),
        ("na", totals.na, &thresholds.na),
        ("k", totals.k, &thresholds.k),
        ("ca", totals.ca, &thresholds.ca),
        ("mg", totals.mg, &thresholds.mg),
    ]
    .into_iter()
    .map(|(nutrient, value, range)| NutrientStatus {
        nutrient,
        value,
        status: range_status(value, range),
    })
    .collect()
}
