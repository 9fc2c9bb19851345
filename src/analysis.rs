//! Daily assessment: everything computed for one date in a single pass
//!
//! Combines ratios, deficit streaks, digestive load and the FA score. The assessment is
//! a pure function of its inputs; persisting the day's minerals and flags is left to the
//! caller through [`DailyAssessment::mineral_snapshot`] and [`DailyAssessment::day_flags`].

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{AppConfig, DeficitThresholds};
use crate::digestion::{digestive_load, DigestiveLoad, TimeToSleep};
use crate::history::{DayFlags, MineralSnapshot};
use crate::models::{DailyRecord, DayType, NutrientLogEntry, Nutrients};
use crate::nutrition::{nutrient_report, NutrientStatus};
use crate::ratios::{
    compute_ratios, deficit_streak, ratio_status, DeficitStreak, ElectrolyteRatios, Mineral,
    RatioStatus,
};
use crate::score::{fa_score_breakdown, fa_score_label, FaScoreInputs, FaScoreLabel, ScoreBreakdown};

/// Deficit streaks for the tracked minerals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MineralDeficits {
    pub na: DeficitStreak,
    pub k: DeficitStreak,
    pub mg: DeficitStreak,
}

impl MineralDeficits {
    pub fn get(&self, mineral: Mineral) -> DeficitStreak {
        match mineral {
            Mineral::Na => self.na,
            Mineral::K => self.k,
            Mineral::Mg => self.mg,
        }
    }

    /// Minerals currently in a deficit streak
    pub fn active(&self) -> Vec<(Mineral, DeficitStreak)> {
        Mineral::ALL
            .iter()
            .map(|m| (*m, self.get(*m)))
            .filter(|(_, streak)| streak.deficit)
            .collect()
    }
}

/// Full assessment of one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAssessment {
    pub date: NaiveDate,
    pub day_type: DayType,
    pub totals: Nutrients,
    pub ratios: ElectrolyteRatios,
    pub na_k_status: RatioStatus,
    pub ca_mg_status: RatioStatus,
    pub deficits: MineralDeficits,
    pub digestion: DigestiveLoad,
    pub score: ScoreBreakdown,
    pub label: FaScoreLabel,
    /// Dinner classified as heavy
    pub heavy_dinner: bool,
    pub nutrients: Vec<NutrientStatus>,
}

impl DailyAssessment {
    /// Minerals to record in the history for this date
    pub fn mineral_snapshot(&self) -> MineralSnapshot {
        MineralSnapshot {
            na: self.totals.na,
            k: self.totals.k,
            mg: self.totals.mg,
        }
    }

    pub fn day_flags(&self) -> DayFlags {
        DayFlags {
            heavy_dinner: self.heavy_dinner,
        }
    }
}

fn deficit_threshold(mineral: Mineral, thresholds: &DeficitThresholds) -> f64 {
    match mineral {
        Mineral::Na => thresholds.na,
        Mineral::K => thresholds.k,
        Mineral::Mg => thresholds.mg,
    }
}

/// Assess `record` for its own date.
///
/// When `entries` holds log entries for the record's date, the totals are summed from
/// them; otherwise the record's stored nutrition totals are used. `history` supplies the
/// previous days' minerals for the deficit streaks.
pub fn assess_day(
    record: &DailyRecord,
    entries: &[NutrientLogEntry],
    time_to_sleep: TimeToSleep,
    history: &BTreeMap<NaiveDate, MineralSnapshot>,
    config: &AppConfig,
    day_type: DayType,
) -> DailyAssessment {
    let date = record.date;
    let day_entries: Vec<NutrientLogEntry> = entries
        .iter()
        .filter(|entry| entry.date() == date)
        .cloned()
        .collect();

    let totals = if day_entries.is_empty() {
        record.nutrition
    } else {
        day_entries.iter().map(NutrientLogEntry::totals).sum()
    };

    let thresholds = config.thresholds.for_day(day_type);
    let ratios = compute_ratios(totals.na, totals.k, totals.ca, totals.mg);

    let today = MineralSnapshot {
        na: totals.na,
        k: totals.k,
        mg: totals.mg,
    };
    let streak = |mineral: Mineral| {
        deficit_streak(
            mineral,
            deficit_threshold(mineral, &config.deficits),
            date,
            mineral.value_in(&today),
            history,
        )
    };
    let deficits = MineralDeficits {
        na: streak(Mineral::Na),
        k: streak(Mineral::K),
        mg: streak(Mineral::Mg),
    };

    let digestion = digestive_load(&day_entries, time_to_sleep);
    let score = fa_score_breakdown(&FaScoreInputs {
        na: totals.na,
        k: totals.k,
        ca: totals.ca,
        mg: totals.mg,
        taurine_g: totals.taurine_grams(),
        digestive_load: digestion.load,
        tss: record.daily_tss,
    });
    let label = fa_score_label(score.score);

    tracing::info!(
        %date,
        score = score.score,
        band = %label.band,
        heavy_dinner = digestion.is_heavy(),
        "Day assessed"
    );

    DailyAssessment {
        date,
        day_type,
        totals,
        ratios,
        na_k_status: ratio_status(ratios.na_k, &thresholds.na_k),
        ca_mg_status: ratio_status(ratios.ca_mg, &thresholds.ca_mg),
        deficits,
        heavy_dinner: digestion.is_heavy(),
        digestion,
        score,
        label,
        nutrients: nutrient_report(&totals, thresholds),
    }
}
