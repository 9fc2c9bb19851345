//! Trailing-week aggregation and weekly heart baselines
//!
//! Week `i` ends `i * 7` days before `today` and spans seven calendar days ending there.
//! Weeks without any record are skipped. Each average only uses the days where that
//! field is present, so a week's HRV average can come from fewer days than its TSS sum.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::DailyRecord;

/// Weeks in the chronic baseline
pub const CHRONIC_WEEKS: usize = 4;
/// Weeks in the historic baseline
pub const HISTORIC_WEEKS: usize = 8;

/// Aggregates for one trailing week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    /// Human-readable date range
    pub label: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    /// Records that fell in the week
    pub days: usize,
    pub total_tss: f64,
    pub atl: Option<f64>,
    pub ctl: Option<f64>,
    pub resting_hr: Option<f64>,
    pub hrv: Option<f64>,
    pub sleep_score: Option<f64>,
}

/// Average of the present values, `None` when there are none
fn mean_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn summarize(week_start: NaiveDate, week_end: NaiveDate, records: &[&DailyRecord]) -> WeeklySummary {
    let field = |get: fn(&DailyRecord) -> Option<f64>| mean_present(records.iter().map(|r| get(r)));

    WeeklySummary {
        label: format!("{} - {}", week_start.format("%d %b"), week_end.format("%d %b")),
        week_start,
        week_end,
        days: records.len(),
        total_tss: records.iter().map(|r| r.daily_tss).sum(),
        atl: field(|r| r.atl),
        ctl: field(|r| r.ctl),
        resting_hr: field(|r| r.resting_hr),
        hrv: field(|r| r.hrv),
        sleep_score: field(|r| r.sleep_score),
    }
}

/// Summaries of the last `week_count` trailing weeks ending on `today`, oldest first.
pub fn weekly_summaries(records: &[DailyRecord], week_count: usize, today: NaiveDate) -> Vec<WeeklySummary> {
    let mut summaries = Vec::with_capacity(week_count);

    for i in 0..week_count {
        let Some(week_end) = today.checked_sub_days(Days::new(i as u64 * 7)) else {
            break;
        };
        let Some(week_start) = week_end.checked_sub_days(Days::new(6)) else {
            break;
        };

        let in_week: Vec<&DailyRecord> = records
            .iter()
            .filter(|r| r.date >= week_start && r.date <= week_end)
            .collect();

        if in_week.is_empty() {
            tracing::debug!(%week_start, %week_end, "Skipping week without records");
            continue;
        }

        summaries.push(summarize(week_start, week_end, &in_week));
    }

    summaries.reverse();
    summaries
}

/// Resting heart rate and HRV averaged over a set of weeks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartBaseline {
    pub resting_hr: Option<f64>,
    pub hrv: Option<f64>,
    /// Weeks that qualified for this baseline
    pub weeks: usize,
}

/// The three weekly baselines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyBaselines {
    /// Weeks with ATL at or below the average ATL
    pub recovery: Option<HeartBaseline>,
    /// Most recent four weeks
    pub chronic: Option<HeartBaseline>,
    /// Most recent eight weeks
    pub historic: Option<HeartBaseline>,
}

fn heart_baseline(weeks: &[&WeeklySummary]) -> Option<HeartBaseline> {
    if weeks.is_empty() {
        return None;
    }
    Some(HeartBaseline {
        resting_hr: mean_present(weeks.iter().map(|w| w.resting_hr)),
        hrv: mean_present(weeks.iter().map(|w| w.hrv)),
        weeks: weeks.len(),
    })
}

/// Recovery, chronic and historic baselines from summaries ordered oldest first
pub fn baselines(summaries: &[WeeklySummary]) -> WeeklyBaselines {
    let recovery = mean_present(summaries.iter().map(|w| w.atl)).and_then(|avg_atl| {
        let easy: Vec<&WeeklySummary> = summaries
            .iter()
            .filter(|w| w.atl.is_some_and(|atl| atl <= avg_atl))
            .collect();
        heart_baseline(&easy)
    });

    let recent = |count: usize| {
        let skip = summaries.len().saturating_sub(count);
        let weeks: Vec<&WeeklySummary> = summaries.iter().skip(skip).collect();
        heart_baseline(&weeks)
    };

    WeeklyBaselines {
        recovery,
        chronic: recent(CHRONIC_WEEKS),
        historic: recent(HISTORIC_WEEKS),
    }
}
