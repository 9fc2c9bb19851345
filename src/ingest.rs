//! Loading daily records and nutrition entries from files
//!
//! Records come from JSON (including the field names used by common training platforms)
//! or from flat CSV files without activities. Every loaded set is normalized: ordered by
//! date with one record per date.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{IngestError, Result};
use crate::models::{Activity, ActivityType, DailyRecord, NutrientLogEntry, Nutrients};

/// Source format able to produce daily records
pub trait RecordFormat {
    /// Check whether this format handles the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Parse the file into records, not yet normalized
    fn import_file(&self, file_path: &Path) -> Result<Vec<DailyRecord>>;

    fn format_name(&self) -> &'static str;
}

fn has_extension(file_path: &Path, wanted: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

fn parse_error(format: &str, err: impl ToString) -> IngestError {
    IngestError::ParseError {
        format: format.to_string(),
        reason: err.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct RawActivity {
    #[serde(rename = "type")]
    activity_type: ActivityType,

    #[serde(default, alias = "moving_time")]
    moving_time_seconds: u32,

    #[serde(default, alias = "trainer")]
    is_stationary: bool,

    #[serde(default)]
    is_virtual: bool,

    #[serde(default, alias = "icu_training_load", alias = "tss")]
    training_load: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDay {
    #[serde(alias = "id")]
    date: NaiveDate,

    #[serde(default, alias = "hrv_rmssd", alias = "hrvRMSSD")]
    hrv: Option<f64>,

    #[serde(default, alias = "restingHR", alias = "resting_heart_rate")]
    resting_hr: Option<f64>,

    #[serde(default, alias = "sleepScore")]
    sleep_score: Option<f64>,

    #[serde(default, alias = "icu_ctl")]
    ctl: Option<f64>,

    #[serde(default, alias = "icu_atl")]
    atl: Option<f64>,

    #[serde(default, alias = "dailyTSS", alias = "tss")]
    daily_tss: Option<f64>,

    #[serde(default)]
    activities: Vec<RawActivity>,

    #[serde(default)]
    nutrition: Nutrients,
}

fn non_negative(field: &str, date: NaiveDate, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            warn!(%date, field, value = v, "Dropping invalid reading");
            None
        }
        other => other,
    }
}

impl From<RawDay> for DailyRecord {
    fn from(raw: RawDay) -> Self {
        let date = raw.date;
        let activity_load: f64 = raw.activities.iter().filter_map(|a| a.training_load).sum();

        let activities = raw
            .activities
            .into_iter()
            .map(|a| Activity {
                is_virtual: a.is_virtual || a.activity_type == ActivityType::VirtualRide,
                activity_type: a.activity_type,
                moving_time_seconds: a.moving_time_seconds,
                is_stationary: a.is_stationary,
            })
            .collect();

        DailyRecord {
            date,
            hrv: non_negative("hrv", date, raw.hrv),
            resting_hr: non_negative("resting_hr", date, raw.resting_hr),
            sleep_score: non_negative("sleep_score", date, raw.sleep_score),
            ctl: raw.ctl,
            atl: raw.atl,
            daily_tss: raw.daily_tss.unwrap_or(activity_load),
            activities,
            nutrition: raw.nutrition,
        }
    }
}

/// JSON array of daily records
#[derive(Debug, Default)]
pub struct JsonRecordFormat;

impl RecordFormat for JsonRecordFormat {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<DailyRecord>> {
        let content = fs::read_to_string(file_path)?;
        let raw: Vec<RawDay> =
            serde_json::from_str(&content).map_err(|e| parse_error(self.format_name(), e))?;
        Ok(raw.into_iter().map(DailyRecord::from).collect())
    }

    fn format_name(&self) -> &'static str {
        "json"
    }
}

#[derive(Debug, Deserialize)]
struct CsvDay {
    date: NaiveDate,
    #[serde(default, alias = "hrv_rmssd")]
    hrv: Option<f64>,
    #[serde(default, alias = "rhr")]
    resting_hr: Option<f64>,
    #[serde(default, alias = "sleep")]
    sleep_score: Option<f64>,
    #[serde(default)]
    ctl: Option<f64>,
    #[serde(default)]
    atl: Option<f64>,
    #[serde(default, alias = "tss")]
    daily_tss: Option<f64>,
    #[serde(default)]
    calories: Option<f64>,
    #[serde(default)]
    protein: Option<f64>,
    #[serde(default)]
    carbs: Option<f64>,
    #[serde(default)]
    fat: Option<f64>,
    #[serde(default)]
    fiber: Option<f64>,
    #[serde(default)]
    na: Option<f64>,
    #[serde(default)]
    k: Option<f64>,
    #[serde(default)]
    ca: Option<f64>,
    #[serde(default)]
    mg: Option<f64>,
    #[serde(default)]
    taurine_mg: Option<f64>,
}

impl From<CsvDay> for DailyRecord {
    fn from(row: CsvDay) -> Self {
        let date = row.date;
        let amount = |v: Option<f64>| v.unwrap_or(0.0);

        DailyRecord {
            date,
            hrv: non_negative("hrv", date, row.hrv),
            resting_hr: non_negative("resting_hr", date, row.resting_hr),
            sleep_score: non_negative("sleep_score", date, row.sleep_score),
            ctl: row.ctl,
            atl: row.atl,
            daily_tss: amount(row.daily_tss),
            activities: Vec::new(),
            nutrition: Nutrients {
                calories: amount(row.calories),
                protein: amount(row.protein),
                carbs: amount(row.carbs),
                fat: amount(row.fat),
                fiber: amount(row.fiber),
                na: amount(row.na),
                k: amount(row.k),
                ca: amount(row.ca),
                mg: amount(row.mg),
                taurine_mg: amount(row.taurine_mg),
            },
        }
    }
}

/// Flat CSV with one row per day and a header line
#[derive(Debug, Default)]
pub struct CsvRecordFormat;

impl RecordFormat for CsvRecordFormat {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<DailyRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(file_path)?;

        let mut records = Vec::new();
        for row in reader.deserialize::<CsvDay>() {
            let row = row.map_err(|e| parse_error(self.format_name(), e))?;
            records.push(DailyRecord::from(row));
        }
        Ok(records)
    }

    fn format_name(&self) -> &'static str {
        "csv"
    }
}

/// Picks a format by file extension and normalizes the result
pub struct ImportManager {
    formats: Vec<Box<dyn RecordFormat>>,
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportManager {
    pub fn new() -> Self {
        Self {
            formats: vec![Box::new(JsonRecordFormat), Box::new(CsvRecordFormat)],
        }
    }

    /// Load, then normalize, the records in `file_path`
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<DailyRecord>> {
        if !file_path.exists() {
            return Err(IngestError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let format = self
            .formats
            .iter()
            .find(|format| format.can_import(file_path))
            .ok_or_else(|| IngestError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?;

        let records = format.import_file(file_path)?;
        info!(
            path = %file_path.display(),
            format = format.format_name(),
            count = records.len(),
            "Loaded daily records"
        );
        Ok(normalize_records(records))
    }
}

/// Order records by date, keeping only the last record seen for a duplicated date
pub fn normalize_records(records: Vec<DailyRecord>) -> Vec<DailyRecord> {
    let mut by_date: BTreeMap<NaiveDate, DailyRecord> = BTreeMap::new();

    for record in records {
        if let Some(previous) = by_date.insert(record.date, record) {
            warn!(date = %previous.date, "Duplicate record for date, keeping the later one");
        }
    }

    debug!(count = by_date.len(), "Records normalized");
    by_date.into_values().collect()
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<Uuid>,
    name: String,
    #[serde(default = "default_quantity")]
    quantity: f64,
    #[serde(alias = "nutrients")]
    per_unit: Nutrients,
    timestamp: NaiveDateTime,
}

/// Load nutrition log entries from a JSON array.
///
/// The time block is always derived from the timestamp; ids are generated when absent.
pub fn load_entries(file_path: &Path) -> Result<Vec<NutrientLogEntry>> {
    if !file_path.exists() {
        return Err(IngestError::FileNotFound {
            path: file_path.to_path_buf(),
        }
        .into());
    }

    let content = fs::read_to_string(file_path)?;
    let raw: Vec<RawEntry> = serde_json::from_str(&content).map_err(|e| parse_error("json", e))?;

    let mut entries = Vec::with_capacity(raw.len());
    for item in raw {
        if !item.quantity.is_finite() || item.quantity < 0.0 {
            return Err(IngestError::InvalidField {
                field: "quantity".to_string(),
                reason: format!("{} has quantity {}", item.name, item.quantity),
            }
            .into());
        }
        let mut entry = NutrientLogEntry::new(item.name, item.quantity, item.per_unit, item.timestamp);
        if let Some(id) = item.id {
            entry.id = id;
        }
        entries.push(entry);
    }

    info!(path = %file_path.display(), count = entries.len(), "Loaded nutrition entries");
    Ok(entries)
}
