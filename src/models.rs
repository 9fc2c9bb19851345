use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use uuid::Uuid;

/// Activity types reported by the training platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Ride,
    #[serde(rename = "E-BikeRide")]
    EBikeRide,
    VirtualRide,
    Run,
    Walk,
    Swim,
    WeightTraining,
    #[serde(other)]
    Other,
}

impl ActivityType {
    /// Outdoor-capable cycling types (regular and e-bike rides)
    pub fn is_ride(&self) -> bool {
        matches!(self, ActivityType::Ride | ActivityType::EBikeRide)
    }
}

/// One activity completed on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity type
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// Moving time in seconds
    #[serde(default)]
    pub moving_time_seconds: u32,

    /// Performed on a trainer or otherwise stationary
    #[serde(default)]
    pub is_stationary: bool,

    /// Performed in a virtual environment
    #[serde(default)]
    pub is_virtual: bool,
}

impl Activity {
    /// Moving time in whole and fractional minutes
    pub fn moving_time_minutes(&self) -> f64 {
        f64::from(self.moving_time_seconds) / 60.0
    }
}

/// Nutrient amounts, used both for per-unit food values and for daily totals.
///
/// Units: calories in kcal, macros in grams, minerals and taurine in milligrams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub na: f64,
    pub k: f64,
    pub ca: f64,
    pub mg: f64,
    pub taurine_mg: f64,
}

impl Nutrients {
    /// Scale every field by a quantity multiplier
    pub fn scaled(&self, quantity: f64) -> Self {
        Nutrients {
            calories: self.calories * quantity,
            protein: self.protein * quantity,
            carbs: self.carbs * quantity,
            fat: self.fat * quantity,
            fiber: self.fiber * quantity,
            na: self.na * quantity,
            k: self.k * quantity,
            ca: self.ca * quantity,
            mg: self.mg * quantity,
            taurine_mg: self.taurine_mg * quantity,
        }
    }

    /// Taurine converted to grams, as consumed by the stability score
    pub fn taurine_grams(&self) -> f64 {
        self.taurine_mg / 1000.0
    }
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(mut self, rhs: Nutrients) -> Nutrients {
        self += rhs;
        self
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Nutrients) {
        self.calories += rhs.calories;
        self.protein += rhs.protein;
        self.carbs += rhs.carbs;
        self.fat += rhs.fat;
        self.fiber += rhs.fiber;
        self.na += rhs.na;
        self.k += rhs.k;
        self.ca += rhs.ca;
        self.mg += rhs.mg;
        self.taurine_mg += rhs.taurine_mg;
    }
}

impl std::iter::Sum for Nutrients {
    fn sum<I: Iterator<Item = Nutrients>>(iter: I) -> Self {
        iter.fold(Nutrients::default(), Add::add)
    }
}

/// Part of the day a nutrition entry was logged in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeBlock {
    #[serde(rename = "mañana")]
    Morning,
    #[serde(rename = "tarde")]
    Afternoon,
    #[serde(rename = "noche")]
    Night,
}

impl TimeBlock {
    /// Derive the block from the hour of day: before 14h morning, before 19h afternoon
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            h if h < 14 => TimeBlock::Morning,
            h if h < 19 => TimeBlock::Afternoon,
            _ => TimeBlock::Night,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeBlock::Morning => "mañana",
            TimeBlock::Afternoon => "tarde",
            TimeBlock::Night => "noche",
        }
    }
}

/// One logged food item. Entries are immutable once created; edits replace the whole entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientLogEntry {
    /// Unique entry identifier
    pub id: Uuid,

    /// Food name as logged
    pub name: String,

    /// Quantity multiplier applied to the per-unit values
    pub quantity: f64,

    /// Nutrient values for one unit of the food
    pub per_unit: Nutrients,

    /// When the entry was logged
    pub timestamp: NaiveDateTime,
}

impl NutrientLogEntry {
    pub fn new(name: impl Into<String>, quantity: f64, per_unit: Nutrients, timestamp: NaiveDateTime) -> Self {
        NutrientLogEntry {
            id: Uuid::new_v4(),
            name: name.into(),
            quantity,
            per_unit,
            timestamp,
        }
    }

    /// Block of the day, always derived from the timestamp hour
    pub fn time_block(&self) -> TimeBlock {
        TimeBlock::from_hour(self.timestamp.hour())
    }

    /// Calendar date the entry belongs to
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Per-unit values multiplied by the quantity
    pub fn totals(&self) -> Nutrients {
        self.per_unit.scaled(self.quantity)
    }
}

/// Day type used to select a threshold profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Training,
    Rest,
}

/// Canonical per-date record combining biometrics, training load, and nutrition totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Calendar date (unique key)
    pub date: NaiveDate,

    /// Heart rate variability in ms
    pub hrv: Option<f64>,

    /// Resting heart rate in bpm
    pub resting_hr: Option<f64>,

    /// Sleep score (0-100)
    pub sleep_score: Option<f64>,

    /// Chronic training load
    pub ctl: Option<f64>,

    /// Acute training load
    pub atl: Option<f64>,

    /// Sum of same-day activity loads
    pub daily_tss: f64,

    /// Activities in the order they were completed
    pub activities: Vec<Activity>,

    /// Nutrition totals, always the sum of the day's log entries
    pub nutrition: Nutrients,
}

impl DailyRecord {
    /// Empty record for a date
    pub fn new(date: NaiveDate) -> Self {
        DailyRecord {
            date,
            hrv: None,
            resting_hr: None,
            sleep_score: None,
            ctl: None,
            atl: None,
            daily_tss: 0.0,
            activities: Vec::new(),
            nutrition: Nutrients::default(),
        }
    }

    /// Training stress balance (CTL - ATL) when both loads are known
    pub fn tsb(&self) -> Option<f64> {
        match (self.ctl, self.atl) {
            (Some(ctl), Some(atl)) => Some(ctl - atl),
            _ => None,
        }
    }

    /// Replace the nutrition totals with the sum of the entries dated on this record's day.
    ///
    /// Entries for other dates are ignored, so the whole log can be passed in.
    pub fn apply_log(&mut self, entries: &[NutrientLogEntry]) {
        self.nutrition = entries
            .iter()
            .filter(|entry| entry.date() == self.date)
            .map(NutrientLogEntry::totals)
            .sum();
    }
}
