use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, VitalError};
use crate::logging::LogConfig;
use crate::models::DayType;

/// Main application configuration. Missing sections fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Per day-type nutrient and ratio thresholds
    pub thresholds: ThresholdProfiles,

    /// Multi-day deficit thresholds
    pub deficits: DeficitThresholds,

    /// Rolling baseline settings
    pub baseline: BaselineSettings,

    /// Bounded history settings
    pub history: HistorySettings,

    /// Logging settings
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Intake range for one nutrient: hard bounds plus the optimal band inside them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientRange {
    pub min: f64,
    pub opt_low: f64,
    pub opt_high: f64,
    pub max: f64,
}

impl NutrientRange {
    pub const fn new(min: f64, opt_low: f64, opt_high: f64, max: f64) -> Self {
        NutrientRange {
            min,
            opt_low,
            opt_high,
            max,
        }
    }
}

/// Thresholds for a ratio: below `ideal` is excellent, above `high` is high
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioThresholds {
    pub ideal: f64,
    pub high: f64,
}

/// All thresholds for one day type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayThresholds {
    pub calories: NutrientRange,
    pub protein: NutrientRange,
    pub carbs: NutrientRange,
    pub fat: NutrientRange,
    pub fiber: NutrientRange,
    pub na: NutrientRange,
    pub k: NutrientRange,
    pub ca: NutrientRange,
    pub mg: NutrientRange,
    pub na_k: RatioThresholds,
    pub ca_mg: RatioThresholds,
}

/// Threshold profiles keyed by day type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdProfiles {
    pub training: DayThresholds,
    pub rest: DayThresholds,
}

impl ThresholdProfiles {
    /// Select the profile for a day type
    pub fn for_day(&self, day_type: DayType) -> &DayThresholds {
        match day_type {
            DayType::Training => &self.training,
            DayType::Rest => &self.rest,
        }
    }
}

/// Daily intake below these values counts towards a deficit streak (mg)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeficitThresholds {
    pub na: f64,
    pub k: f64,
    pub mg: f64,
}

/// Rolling baseline settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineSettings {
    /// Samples in the trailing moving average
    pub window: usize,

    /// Minimum valid samples before a baseline is reported
    pub min_samples: usize,

    /// Stable band half-width in standard deviations
    pub band_width_sd: f64,
}

/// Bounded history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Number of dated entries kept; older dates are evicted on write
    pub retention: usize,

    /// JSON file backing the mineral history (in-memory when absent)
    pub mineral_history_path: Option<PathBuf>,

    /// JSON file backing the day flags history
    pub flags_history_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            thresholds: ThresholdProfiles::default(),
            deficits: DeficitThresholds::default(),
            baseline: BaselineSettings::default(),
            history: HistorySettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for ThresholdProfiles {
    fn default() -> Self {
        ThresholdProfiles {
            training: DayThresholds::training(),
            rest: DayThresholds::rest(),
        }
    }
}

impl DayThresholds {
    /// Defaults for days with a structured training session
    pub fn training() -> Self {
        DayThresholds {
            calories: NutrientRange::new(1900.0, 2400.0, 3000.0, 3600.0),
            protein: NutrientRange::new(90.0, 120.0, 160.0, 200.0),
            carbs: NutrientRange::new(200.0, 300.0, 450.0, 550.0),
            fat: NutrientRange::new(50.0, 70.0, 100.0, 130.0),
            fiber: NutrientRange::new(20.0, 25.0, 40.0, 55.0),
            na: NutrientRange::new(1500.0, 2500.0, 4000.0, 5500.0),
            k: NutrientRange::new(3000.0, 3500.0, 5000.0, 6500.0),
            ca: NutrientRange::new(700.0, 900.0, 1300.0, 2000.0),
            mg: NutrientRange::new(400.0, 550.0, 800.0, 1000.0),
            na_k: RatioThresholds {
                ideal: 1.0,
                high: 1.3,
            },
            ca_mg: RatioThresholds {
                ideal: 2.0,
                high: 3.5,
            },
        }
    }

    /// Defaults for rest days: lower energy and sodium needs
    pub fn rest() -> Self {
        DayThresholds {
            calories: NutrientRange::new(1700.0, 2000.0, 2400.0, 2900.0),
            carbs: NutrientRange::new(150.0, 200.0, 300.0, 400.0),
            na: NutrientRange::new(1500.0, 1800.0, 3000.0, 4500.0),
            ..DayThresholds::training()
        }
    }
}

impl Default for DeficitThresholds {
    fn default() -> Self {
        DeficitThresholds {
            na: 1500.0,
            k: 3300.0,
            mg: 400.0,
        }
    }
}

impl Default for BaselineSettings {
    fn default() -> Self {
        BaselineSettings {
            window: 7,
            min_samples: 2,
            band_width_sd: 1.0,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        HistorySettings {
            retention: 7,
            mineral_history_path: None,
            flags_history_path: None,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            VitalError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(self)?;
        fs::write(&path, toml_content)?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vitalrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %err,
                    "Config file not usable, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Write a fresh default configuration to `path`, or to the default location
    /// when no path is given. Returns where the file was written.
    pub fn init_file(path: Option<&Path>) -> Result<PathBuf> {
        let mut fresh = AppConfig::default();
        match path {
            Some(path) => {
                fresh.save_to_file(path)?;
                Ok(path.to_path_buf())
            }
            None => {
                fresh.save_default()?;
                Ok(Self::default_config_path())
            }
        }
    }

    /// Reject configurations the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.history.retention == 0 {
            return Err(VitalError::Configuration(
                "history.retention must be at least 1".to_string(),
            ));
        }
        if self.baseline.window == 0 {
            return Err(VitalError::Configuration(
                "baseline.window must be at least 1".to_string(),
            ));
        }
        for (name, profile) in [("training", &self.thresholds.training), ("rest", &self.thresholds.rest)] {
            for ratio in [profile.na_k, profile.ca_mg] {
                if ratio.ideal > ratio.high {
                    return Err(VitalError::Configuration(format!(
                        "{} ratio thresholds: ideal {} exceeds high {}",
                        name, ratio.ideal, ratio.high
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.thresholds, deserialized.thresholds);
        assert_eq!(config.deficits, deserialized.deficits);
    }

    #[test]
    fn test_day_type_selection() {
        let profiles = ThresholdProfiles::default();
        assert_eq!(profiles.for_day(DayType::Training).calories.min, 1900.0);
        assert_eq!(profiles.for_day(DayType::Rest).calories.min, 1700.0);
        assert_eq!(profiles.for_day(DayType::Rest).mg, profiles.training.mg);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.deficits.k = 3100.0;
        original.history.mineral_history_path = Some(temp_dir.path().join("minerals.json"));

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.deficits.k, 3100.0);
        assert_eq!(loaded.history.mineral_history_path, original.history.mineral_history_path);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "[deficits]\nna = 1400.0\nk = 3000.0\nmg = 380.0\n").unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.deficits.k, 3000.0);
        assert_eq!(loaded.deficits.mg, 380.0);
        assert_eq!(loaded.thresholds, ThresholdProfiles::default());
        assert_eq!(loaded.history, HistorySettings::default());
        assert_eq!(loaded.metadata.version, "1.0");
    }

    #[test]
    fn test_partial_sections_fill_missing_keys() {
        let config: AppConfig = toml::from_str(
            "[deficits]\nk = 3100.0\n\n[history]\nretention = 14\n",
        )
        .unwrap();

        assert_eq!(config.deficits.k, 3100.0);
        assert_eq!(config.deficits.na, DeficitThresholds::default().na);
        assert_eq!(config.history.retention, 14);
        assert_eq!(config.history.mineral_history_path, None);
        assert_eq!(config.thresholds.training, DayThresholds::training());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_init_file_at_fresh_path() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("new").join("vitalrs.toml");
        assert!(!config_path.exists());

        let written = AppConfig::init_file(Some(&config_path)).unwrap();
        assert_eq!(written, config_path);

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.deficits, DeficitThresholds::default());
        assert_eq!(loaded.history.retention, 7);
    }

    #[test]
    fn test_validation_rejects_zero_retention() {
        let mut config = AppConfig::default();
        config.history.retention = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_ratio() {
        let mut config = AppConfig::default();
        config.thresholds.rest.na_k = RatioThresholds {
            ideal: 2.0,
            high: 1.0,
        };
        assert!(matches!(config.validate(), Err(VitalError::Configuration(_))));
    }
}
