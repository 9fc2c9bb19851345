// Library interface for VitalRS modules
// Integration tests and benchmarks use the analytics through this crate root

pub mod activity_analysis;
pub mod analysis;
pub mod baseline;
pub mod config;
pub mod correlation;
pub mod digestion;
pub mod error;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod nutrition;
pub mod pillars;
pub mod ratios;
pub mod score;
pub mod weekly;

// Re-export commonly used types for convenience
pub use models::*;
pub use activity_analysis::{classify_activity, ActivityClassification, ActivityMetrics};
pub use analysis::{assess_day, DailyAssessment};
pub use baseline::{rolling_baseline, BaselineBand, BaselineMetric, StableBand};
pub use config::AppConfig;
pub use correlation::{correlation_matrix, pearson, CorrelationMatrix, WeeklyMetric};
pub use digestion::{digestive_load, DigestiveLevel, DigestiveLoad, TimeToSleep};
pub use history::{HistoryRepository, InMemoryHistory, JsonFileHistory, MineralSnapshot};
pub use pillars::{bio_pillars, BioPillars, PillarState};
pub use ratios::{compute_ratios, deficit_streak, ratio_status, DeficitStreak, Mineral, RatioStatus};
pub use score::{fa_score, fa_score_breakdown, fa_score_label, FaScoreInputs};
pub use weekly::{baselines, weekly_summaries, WeeklyBaselines, WeeklySummary};
pub use error::{Result, VitalError};
pub use logging::{LogConfig, LogFormat, LogLevel};
