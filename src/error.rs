//! Unified error hierarchy for VitalRS
//!
//! The analytics core never fails: missing data surfaces as `None` or an explicit
//! "insufficient" marker. These errors cover the boundary around it (configuration,
//! history storage, ingestion) and integrate with the tracing system.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all VitalRS boundary operations
#[derive(Debug, Error)]
pub enum VitalError {
    /// Record ingestion errors
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// History repository errors
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors raised while loading and normalizing daily records
#[derive(Debug, Error)]
pub enum IngestError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported input format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Invalid field value
    #[error("Invalid field value in {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Errors raised by history repositories
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Backing store could not be read
    #[error("History store unreadable at {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// Backing store could not be written
    #[error("History store write failed at {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    /// Retention must keep at least one entry
    #[error("Invalid retention: {retention}")]
    InvalidRetention { retention: usize },
}

/// Result type alias for VitalRS operations
pub type Result<T> = std::result::Result<T, VitalError>;

impl From<toml::de::Error> for VitalError {
    fn from(err: toml::de::Error) -> Self {
        VitalError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for VitalError {
    fn from(err: toml::ser::Error) -> Self {
        VitalError::Configuration(err.to_string())
    }
}

impl VitalError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VitalError::Io(_) | VitalError::History(HistoryError::WriteFailed { .. })
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VitalError::Ingest(IngestError::FileNotFound { .. }) => ErrorSeverity::Warning,
            VitalError::Ingest(IngestError::InvalidField { .. }) => ErrorSeverity::Warning,
            VitalError::Validation(_) => ErrorSeverity::Warning,
            VitalError::History(_) => ErrorSeverity::Error,
            VitalError::Configuration(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            VitalError::Ingest(IngestError::FileNotFound { path }) => {
                format!("Could not find data file: {}", path.display())
            }
            VitalError::Ingest(IngestError::UnsupportedFormat { format }) => {
                format!("Unsupported data format '{}'. Use .json or .csv files.", format)
            }
            VitalError::History(HistoryError::Unreadable { path, .. }) => {
                format!(
                    "History file {} is unreadable. Delete it to start a fresh history.",
                    path.display()
                )
            }
            VitalError::Configuration(reason) => {
                format!("Invalid configuration: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Bad input the user can correct
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

/// What a failed command reports: the outermost context first, then the friendly
/// message of the first `VitalError` found in the chain.
#[derive(Debug)]
pub struct FailureReport {
    pub level: tracing::Level,
    pub lines: Vec<String>,
    pub retryable: bool,
}

impl FailureReport {
    pub fn from_error(err: &anyhow::Error) -> Self {
        let Some(vital) = err.chain().find_map(|cause| cause.downcast_ref::<VitalError>()) else {
            return FailureReport {
                level: tracing::Level::ERROR,
                lines: err.chain().map(|cause| cause.to_string()).collect(),
                retryable: false,
            };
        };

        let mut lines = vec![err.to_string()];
        let message = vital.user_message();
        if !lines.contains(&message) {
            lines.push(message);
        }

        FailureReport {
            level: vital.severity().to_tracing_level(),
            lines,
            retryable: vital.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = VitalError::Ingest(IngestError::FileNotFound {
            path: PathBuf::from("/data/wellness.json"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = VitalError::Configuration("retention".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_error_retryable() {
        let err = VitalError::History(HistoryError::WriteFailed {
            path: PathBuf::from("history.json"),
            reason: "disk full".to_string(),
        });
        assert!(err.is_retryable());

        let err = VitalError::Validation("test".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = VitalError::Ingest(IngestError::UnsupportedFormat {
            format: "xml".to_string(),
        });
        assert!(err.user_message().contains("Unsupported data format 'xml'"));
    }

    #[test]
    fn test_failure_report_keeps_context_and_friendly_message() {
        let err = anyhow::Error::from(VitalError::Ingest(IngestError::FileNotFound {
            path: PathBuf::from("days.json"),
        }))
        .context("Failed to load records from days.json");

        let report = FailureReport::from_error(&err);
        assert_eq!(report.level, tracing::Level::WARN);
        assert_eq!(report.lines[0], "Failed to load records from days.json");
        assert_eq!(report.lines[1], "Could not find data file: days.json");
        assert!(!report.retryable);
    }

    #[test]
    fn test_failure_report_without_context() {
        let err = anyhow::Error::from(VitalError::Validation("weeks must be positive".to_string()));
        let report = FailureReport::from_error(&err);
        assert_eq!(report.lines, vec!["Validation error: weeks must be positive".to_string()]);

        let io = std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted");
        let report = FailureReport::from_error(&anyhow::Error::from(VitalError::Io(io)));
        assert!(report.retryable);
        assert_eq!(report.level, tracing::Level::ERROR);
    }

    #[test]
    fn test_failure_report_for_foreign_errors() {
        let err = anyhow::anyhow!("disk on fire").context("Saving report");
        let report = FailureReport::from_error(&err);
        assert_eq!(report.level, tracing::Level::ERROR);
        assert_eq!(report.lines, vec!["Saving report".to_string(), "disk on fire".to_string()]);
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("not = [valid");
        let err: VitalError = parse.unwrap_err().into();
        assert!(matches!(err, VitalError::Configuration(_)));
    }
}
