//! Single-activity performance classification
//!
//! Turns the summary metrics of one ride (variability index, intensity factor,
//! aerobic decoupling and power) into pacing, zone, coupling and efficiency labels,
//! plus a short list of recommendations.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitalError};

/// Summary metrics of one activity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    /// Variability index (NP / average power)
    pub variability_index: f64,
    /// Intensity factor (NP / FTP)
    pub intensity_factor: f64,
    /// Aerobic decoupling in percent
    pub decoupling_pct: f64,
    /// Average power in watts
    pub avg_power: f64,
    /// Normalized power in watts
    pub normalized_power: f64,
}

impl ActivityMetrics {
    /// Reject values no recorded activity can produce. Decoupling may be negative.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("variability_index", self.variability_index, false),
            ("intensity_factor", self.intensity_factor, false),
            ("decoupling_pct", self.decoupling_pct, true),
            ("avg_power", self.avg_power, false),
            ("normalized_power", self.normalized_power, false),
        ];

        for (name, value, may_be_negative) in fields {
            if !value.is_finite() {
                return Err(VitalError::Validation(format!("{} must be a finite number", name)));
            }
            if !may_be_negative && value < 0.0 {
                return Err(VitalError::Validation(format!(
                    "{} cannot be negative (got {})",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pacing {
    VeryStable,
    Stable,
    Moderate,
    Variable,
    VeryVariable,
}

impl Pacing {
    pub fn from_vi(vi: f64) -> Self {
        if vi <= 1.05 {
            Pacing::VeryStable
        } else if vi <= 1.15 {
            Pacing::Stable
        } else if vi <= 1.25 {
            Pacing::Moderate
        } else if vi > 1.35 {
            Pacing::VeryVariable
        } else {
            Pacing::Variable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pacing::VeryStable => "Very Stable",
            Pacing::Stable => "Stable",
            Pacing::Moderate => "Moderate",
            Pacing::Variable => "Variable",
            Pacing::VeryVariable => "Very Variable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntensityZone {
    Aerobic,
    Tempo,
    Threshold,
    Vo2Max,
    Neuromuscular,
}

impl IntensityZone {
    pub fn from_if(intensity_factor: f64) -> Self {
        match intensity_factor {
            v if v >= 1.05 => IntensityZone::Neuromuscular,
            v if v >= 0.95 => IntensityZone::Vo2Max,
            v if v >= 0.85 => IntensityZone::Threshold,
            v if v >= 0.70 => IntensityZone::Tempo,
            _ => IntensityZone::Aerobic,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IntensityZone::Aerobic => "Aerobic",
            IntensityZone::Tempo => "Tempo",
            IntensityZone::Threshold => "Threshold",
            IntensityZone::Vo2Max => "VO2max",
            IntensityZone::Neuromuscular => "Neuromuscular",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coupling {
    Excellent,
    Good,
    Acceptable,
    Moderate,
    HighDeterioration,
}

impl Coupling {
    pub fn from_decoupling(pct: f64) -> Self {
        match pct {
            v if v > 12.0 => Coupling::HighDeterioration,
            v if v > 8.0 => Coupling::Moderate,
            v if v > 5.0 => Coupling::Acceptable,
            v if v > 2.0 => Coupling::Good,
            _ => Coupling::Excellent,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Coupling::Excellent => "Excellent",
            Coupling::Good => "Good",
            Coupling::Acceptable => "Acceptable",
            Coupling::Moderate => "Moderate",
            Coupling::HighDeterioration => "High Deterioration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Efficiency {
    VeryEfficient,
    Efficient,
    Moderate,
    Low,
}

impl Efficiency {
    /// Classify from average and normalized power; `None` unless both are positive
    pub fn from_power(avg_power: f64, normalized_power: f64) -> Option<Self> {
        if avg_power <= 0.0 || normalized_power <= 0.0 {
            return None;
        }
        let ratio = avg_power / normalized_power;
        Some(match ratio {
            r if r >= 0.95 => Efficiency::VeryEfficient,
            r if r >= 0.90 => Efficiency::Efficient,
            r if r >= 0.85 => Efficiency::Moderate,
            _ => Efficiency::Low,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Efficiency::VeryEfficient => "Very Efficient",
            Efficiency::Efficient => "Efficient",
            Efficiency::Moderate => "Moderate",
            Efficiency::Low => "Low Efficiency",
        }
    }
}

/// Recommendation flags, in the order they are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    SmoothPacing,
    BuildAerobicBase,
    HighIntensityVariable,
    GoodExecution,
}

impl Recommendation {
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::SmoothPacing => {
                "Pacing was very uneven - aim for steadier power to reduce fatigue cost"
            }
            Recommendation::BuildAerobicBase => {
                "Heart rate drifted against power - more aerobic base work and fueling needed"
            }
            Recommendation::HighIntensityVariable => {
                "High intensity with variable pacing - plan extra recovery after this session"
            }
            Recommendation::GoodExecution => "Good execution - pacing and durability on target",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityClassification {
    pub pacing: Pacing,
    pub zone: IntensityZone,
    pub coupling: Coupling,
    pub efficiency: Option<Efficiency>,
    pub recommendations: Vec<Recommendation>,
}

/// Classify one activity
pub fn classify_activity(metrics: &ActivityMetrics) -> ActivityClassification {
    let vi = metrics.variability_index;
    let mut recommendations = Vec::new();

    if vi > 1.3 {
        recommendations.push(Recommendation::SmoothPacing);
    }
    if metrics.decoupling_pct > 8.0 {
        recommendations.push(Recommendation::BuildAerobicBase);
    }
    if metrics.intensity_factor > 1.0 && vi > 1.2 {
        recommendations.push(Recommendation::HighIntensityVariable);
    }
    if recommendations.is_empty() {
        recommendations.push(Recommendation::GoodExecution);
    }

    ActivityClassification {
        pacing: Pacing::from_vi(vi),
        zone: IntensityZone::from_if(metrics.intensity_factor),
        coupling: Coupling::from_decoupling(metrics.decoupling_pct),
        efficiency: Efficiency::from_power(metrics.avg_power, metrics.normalized_power),
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_ride() -> ActivityMetrics {
        ActivityMetrics {
            variability_index: 1.03,
            intensity_factor: 0.72,
            decoupling_pct: 3.0,
            avg_power: 200.0,
            normalized_power: 206.0,
        }
    }

    #[test]
    fn test_metric_validation() {
        assert!(steady_ride().validate().is_ok());

        let negative_decoupling = ActivityMetrics {
            decoupling_pct: -2.5,
            ..steady_ride()
        };
        assert!(negative_decoupling.validate().is_ok());

        let negative_power = ActivityMetrics {
            avg_power: -10.0,
            ..steady_ride()
        };
        let err = negative_power.validate().unwrap_err();
        assert!(matches!(err, VitalError::Validation(ref msg) if msg.contains("avg_power")));
        assert_eq!(err.severity(), crate::error::ErrorSeverity::Warning);

        let nan_if = ActivityMetrics {
            intensity_factor: f64::NAN,
            ..steady_ride()
        };
        assert!(nan_if.validate().is_err());
    }

    #[test]
    fn test_pacing_bands() {
        assert_eq!(Pacing::from_vi(1.05), Pacing::VeryStable);
        assert_eq!(Pacing::from_vi(1.10), Pacing::Stable);
        assert_eq!(Pacing::from_vi(1.25), Pacing::Moderate);
        assert_eq!(Pacing::from_vi(1.30), Pacing::Variable);
        assert_eq!(Pacing::from_vi(1.35), Pacing::Variable);
        assert_eq!(Pacing::from_vi(1.36), Pacing::VeryVariable);
    }

    #[test]
    fn test_zone_bands() {
        assert_eq!(IntensityZone::from_if(1.05), IntensityZone::Neuromuscular);
        assert_eq!(IntensityZone::from_if(0.95), IntensityZone::Vo2Max);
        assert_eq!(IntensityZone::from_if(0.90), IntensityZone::Threshold);
        assert_eq!(IntensityZone::from_if(0.70), IntensityZone::Tempo);
        assert_eq!(IntensityZone::from_if(0.69), IntensityZone::Aerobic);
    }

    #[test]
    fn test_coupling_bands() {
        assert_eq!(Coupling::from_decoupling(12.5), Coupling::HighDeterioration);
        assert_eq!(Coupling::from_decoupling(12.0), Coupling::Moderate);
        assert_eq!(Coupling::from_decoupling(6.0), Coupling::Acceptable);
        assert_eq!(Coupling::from_decoupling(2.5), Coupling::Good);
        assert_eq!(Coupling::from_decoupling(2.0), Coupling::Excellent);
    }

    #[test]
    fn test_efficiency_requires_power() {
        assert_eq!(Efficiency::from_power(0.0, 200.0), None);
        assert_eq!(Efficiency::from_power(200.0, 0.0), None);
        assert_eq!(Efficiency::from_power(190.0, 200.0), Some(Efficiency::VeryEfficient));
        assert_eq!(Efficiency::from_power(180.0, 200.0), Some(Efficiency::Efficient));
        assert_eq!(Efficiency::from_power(170.0, 200.0), Some(Efficiency::Moderate));
        assert_eq!(Efficiency::from_power(150.0, 200.0), Some(Efficiency::Low));
    }

    #[test]
    fn test_steady_ride_is_good_execution() {
        let result = classify_activity(&steady_ride());
        assert_eq!(result.pacing, Pacing::VeryStable);
        assert_eq!(result.zone, IntensityZone::Tempo);
        assert_eq!(result.coupling, Coupling::Good);
        assert_eq!(result.efficiency, Some(Efficiency::VeryEfficient));
        assert_eq!(result.recommendations, vec![Recommendation::GoodExecution]);
    }

    #[test]
    fn test_recommendations_in_order() {
        let metrics = ActivityMetrics {
            variability_index: 1.4,
            intensity_factor: 1.02,
            decoupling_pct: 9.0,
            ..steady_ride()
        };
        let result = classify_activity(&metrics);
        assert_eq!(
            result.recommendations,
            vec![
                Recommendation::SmoothPacing,
                Recommendation::BuildAerobicBase,
                Recommendation::HighIntensityVariable,
            ]
        );
        assert_eq!(result.pacing.label(), "Very Variable");
    }

    #[test]
    fn test_intensity_flag_without_pacing_flag() {
        let metrics = ActivityMetrics {
            variability_index: 1.22,
            intensity_factor: 1.01,
            ..steady_ride()
        };
        let result = classify_activity(&metrics);
        assert_eq!(result.recommendations, vec![Recommendation::HighIntensityVariable]);
    }
}
