//! FA score: composite cardiac/autonomic stability score
//!
//! Starts from 100 and applies deductions and bonuses across four areas, weighted
//! roughly 40% electrolytes, 30% digestion, 20% training load and 10% nervous system.
//! Within one rule only the first matching tier applies; separate rules are independent.
//! The result is clamped to 0-100.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Starting score before adjustments
pub const BASE_SCORE: i32 = 100;

/// Na:K used when potassium is zero
const DEFAULT_NA_K: f64 = 2.0;
/// Ca:Mg used when magnesium is zero
const DEFAULT_CA_MG: f64 = 4.0;

/// Inputs to the score, all for the same day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaScoreInputs {
    /// Sodium (mg)
    pub na: f64,
    /// Potassium (mg)
    pub k: f64,
    /// Calcium (mg)
    pub ca: f64,
    /// Magnesium (mg)
    pub mg: f64,
    /// Taurine (g)
    pub taurine_g: f64,
    /// Nocturnal digestive load
    pub digestive_load: f64,
    /// Training stress of the day
    pub tss: f64,
}

/// Area an adjustment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Electrolytes,
    Digestion,
    TrainingLoad,
    NervousSystem,
}

/// One applied deduction or bonus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreAdjustment {
    pub category: ScoreCategory,
    pub reason: String,
    pub points: i32,
}

/// Score with every adjustment that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Unclamped sum of base and adjustments
    pub raw: i32,
    /// Final score in 0-100
    pub score: u8,
    pub adjustments: Vec<ScoreAdjustment>,
}

/// Score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaScoreBand {
    #[serde(rename = "SEGURO")]
    Seguro,
    #[serde(rename = "ESTABLE")]
    Estable,
    #[serde(rename = "ATENCIÓN")]
    Atencion,
}

impl FaScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 80 => FaScoreBand::Seguro,
            s if s >= 60 => FaScoreBand::Estable,
            _ => FaScoreBand::Atencion,
        }
    }
}

impl fmt::Display for FaScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaScoreBand::Seguro => write!(f, "SEGURO"),
            FaScoreBand::Estable => write!(f, "ESTABLE"),
            FaScoreBand::Atencion => write!(f, "ATENCIÓN"),
        }
    }
}

/// Display information for a score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaScoreLabel {
    pub band: FaScoreBand,
    pub color: &'static str,
    pub message: &'static str,
}

struct Tally {
    total: i32,
    adjustments: Vec<ScoreAdjustment>,
}

impl Tally {
    fn apply(&mut self, category: ScoreCategory, points: i32, reason: String) {
        self.total += points;
        self.adjustments.push(ScoreAdjustment {
            category,
            reason,
            points,
        });
    }
}

fn score_electrolytes(inputs: &FaScoreInputs, tally: &mut Tally) {
    let cat = ScoreCategory::Electrolytes;

    let na_k = if inputs.k == 0.0 {
        DEFAULT_NA_K
    } else {
        inputs.na / inputs.k
    };
    if na_k > 1.3 {
        tally.apply(cat, -15, format!("Na:K {:.2} above 1.3", na_k));
    } else if na_k > 1.0 {
        tally.apply(cat, -8, format!("Na:K {:.2} above 1.0", na_k));
    } else if na_k < 0.3 {
        tally.apply(cat, -5, format!("Na:K {:.2} below 0.3", na_k));
    }

    let ca_mg = if inputs.mg == 0.0 {
        DEFAULT_CA_MG
    } else {
        inputs.ca / inputs.mg
    };
    if ca_mg > 4.0 {
        tally.apply(cat, -10, format!("Ca:Mg {:.2} above 4", ca_mg));
    } else if ca_mg > 3.5 {
        tally.apply(cat, -5, format!("Ca:Mg {:.2} above 3.5", ca_mg));
    }

    if inputs.mg < 400.0 {
        tally.apply(cat, -15, format!("Magnesium {:.0} mg below 400", inputs.mg));
    } else if inputs.mg < 550.0 {
        tally.apply(cat, -5, format!("Magnesium {:.0} mg below 550", inputs.mg));
    }

    if inputs.na < 1700.0 {
        tally.apply(cat, -10, format!("Sodium {:.0} mg below 1700", inputs.na));
    }

    if inputs.k < 3000.0 {
        tally.apply(cat, -10, format!("Potassium {:.0} mg below 3000", inputs.k));
    } else if inputs.k < 3500.0 {
        tally.apply(cat, -3, format!("Potassium {:.0} mg below 3500", inputs.k));
    }
}

fn score_digestion(inputs: &FaScoreInputs, tally: &mut Tally) {
    let cat = ScoreCategory::Digestion;
    let load = inputs.digestive_load;

    if load > 180.0 {
        tally.apply(cat, -15, format!("Digestive load {:.0} above 180", load));
    } else if load > 120.0 {
        tally.apply(cat, -8, format!("Digestive load {:.0} above 120", load));
    } else if load > 80.0 {
        tally.apply(cat, -3, format!("Digestive load {:.0} above 80", load));
    }
}

fn score_training_load(inputs: &FaScoreInputs, tally: &mut Tally) {
    let cat = ScoreCategory::TrainingLoad;

    if inputs.tss > 100.0 {
        tally.apply(cat, -5, format!("TSS {:.0} above 100", inputs.tss));
    } else if inputs.tss > 60.0 {
        tally.apply(cat, -2, format!("TSS {:.0} above 60", inputs.tss));
    }
}

fn score_nervous_system(inputs: &FaScoreInputs, tally: &mut Tally) {
    let cat = ScoreCategory::NervousSystem;
    let taurine = inputs.taurine_g;

    if (0.5..=2.5).contains(&taurine) {
        tally.apply(cat, 5, format!("Taurine {:.1} g in 0.5-2.5 g", taurine));
    } else if taurine > 3.0 {
        tally.apply(cat, -5, format!("Taurine {:.1} g above 3 g", taurine));
    }

    // Independent of the magnesium deficit tiers above
    if inputs.mg >= 750.0 {
        tally.apply(cat, 3, format!("Magnesium {:.0} mg at or above 750", inputs.mg));
    }
}

/// Compute the score along with every adjustment that was applied
pub fn fa_score_breakdown(inputs: &FaScoreInputs) -> ScoreBreakdown {
    let mut tally = Tally {
        total: BASE_SCORE,
        adjustments: Vec::new(),
    };

    score_electrolytes(inputs, &mut tally);
    score_digestion(inputs, &mut tally);
    score_training_load(inputs, &mut tally);
    score_nervous_system(inputs, &mut tally);

    let score = tally.total.clamp(0, 100) as u8;
    tracing::debug!(
        raw = tally.total,
        score,
        adjustments = tally.adjustments.len(),
        "FA score computed"
    );

    ScoreBreakdown {
        raw: tally.total,
        score,
        adjustments: tally.adjustments,
    }
}

/// FA score in 0-100
pub fn fa_score(inputs: &FaScoreInputs) -> u8 {
    fa_score_breakdown(inputs).score
}

/// Band, color and message for a score
pub fn fa_score_label(score: u8) -> FaScoreLabel {
    let band = FaScoreBand::from_score(score);
    let (color, message) = match band {
        FaScoreBand::Seguro => ("green", "Sistema cardíaco estable. Buen equilibrio mineral y carga controlada."),
        FaScoreBand::Estable => ("amber", "Estabilidad aceptable. Revisa electrolitos y la cena."),
        FaScoreBand::Atencion => ("rose", "Riesgo de inestabilidad. Prioriza minerales, cena ligera y descanso."),
    };

    FaScoreLabel {
        band,
        color,
        message,
    }
}
