use serde::{Deserialize, Serialize};

use super::LabColor;
use crate::services::linear_fit::LineFit;

/// One measured step of a pigment's concentration ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkReferenceRow {
    pub code: String,
    pub name: String,
    /// Concentration in percent, 0..100
    pub concentration_pct: f64,
    pub lab: LabColor,
}

/// A spot-colour database entry with its pre-validated formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmsEntry {
    pub code: String,
    pub lab: LabColor,
    /// Up to four `(item code, percentage)` pairs
    pub items: Vec<(String, f64)>,
}

/// Fitted concentration -> colour relationship of a single pigment.
///
/// All three fits take the concentration as a fraction in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseInkModel {
    pub code: String,
    pub ks: LineFit,
    pub a: LineFit,
    pub b: LineFit,
    /// True when at least two concentration samples backed the fits
    pub has_fit: bool,
    /// Measured colour at the highest sampled concentration
    pub mass_tone: LabColor,
}

/// One line of an ink formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaLine {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub percentage: f64,
}

impl FormulaLine {
    pub fn new(code: impl Into<String>, name: impl Into<String>, percentage: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            percentage,
        }
    }
}

/// Where a prediction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    SpotMatch,
    MixModel,
}

/// Result of a formula prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub formula: Vec<FormulaLine>,
    pub predicted: LabColor,
    pub delta_e: f64,
    pub source: MatchSource,
    /// Spot code for spot matches, model description otherwise
    pub label: String,
}

/// Search-time state of one weight assignment over a fixed set of bases
#[derive(Debug, Clone)]
pub struct CandidateFormula<'a> {
    pub selected: Vec<&'a BaseInkModel>,
    pub weights: Vec<f64>,
    pub pigment_total_percent: f64,
    pub predicted: LabColor,
    pub delta_e: f64,
}
