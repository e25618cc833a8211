//! Request and response types for callers of the engine.
//!
//! Transport is left to the caller; these handlers take and return plain
//! serde types so they can sit behind any framing.

use serde::{Deserialize, Serialize};

use crate::data::lenient_f64;
use crate::models::{FormulaLine, LabColor, MatchError, PredictionResult};
use crate::services::formula_search::validate_target;
use crate::state::AppState;

/// Lab triple as sent by a caller; fields may be missing or junk
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TargetInput {
    #[serde(rename = "L", default, deserialize_with = "lenient_f64")]
    pub l: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub a: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub b: Option<f64>,
}

impl TargetInput {
    pub fn to_lab(&self) -> Result<LabColor, MatchError> {
        let field = |name: &'static str, value: Option<f64>| {
            value.ok_or_else(|| MatchError::InvalidTarget {
                field: name,
                reason: "is missing or not a number".to_string(),
            })
        };
        let lab = LabColor::new(field("L", self.l)?, field("a", self.a)?, field("b", self.b)?);
        validate_target(lab)
    }
}

impl From<LabColor> for TargetInput {
    fn from(lab: LabColor) -> Self {
        Self {
            l: Some(lab.l),
            a: Some(lab.a),
            b: Some(lab.b),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub predicted_hex: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimulateRequest {
    pub current: TargetInput,
    pub new_formula: Vec<FormulaLine>,
    pub old_formula: Vec<FormulaLine>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpotSummary {
    pub code: String,
    pub lab: LabColor,
    pub hex: String,
    pub formula: Vec<FormulaLine>,
}

/// Find a formula for a target colour
pub fn predict_formula(
    state: &AppState,
    target: &TargetInput,
) -> Result<PredictResponse, MatchError> {
    let target = target.to_lab()?;
    let result = state.predict(target)?;
    tracing::info!(
        source = ?result.source,
        delta_e = result.delta_e,
        lines = result.formula.len(),
        "Formula predicted"
    );
    Ok(PredictResponse {
        predicted_hex: result.predicted.to_hex(),
        result,
    })
}

/// Estimate the colour after an operator edits a formula
pub fn simulate_edit(state: &AppState, request: &SimulateRequest) -> Result<LabColor, MatchError> {
    let current = request.current.to_lab()?;
    Ok(state.simulate(current, &request.new_formula, &request.old_formula))
}

/// Spot colours whose code contains `query`
pub fn search_spot_colours(state: &AppState, query: &str) -> Vec<SpotSummary> {
    state
        .reference
        .search_spot(query)
        .into_iter()
        .map(|entry| SpotSummary {
            code: entry.code.clone(),
            lab: entry.lab,
            hex: entry.lab.to_hex(),
            formula: entry
                .items
                .iter()
                .map(|(code, pct)| {
                    let name = state.reference.ink_name(code).unwrap_or_default();
                    FormulaLine::new(code.clone(), name, *pct)
                })
                .collect(),
        })
        .collect()
}
