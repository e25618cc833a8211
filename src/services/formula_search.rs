//! Formula search for a target Lab colour
//!
//! 1. Spot shortcut: a close enough spot-colour entry is returned as-is.
//! 2. Otherwise the ranked pigment pool is mixed with an increasing number of
//!    pigments and several pigment loadings, each trial running a greedy
//!    stochastic hill-climb over the pigment weights.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::SearchConfig;
use crate::models::{
    BaseInkModel, CandidateFormula, FormulaLine, LabColor, MatchError, MatchSource,
    PredictionResult,
};
use crate::services::colour_math::delta_e_2000;
use crate::services::mix_predictor::predict_mix;
use crate::services::reference_model::ReferenceModel;

pub const MIX_MODEL_LABEL: &str = "Mix model (pseudo K/S)";
pub const SUBSTRATE_LABEL: &str = "Substrate only";

/// Hill-climb iterations between stop signal checks
const STOP_CHECK_INTERVAL: usize = 64;

/// External deadline and cancellation for a running search
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl StopSignal {
    pub fn never() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancelled: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn should_stop(&self) -> bool {
        self.cancelled
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
            || self.deadline.map_or(false, |d| Instant::now() >= d)
    }
}

/// Reject targets without a meaningful prediction
pub fn validate_target(target: LabColor) -> Result<LabColor, MatchError> {
    for (field, value) in [("L", target.l), ("a", target.a), ("b", target.b)] {
        if !value.is_finite() {
            return Err(MatchError::InvalidTarget {
                field,
                reason: format!("must be a finite number, got {value}"),
            });
        }
    }
    Ok(target)
}

/// Formula search over one reference model
pub struct FormulaSearch<'a> {
    reference: &'a ReferenceModel,
    config: &'a SearchConfig,
}

impl<'a> FormulaSearch<'a> {
    pub fn new(reference: &'a ReferenceModel, config: &'a SearchConfig) -> Self {
        Self { reference, config }
    }

    /// Predict a formula for `target`, running the search to completion
    pub fn predict<R: Rng + ?Sized>(
        &self,
        target: LabColor,
        rng: &mut R,
    ) -> Result<PredictionResult, MatchError> {
        self.predict_until(target, rng, &StopSignal::never())
    }

    /// Predict a formula for `target`, returning the best result found so
    /// far once `stop` fires
    pub fn predict_until<R: Rng + ?Sized>(
        &self,
        target: LabColor,
        rng: &mut R,
        stop: &StopSignal,
    ) -> Result<PredictionResult, MatchError> {
        let target = validate_target(target)?;

        if let Some(result) = self.spot_shortcut(target) {
            return Ok(result);
        }
        Ok(self.search_mix(target, rng, stop))
    }

    /// The nearest spot entry's own formula, if it is within the spot threshold
    pub fn spot_shortcut(&self, target: LabColor) -> Option<PredictionResult> {
        let (entry, delta_e) = self.reference.find_exact_spot_match(target)?;
        if !delta_e.is_finite() || delta_e > self.config.spot_match_threshold {
            return None;
        }
        tracing::debug!(spot = %entry.code, delta_e, "Spot colour shortcut");

        let formula = entry
            .items
            .iter()
            .map(|(code, pct)| {
                let name = self.reference.ink_name(code).unwrap_or_default();
                FormulaLine::new(code.clone(), name, *pct)
            })
            .collect();

        Some(PredictionResult {
            formula,
            predicted: entry.lab,
            delta_e,
            source: MatchSource::SpotMatch,
            label: entry.code.clone(),
        })
    }

    /// Mixing search over the ranked candidate pool
    pub fn search_mix<R: Rng + ?Sized>(
        &self,
        target: LabColor,
        rng: &mut R,
        stop: &StopSignal,
    ) -> PredictionResult {
        let pool: Vec<&BaseInkModel> = self
            .reference
            .ranked_candidates(target)
            .into_iter()
            .take(self.config.pool_size)
            .map(|c| c.model)
            .collect();

        let mut best: Option<CandidateFormula<'_>> = None;
        let mut last_count = 0;

        'counts: for count in self.config.min_pigments..=self.config.max_pigments {
            let count = count.max(1).min(pool.len());
            // a smaller pool repeats the same set for every larger count
            if count == 0 || count == last_count {
                break;
            }
            last_count = count;
            let chosen = &pool[..count];

            for &total in &self.config.pigment_totals {
                if stop.should_stop() {
                    tracing::warn!(count, total, "Formula search stopped early");
                    break 'counts;
                }

                let trial = self.optimise_weights(target, chosen, total, rng, stop);
                tracing::debug!(count, total, delta_e = trial.delta_e, "Mix trial finished");

                let trial_de = trial.delta_e;
                if best.as_ref().map_or(true, |b| trial_de < b.delta_e) {
                    best = Some(trial);
                }
                if trial_de <= self.config.perfect_match_threshold {
                    tracing::debug!(count, total, delta_e = trial_de, "Perfect match found");
                    break 'counts;
                }
            }
        }

        match best {
            Some(best) => PredictionResult {
                formula: self.assemble_formula(&best),
                predicted: best.predicted,
                delta_e: best.delta_e,
                source: MatchSource::MixModel,
                label: MIX_MODEL_LABEL.to_string(),
            },
            None => self.substrate_fallback(target),
        }
    }

    /// Greedy stochastic hill-climb over the weights of a fixed pigment set
    pub fn optimise_weights<'m, R: Rng + ?Sized>(
        &self,
        target: LabColor,
        bases: &[&'m BaseInkModel],
        pigment_total_percent: f64,
        rng: &mut R,
        stop: &StopSignal,
    ) -> CandidateFormula<'m> {
        let substrate = self.reference.substrate();
        let n = bases.len().max(1);
        let mut weights = vec![1.0 / n as f64; bases.len()];
        let mut predicted = predict_mix(bases, &weights, pigment_total_percent, substrate);
        let mut best_de = delta_e_2000(target, predicted);
        if !best_de.is_finite() {
            best_de = f64::INFINITY;
        }

        let step = self.config.step;
        for i in 0..self.config.iterations {
            if best_de < self.config.perfect_match_threshold {
                break;
            }
            if i % STOP_CHECK_INTERVAL == 0 && stop.should_stop() {
                break;
            }

            let mut proposal: Vec<f64> = weights
                .iter()
                .map(|w| (w + (rng.gen::<f64>() - 0.5) * step).max(0.0))
                .collect();
            let sum: f64 = proposal.iter().sum();
            if sum <= 0.0 {
                continue;
            }
            for w in proposal.iter_mut() {
                *w /= sum;
            }

            let candidate = predict_mix(bases, &proposal, pigment_total_percent, substrate);
            let de = delta_e_2000(target, candidate);
            if de.is_finite() && de < best_de {
                best_de = de;
                weights = proposal;
                predicted = candidate;
            }
        }

        CandidateFormula {
            selected: bases.to_vec(),
            weights,
            pigment_total_percent,
            predicted,
            delta_e: best_de,
        }
    }

    /// Turn winning weights into formula lines summing to 100%.
    ///
    /// Lines under the noise floor are dropped and their share is spread
    /// proportionally over the remaining pigments.
    fn assemble_formula(&self, best: &CandidateFormula<'_>) -> Vec<FormulaLine> {
        let total = best.pigment_total_percent;

        let mut merged: Vec<(&str, f64)> = Vec::with_capacity(best.selected.len());
        for (model, w) in best.selected.iter().zip(&best.weights) {
            let pct = w * total;
            match merged.iter_mut().find(|(code, _)| *code == model.code) {
                Some(entry) => entry.1 += pct,
                None => merged.push((model.code.as_str(), pct)),
            }
        }

        merged.retain(|(_, pct)| *pct >= self.config.min_line_percent);
        let kept: f64 = merged.iter().map(|(_, pct)| pct).sum();
        let scale = if kept > 0.0 { total / kept } else { 1.0 };

        let mut formula: Vec<FormulaLine> = merged
            .into_iter()
            .map(|(code, pct)| {
                let name = self.reference.ink_name(code).unwrap_or_default();
                FormulaLine::new(code, name, round2(pct * scale))
            })
            .collect();

        formula.push(FormulaLine::new(
            self.reference.extender_code(),
            self.reference.extender_name(),
            round2(100.0 - total),
        ));
        formula
    }

    fn substrate_fallback(&self, target: LabColor) -> PredictionResult {
        let substrate = self.reference.substrate();
        let delta_e = delta_e_2000(target, substrate);
        tracing::warn!(delta_e, "No viable pigment candidates, returning substrate");

        PredictionResult {
            formula: vec![FormulaLine::new(
                self.reference.extender_code(),
                self.reference.extender_name(),
                100.0,
            )],
            predicted: substrate,
            delta_e,
            source: MatchSource::MixModel,
            label: SUBSTRATE_LABEL.to_string(),
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
