use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::data::{load_records, InkRecord, PmsRecord};
use crate::models::{DataError, FormulaLine, LabColor, MatchError, PredictionResult};
use crate::services::formula_search::{FormulaSearch, StopSignal};
use crate::services::live_simulator::LiveSimulator;
use crate::services::reference_model::ReferenceModel;

/// Shared, immutable engine state; cheap to clone across requests
#[derive(Clone)]
pub struct AppState {
    pub reference: Arc<ReferenceModel>,
    pub config: Arc<EngineConfig>,
}

impl AppState {
    pub fn new(reference: ReferenceModel, config: EngineConfig) -> Self {
        Self {
            reference: Arc::new(reference),
            config: Arc::new(config),
        }
    }

    /// Load both reference datasets from JSON files
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        pms_path: P,
        dc_path: Q,
        config: EngineConfig,
    ) -> Result<Self, DataError> {
        let pms: Vec<PmsRecord> = load_records(pms_path)?;
        let dc: Vec<InkRecord> = load_records(dc_path)?;
        let reference = ReferenceModel::load(&pms, &dc, &config.reference);
        Ok(Self::new(reference, config))
    }

    pub fn formula_search(&self) -> FormulaSearch<'_> {
        FormulaSearch::new(&self.reference, &self.config.search)
    }

    pub fn simulator(&self) -> LiveSimulator<'_> {
        LiveSimulator::new(&self.reference, &self.config.simulator)
    }

    /// Predict a formula using the configured seed and deadline
    pub fn predict(&self, target: LabColor) -> Result<PredictionResult, MatchError> {
        let mut rng = match self.config.search.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let stop = match self.config.search.deadline_ms {
            Some(ms) => StopSignal::with_timeout(Duration::from_millis(ms)),
            None => StopSignal::never(),
        };
        self.formula_search().predict_until(target, &mut rng, &stop)
    }

    pub fn simulate(
        &self,
        current: LabColor,
        new_lines: &[FormulaLine],
        old_lines: &[FormulaLine],
    ) -> LabColor {
        self.simulator().simulate(current, new_lines, old_lines)
    }
}
