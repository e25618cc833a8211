//! First-order colour shift estimate for live formula edits
//!
//! Each changed line nudges the current prediction towards (or away from)
//! its pigment's reference colour, scaled by the change, a per-family
//! tinting strength and the pigment's chroma. Extender lines dilute towards
//! the carrier colour instead. No optimisation is re-run.

use crate::config::SimulatorConfig;
use crate::models::{FormulaLine, LabColor};
use crate::services::reference_model::ReferenceModel;

pub struct LiveSimulator<'a> {
    reference: &'a ReferenceModel,
    config: &'a SimulatorConfig,
}

impl<'a> LiveSimulator<'a> {
    pub fn new(reference: &'a ReferenceModel, config: &'a SimulatorConfig) -> Self {
        Self { reference, config }
    }

    /// Tinting strength of the first family found in `name`
    pub fn family_strength(&self, name: &str) -> f64 {
        let name = name.to_uppercase();
        self.config
            .strengths
            .iter()
            .find(|f| name.contains(&f.family.to_uppercase()))
            .map_or(self.config.default_strength, |f| f.strength)
    }

    /// Estimate the colour after editing `old_lines` into `new_lines`.
    ///
    /// Lines are matched by code; a line missing on one side counts as 0%.
    pub fn simulate(
        &self,
        current: LabColor,
        new_lines: &[FormulaLine],
        old_lines: &[FormulaLine],
    ) -> LabColor {
        let percentage_in = |lines: &[FormulaLine], code: &str| {
            lines
                .iter()
                .find(|l| l.code.trim() == code.trim())
                .map_or(0.0, |l| l.percentage)
        };

        let added_or_edited = new_lines
            .iter()
            .map(|line| (line, line.percentage - percentage_in(old_lines, &line.code)));
        let removed = old_lines
            .iter()
            .filter(|old| !new_lines.iter().any(|l| l.code.trim() == old.code.trim()))
            .map(|line| (line, -line.percentage));

        let (mut dl, mut da, mut db) = (0.0, 0.0, 0.0);
        for (line, diff) in added_or_edited.chain(removed) {
            if diff == 0.0 || !diff.is_finite() {
                continue;
            }
            let (sl, sa, sb) = self.line_shift(current, line, diff);
            dl += sl;
            da += sa;
            db += sb;
        }

        LabColor {
            l: current.l + dl,
            a: current.a + da,
            b: current.b + db,
        }
    }

    fn line_shift(&self, current: LabColor, line: &FormulaLine, diff: f64) -> (f64, f64, f64) {
        let reference = self
            .reference
            .pigment_reference(&line.code)
            .or_else(|| self.reference.pigment_reference(&line.name));

        let mut family = reference.map_or(line.name.as_str(), |r| r.name.as_str());
        let extender = self.reference.is_extender(&line.code)
            || family.to_uppercase().contains("EXTENDER");
        if extender && family.is_empty() {
            family = self.reference.extender_name();
        }

        let factor = (diff / 100.0) * self.config.sensitivity * self.family_strength(family);

        if extender {
            let carrier = self.config.carrier;
            return (
                (carrier.l - current.l) * factor,
                (carrier.a - current.a) * factor,
                (carrier.b - current.b) * factor,
            );
        }

        let colour = match reference {
            Some(r) => r.lab,
            None => {
                tracing::warn!(code = %line.code, "No reference colour for formula line");
                LabColor::NEUTRAL
            }
        };
        let factor = factor * (1.0 + colour.chroma() / self.config.chroma_scale);

        (
            (colour.l - self.config.neutral_lightness) * factor,
            colour.a * factor,
            colour.b * factor,
        )
    }
}
