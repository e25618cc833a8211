//! Reference ink model built from the spot-colour and concentration ladder datasets
//!
//! Each pigment's ladder is regressed against concentration to give a
//! pseudo K/S line (via the Y reflectance proxy) plus a* and b* lines.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::config::ReferenceConfig;
use crate::data::{is_white_substrate, InkRecord, PmsRecord};
use crate::models::{BaseInkModel, InkReferenceRow, LabColor, PmsEntry};
use crate::services::colour_math::{delta_e_2000, ks_from_reflectance, reflectance_from_lab};
use crate::services::linear_fit::fit_linear;

/// A pigment ranked by how close its mass tone is to a target
#[derive(Debug, Clone, Copy)]
pub struct RankedCandidate<'a> {
    pub model: &'a BaseInkModel,
    pub delta_e: f64,
}

/// Load-once, read-only view of both reference datasets and the fitted pigment models
#[derive(Debug, Clone)]
pub struct ReferenceModel {
    rows: Vec<InkReferenceRow>,
    models: BTreeMap<String, BaseInkModel>,
    spots: Vec<PmsEntry>,
    substrate: LabColor,
    extender_code: String,
    extender_name: String,
}

impl ReferenceModel {
    /// Build from raw dataset records, dropping rows that fail to parse
    pub fn load(pms_rows: &[PmsRecord], dc_rows: &[InkRecord], config: &ReferenceConfig) -> Self {
        let spots: Vec<PmsEntry> = pms_rows.iter().filter_map(PmsRecord::to_entry).collect();
        let rows: Vec<InkReferenceRow> = dc_rows.iter().filter_map(InkRecord::to_row).collect();

        let skipped_spots = pms_rows.len() - spots.len();
        let skipped_rows = dc_rows.len() - rows.len();
        if skipped_spots > 0 || skipped_rows > 0 {
            tracing::debug!(skipped_spots, skipped_rows, "Skipped malformed reference rows");
        }

        Self::from_rows(spots, rows, config)
    }

    /// Build from already typed rows
    pub fn from_rows(
        spots: Vec<PmsEntry>,
        rows: Vec<InkReferenceRow>,
        config: &ReferenceConfig,
    ) -> Self {
        let mut substrate = config.default_substrate;
        let mut pigment_rows = Vec::with_capacity(rows.len());
        for row in rows {
            if is_white_substrate(&row.code) || is_white_substrate(&row.name) {
                substrate = row.lab;
                continue;
            }
            pigment_rows.push(row);
        }

        let extender = config.extender_code.to_uppercase();
        let mut groups: BTreeMap<&str, Vec<&InkReferenceRow>> = BTreeMap::new();
        for row in &pigment_rows {
            if row.code.to_uppercase().contains(&extender) {
                continue;
            }
            groups.entry(row.code.as_str()).or_default().push(row);
        }

        let models: BTreeMap<String, BaseInkModel> = groups
            .into_par_iter()
            .map(|(code, rows)| (code.to_string(), fit_base(code, rows)))
            .collect();

        let fitted = models.values().filter(|m| m.has_fit).count();
        for model in models.values().filter(|m| !m.has_fit) {
            tracing::debug!(
                code = %model.code,
                "Pigment has a single ladder step, excluded from mixing"
            );
        }
        tracing::info!(
            pigments = models.len(),
            fitted,
            spots = spots.len(),
            "Reference model loaded"
        );

        Self {
            rows: pigment_rows,
            models,
            spots,
            substrate,
            extender_code: config.extender_code.clone(),
            extender_name: config.extender_name.clone(),
        }
    }

    pub fn substrate(&self) -> LabColor {
        self.substrate
    }

    pub fn extender_code(&self) -> &str {
        &self.extender_code
    }

    pub fn extender_name(&self) -> &str {
        &self.extender_name
    }

    pub fn spots(&self) -> &[PmsEntry] {
        &self.spots
    }

    pub fn model(&self, code: &str) -> Option<&BaseInkModel> {
        self.models.get(code)
    }

    /// All pigment models, fitted or not, ordered by code
    pub fn models(&self) -> impl Iterator<Item = &BaseInkModel> {
        self.models.values()
    }

    pub fn is_extender(&self, code: &str) -> bool {
        code.to_uppercase()
            .contains(&self.extender_code.to_uppercase())
    }

    /// Human readable name of an ink code, if the ladder dataset has one
    pub fn ink_name(&self, code: &str) -> Option<&str> {
        let code = code.trim();
        self.rows
            .iter()
            .find(|r| r.code.eq_ignore_ascii_case(code) && !r.name.is_empty())
            .map(|r| r.name.as_str())
    }

    /// Representative reference row for a formula line key.
    ///
    /// The key may be the ink code, the ink name or "code name". The first
    /// pigment matching wins; its 100% row is preferred, otherwise its highest
    /// sampled concentration.
    pub fn pigment_reference(&self, key: &str) -> Option<&InkReferenceRow> {
        let key = key.trim().to_uppercase();
        if key.is_empty() {
            return None;
        }
        let hit = self.rows.iter().find(|r| {
            let code = r.code.to_uppercase();
            let name = r.name.to_uppercase();
            key == code || (!name.is_empty() && key == name) || key == format!("{code} {name}")
        })?;

        let ladder = self.rows.iter().filter(|r| r.code == hit.code);
        ladder
            .clone()
            .find(|r| r.concentration_pct == 100.0)
            .or_else(|| ladder.max_by(|a, b| a.concentration_pct.total_cmp(&b.concentration_pct)))
    }

    /// Fitted pigments ordered by ΔE00 between the target and their mass tone
    pub fn ranked_candidates(&self, target: LabColor) -> Vec<RankedCandidate<'_>> {
        let mut ranked: Vec<RankedCandidate<'_>> = self
            .models
            .par_iter()
            .filter(|(_, m)| m.has_fit)
            .map(|(_, model)| RankedCandidate {
                model,
                delta_e: delta_e_2000(target, model.mass_tone),
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.delta_e
                .total_cmp(&b.delta_e)
                .then_with(|| a.model.code.cmp(&b.model.code))
        });
        ranked
    }

    /// Closest spot colour by ΔE00, first entry wins ties
    pub fn find_exact_spot_match(&self, target: LabColor) -> Option<(&PmsEntry, f64)> {
        let mut best: Option<(&PmsEntry, f64)> = None;
        for entry in &self.spots {
            let de = delta_e_2000(target, entry.lab);
            if !de.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, min)| de < min) {
                best = Some((entry, de));
            }
        }
        best
    }

    /// Spot entries whose code contains `query`, case-insensitive
    pub fn search_spot(&self, query: &str) -> Vec<&PmsEntry> {
        let query = query.trim().to_lowercase();
        self.spots
            .iter()
            .filter(|p| p.code.to_lowercase().contains(&query))
            .collect()
    }
}

fn fit_base(code: &str, mut rows: Vec<&InkReferenceRow>) -> BaseInkModel {
    rows.sort_by(|p, q| p.concentration_pct.total_cmp(&q.concentration_pct));

    let xs: Vec<f64> = rows.iter().map(|r| r.concentration_pct / 100.0).collect();
    let ks: Vec<f64> = rows
        .iter()
        .map(|r| ks_from_reflectance(reflectance_from_lab(r.lab)))
        .collect();
    let a: Vec<f64> = rows.iter().map(|r| r.lab.a).collect();
    let b: Vec<f64> = rows.iter().map(|r| r.lab.b).collect();

    BaseInkModel {
        code: code.to_string(),
        ks: fit_linear(&xs, &ks),
        a: fit_linear(&xs, &a),
        b: fit_linear(&xs, &b),
        has_fit: xs.len() >= 2,
        // first row at the top concentration; groups are never empty
        mass_tone: rows
            .iter()
            .copied()
            .reduce(|best, r| {
                if r.concentration_pct > best.concentration_pct {
                    r
                } else {
                    best
                }
            })
            .map_or(LabColor::NEUTRAL, |r| r.lab),
    }
}
