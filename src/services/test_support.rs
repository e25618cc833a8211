//! Small synthetic datasets with exactly linear ladders

use crate::config::ReferenceConfig;
use crate::models::{InkReferenceRow, LabColor, PmsEntry, Xyz};
use crate::services::colour_math::{reflectance_from_ks, xyz_to_lab};
use crate::services::reference_model::ReferenceModel;

pub fn row(code: &str, name: &str, conc: f64, l: f64, a: f64, b: f64) -> InkReferenceRow {
    InkReferenceRow {
        code: code.to_string(),
        name: name.to_string(),
        concentration_pct: conc,
        lab: LabColor::new(l, a, b),
    }
}

/// Lightness whose Y reflectance proxy has the given K/S
pub fn lightness_for_ks(ks: f64) -> f64 {
    let y = reflectance_from_ks(ks) * 100.0;
    xyz_to_lab(Xyz { x: y, y, z: y }).l
}

/// Ladder with K/S = ks_slope·c, a* = a_slope·c, b* = b_slope·c
pub fn ladder(
    code: &str,
    name: &str,
    ks_slope: f64,
    a_slope: f64,
    b_slope: f64,
    concs: &[f64],
) -> Vec<InkReferenceRow> {
    concs
        .iter()
        .map(|&pct| {
            let c = pct / 100.0;
            row(
                code,
                name,
                pct,
                lightness_for_ks(ks_slope * c),
                a_slope * c,
                b_slope * c,
            )
        })
        .collect()
}

pub fn synthetic_rows() -> Vec<InkReferenceRow> {
    let steps = [0.0, 25.0, 50.0, 75.0, 100.0];
    let mut rows = vec![row("SUB-000", "White Substrate", 0.0, 96.0, 0.5, -2.0)];
    rows.extend(ladder("DC10-101", "Warm Red", 4.0, 60.0, 20.0, &steps));
    rows.extend(ladder("DC20-201", "Process Blue", 3.0, -10.0, -50.0, &steps));
    rows.extend(ladder("DC30-301", "Lemon Yellow", 0.5, -5.0, 80.0, &steps));
    rows.extend(ladder("DC40-401", "Carbon Black", 20.0, 0.0, 0.0, &steps));
    rows.push(row("DC50-500", "Orange", 100.0, 65.0, 45.0, 70.0));
    rows.push(row("DC21-002", "Extender", 50.0, 97.0, 0.0, 0.0));
    rows.push(row("DC21-002", "Extender", 100.0, 98.0, 0.0, 0.0));
    rows
}

pub fn synthetic_spots() -> Vec<PmsEntry> {
    vec![
        PmsEntry {
            code: "186 C".to_string(),
            lab: LabColor::new(42.1, 64.2, 31.0),
            items: vec![
                ("DC10-101".to_string(), 60.5),
                ("DC21-002".to_string(), 39.5),
            ],
        },
        PmsEntry {
            code: "Cool Gray 5 C".to_string(),
            lab: LabColor::new(70.0, 0.0, -1.0),
            items: vec![
                ("DC40-401".to_string(), 12.0),
                ("DC21-002".to_string(), 88.0),
            ],
        },
    ]
}

pub fn synthetic_reference() -> ReferenceModel {
    ReferenceModel::from_rows(
        synthetic_spots(),
        synthetic_rows(),
        &ReferenceConfig::default(),
    )
}
