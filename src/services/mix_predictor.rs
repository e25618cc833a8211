//! Ink colour prediction from fitted base pigments
//!
//! Pseudo Kubelka-Munk: the per-pigment K/S lines are summed to get the
//! mix's lightness, a* and b* are weight-averaged, and the result is blended
//! with the substrate by the extender fraction.

use crate::models::{BaseInkModel, LabColor, Xyz};
use crate::services::colour_math::{reflectance_from_ks, xyz_to_lab};

/// Upper bound on the pigment fraction; some carrier is always present
pub const MAX_PIGMENT_FRACTION: f64 = 0.99;

/// Predict the Lab colour of an ink.
///
/// `weights` are the pigment shares (summing to 1 over `bases`) and
/// `pigment_total_percent` is the share of the ink that is pigment; the rest
/// is carrier/extender, which contributes the substrate colour.
pub fn predict_mix(
    bases: &[&BaseInkModel],
    weights: &[f64],
    pigment_total_percent: f64,
    substrate: LabColor,
) -> LabColor {
    let t = (pigment_total_percent / 100.0).clamp(0.0, MAX_PIGMENT_FRACTION);

    let mut ks_sum = 0.0;
    let mut a_accum = 0.0;
    let mut b_accum = 0.0;

    for (model, &w) in bases.iter().zip(weights) {
        // effective concentration fraction in the final ink
        let c = w * t;
        ks_sum += model.ks.eval(c).max(0.0);
        a_accum += w * model.a.eval(c);
        b_accum += w * model.b.eval(c);
    }

    // Mixed K/S -> reflectance -> Y -> L*, on the neutral axis
    let y = reflectance_from_ks(ks_sum) * 100.0;
    let l_from_y = xyz_to_lab(Xyz { x: y, y, z: y }).l;

    LabColor {
        l: t * l_from_y + (1.0 - t) * substrate.l,
        a: t * a_accum + (1.0 - t) * substrate.a,
        b: t * b_accum + (1.0 - t) * substrate.b,
    }
}
