//! Colour space conversions and the CIEDE2000 colour difference
//!
//! Lab <-> XYZ use the CIE piecewise transfer function against the
//! (95.047, 100, 108.883) reference white. Reflectance <-> K/S use the
//! single-constant Kubelka-Munk relation.

use std::f64::consts::PI;

use crate::models::{LabColor, Xyz};

pub const WHITE_X: f64 = 95.047;
pub const WHITE_Y: f64 = 100.0;
pub const WHITE_Z: f64 = 108.883;

/// Reflectance bounds keeping K/S finite in both directions
pub const MIN_REFLECTANCE: f64 = 0.001;
pub const MAX_REFLECTANCE: f64 = 0.999;

const DELTA: f64 = 6.0 / 29.0;

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

#[inline]
fn lab_f_inv(t: f64) -> f64 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

pub fn lab_to_xyz(lab: LabColor) -> Xyz {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = lab.a / 500.0 + fy;
    let fz = fy - lab.b / 200.0;

    Xyz {
        x: WHITE_X * lab_f_inv(fx),
        y: WHITE_Y * lab_f_inv(fy),
        z: WHITE_Z * lab_f_inv(fz),
    }
}

pub fn xyz_to_lab(xyz: Xyz) -> LabColor {
    let fx = lab_f(xyz.x / WHITE_X);
    let fy = lab_f(xyz.y / WHITE_Y);
    let fz = lab_f(xyz.z / WHITE_Z);

    LabColor {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Treat the Y tristimulus value as a relative reflectance proxy
pub fn reflectance_from_lab(lab: LabColor) -> f64 {
    let y = lab_to_xyz(lab).y / 100.0;
    y.clamp(MIN_REFLECTANCE, MAX_REFLECTANCE)
}

/// Convert reflectance R to Kubelka-Munk K/S ratio
/// Formula: K/S = (1 - R)² / (2R)
#[inline]
pub fn ks_from_reflectance(r: f64) -> f64 {
    (1.0 - r).powi(2) / (2.0 * r)
}

/// Convert Kubelka-Munk K/S ratio back to reflectance R
/// Formula: R = 1 + K/S - √(K/S² + 2·K/S)
#[inline]
pub fn reflectance_from_ks(ks: f64) -> f64 {
    let term = 1.0 + ks.max(0.0);
    let disc = (term * term - 1.0).max(0.0);
    // Same root as term - sqrt(disc), without the cancellation for large K/S
    let r = 1.0 / (term + disc.sqrt());
    r.clamp(MIN_REFLECTANCE, MAX_REFLECTANCE)
}

/// Hue angle in degrees, normalised to [0, 360)
fn hue_angle(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        return 0.0;
    }
    let h = b.atan2(a).to_degrees();
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// CIEDE2000 colour difference with unit parametric factors
pub fn delta_e_2000(c1: LabColor, c2: LabColor) -> f64 {
    let avg_l = (c1.l + c2.l) / 2.0;

    let avg_c = (c1.chroma() + c2.chroma()) / 2.0;
    let g = 0.5 * (1.0 - chroma_weight(avg_c).sqrt());

    let a1p = (1.0 + g) * c1.a;
    let a2p = (1.0 + g) * c2.a;
    let c1p = a1p.hypot(c1.b);
    let c2p = a2p.hypot(c2.b);
    let avg_cp = (c1p + c2p) / 2.0;

    let h1p = hue_angle(a1p, c1.b);
    let h2p = hue_angle(a2p, c2.b);

    let delta_lp = c2.l - c1.l;
    let delta_cp = c2p - c1p;

    let chroma_product = c1p * c2p;
    let delta_hp = if chroma_product == 0.0 {
        0.0
    } else {
        let dh = h2p - h1p;
        if dh.abs() <= 180.0 {
            dh
        } else if dh > 180.0 {
            dh - 360.0
        } else {
            dh + 360.0
        }
    };
    let delta_big_hp = 2.0 * chroma_product.sqrt() * (delta_hp.to_radians() / 2.0).sin();

    let avg_hp = if chroma_product == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= 180.0 {
        (h1p + h2p) / 2.0
    } else if h1p + h2p < 360.0 {
        (h1p + h2p + 360.0) / 2.0
    } else {
        (h1p + h2p - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * (avg_hp - 30.0).to_radians().cos()
        + 0.24 * (2.0 * avg_hp).to_radians().cos()
        + 0.32 * (3.0 * avg_hp + 6.0).to_radians().cos()
        - 0.20 * (4.0 * avg_hp - 63.0).to_radians().cos();

    let l50 = (avg_l - 50.0).powi(2);
    let sl = 1.0 + (0.015 * l50) / (20.0 + l50).sqrt();
    let sc = 1.0 + 0.045 * avg_cp;
    let sh = 1.0 + 0.015 * avg_cp * t;

    let delta_theta = 30.0 * (-((avg_hp - 275.0) / 25.0).powi(2)).exp();
    let rc = 2.0 * chroma_weight(avg_cp).sqrt();
    let rt = -rc * (2.0 * delta_theta * PI / 180.0).sin();

    let term_l = delta_lp / sl;
    let term_c = delta_cp / sc;
    let term_h = delta_big_hp / sh;

    let sum = term_l * term_l + term_c * term_c + term_h * term_h + rt * term_c * term_h;
    // NaN passes through so callers can reject it
    if sum < 0.0 {
        0.0
    } else {
        sum.sqrt()
    }
}

/// `C^7 / (C^7 + 25^7)`, written so large chroma cannot overflow
#[inline]
fn chroma_weight(c: f64) -> f64 {
    1.0 / (1.0 + (25.0 / c).powi(7))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn delta_e_matches_published_reference_pairs() {
        // (L1, a1, b1, L2, a2, b2, expected), Sharma et al. 2005
        let pairs = [
            (50.0, 2.6772, -79.7751, 50.0, 0.0, -82.7485, 2.0425),
            (50.0, 0.0, 0.0, 50.0, -1.0, 2.0, 2.3669),
            (50.0, 2.49, -0.001, 50.0, -2.49, 0.0009, 7.1792),
            (50.0, -0.001, 2.49, 50.0, 0.0009, -2.49, 4.8045),
            (50.0, 2.5, 0.0, 73.0, 25.0, -18.0, 27.1492),
            (50.0, 2.5, 0.0, 56.0, -27.0, -3.0, 31.9030),
            (60.2574, -34.0099, 36.2677, 60.4626, -34.1751, 39.4387, 1.2644),
            (90.8027, -2.0831, 1.441, 91.1528, -1.6435, 0.0447, 1.4441),
            (2.0776, 0.0795, -1.135, 0.9033, -0.0636, -0.5514, 0.9082),
        ];

        for (i, &(l1, a1, b1, l2, a2, b2, expected)) in pairs.iter().enumerate() {
            let de = delta_e_2000(LabColor::new(l1, a1, b1), LabColor::new(l2, a2, b2));
            assert!(
                (de - expected).abs() < 1e-3,
                "pair {}: expected {expected}, got {de}",
                i + 1
            );
        }
    }

    #[test]
    fn delta_e_is_zero_for_identical_and_symmetric() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let x = LabColor::new(
                rng.gen_range(0.0..100.0),
                rng.gen_range(-128.0..128.0),
                rng.gen_range(-128.0..128.0),
            );
            let y = LabColor::new(
                rng.gen_range(0.0..100.0),
                rng.gen_range(-128.0..128.0),
                rng.gen_range(-128.0..128.0),
            );
            assert_eq!(delta_e_2000(x, x), 0.0);
            assert!((delta_e_2000(x, y) - delta_e_2000(y, x)).abs() < 1e-9);
            assert!(delta_e_2000(x, y) > 0.0);
        }
    }

    #[test]
    fn delta_e_stays_finite_for_huge_chroma() {
        let huge = LabColor::new(50.0, 1e60, 0.0);
        for other in [LabColor::new(50.0, 0.0, 0.0), LabColor::new(42.1, 64.2, 31.0)] {
            let de = delta_e_2000(huge, other);
            assert!(de.is_finite() && de > 10.0, "ΔE {de} against {other:?}");
        }
    }

    #[test]
    fn delta_e_propagates_nan() {
        let nan = LabColor::new(f64::NAN, 0.0, 0.0);
        assert!(delta_e_2000(nan, LabColor::new(50.0, 0.0, 0.0)).is_nan());
    }

    #[test]
    fn lab_xyz_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let c = LabColor::new(
                rng.gen_range(0.0..100.0),
                rng.gen_range(-128.0..128.0),
                rng.gen_range(-128.0..128.0),
            );
            let back = xyz_to_lab(lab_to_xyz(c));
            assert!((back.l - c.l).abs() < 1e-6, "{c:?} -> {back:?}");
            assert!((back.a - c.a).abs() < 1e-6, "{c:?} -> {back:?}");
            assert!((back.b - c.b).abs() < 1e-6, "{c:?} -> {back:?}");
        }
    }

    #[test]
    fn reference_white_maps_to_full_lightness() {
        let lab = xyz_to_lab(Xyz {
            x: WHITE_X,
            y: WHITE_Y,
            z: WHITE_Z,
        });
        assert!((lab.l - 100.0).abs() < 1e-9);
        assert!(lab.a.abs() < 1e-9);
        assert!(lab.b.abs() < 1e-9);
    }

    #[test]
    fn ks_reflectance_round_trip() {
        let mut ks = 0.0;
        while ks <= 50.0 {
            let back = ks_from_reflectance(reflectance_from_ks(ks));
            assert!((back - ks).abs() < 1e-3, "ks {ks} -> {back}");
            ks += 0.25;
        }
    }

    #[test]
    fn reflectance_is_clamped() {
        assert_eq!(reflectance_from_lab(LabColor::new(100.0, 0.0, 0.0)), MAX_REFLECTANCE);
        assert_eq!(reflectance_from_lab(LabColor::new(0.0, 0.0, 0.0)), MIN_REFLECTANCE);
        assert_eq!(reflectance_from_ks(0.0), MAX_REFLECTANCE);
        assert_eq!(reflectance_from_ks(1e6), MIN_REFLECTANCE);
    }
}
