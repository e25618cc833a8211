use serde::{Deserialize, Serialize};

/// A CIE L*a*b* colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabColor {
    #[serde(rename = "L")]
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabColor {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Mid-grey used whenever a pigment has no reference colour.
    pub const NEUTRAL: LabColor = LabColor::new(70.0, 0.0, 0.0);

    pub fn chroma(&self) -> f64 {
        self.a.hypot(self.b)
    }

    pub fn is_finite(&self) -> bool {
        self.l.is_finite() && self.a.is_finite() && self.b.is_finite()
    }

    /// Render as an sRGB hex string (`#rrggbb`) for colour patches.
    pub fn to_hex(&self) -> String {
        let xyz = crate::services::colour_math::lab_to_xyz(*self);
        let (x, y, z) = (xyz.x / 100.0, xyz.y / 100.0, xyz.z / 100.0);

        // XYZ to linear sRGB (D65 reference)
        let r_lin = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
        let g_lin = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
        let b_lin = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

        let gamma = |c: f64| {
            let c = c.clamp(0.0, 1.0);
            if c <= 0.0031308 {
                12.92 * c
            } else {
                1.055 * c.powf(1.0 / 2.4) - 0.055
            }
        };

        let r = (gamma(r_lin) * 255.0).round() as u8;
        let g = (gamma(g_lin) * 255.0).round() as u8;
        let b = (gamma(b_lin) * 255.0).round() as u8;

        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// CIE XYZ tristimulus values on the 0..100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}
