//! Engine configuration via TOML files.
//!
//! Every threshold and budget the matcher uses is an empirical constant, so
//! all of them live here with their working defaults.
//!
//! ```
//! use inkmatch::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str("[search]\niterations = 2000\n").unwrap();
//! assert_eq!(config.search.iterations, 2000);
//! assert_eq!(config.search.pool_size, 40);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::LabColor;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub reference: ReferenceConfig,
    pub search: SearchConfig,
    pub simulator: SimulatorConfig,
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }
}

/// How the ladder dataset is interpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Ink code of the colourless extender; its ladder rows are never fitted
    pub extender_code: String,
    pub extender_name: String,
    /// Substrate colour used when the dataset has no substrate row
    pub default_substrate: LabColor,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            extender_code: "DC21-002".to_string(),
            extender_name: "Extender".to_string(),
            default_substrate: LabColor::new(100.0, 0.0, 0.0),
        }
    }
}

/// Formula search thresholds and budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Spot entries at or below this ΔE00 are returned as-is
    pub spot_match_threshold: f64,
    /// A trial at or below this ΔE00 ends the search
    pub perfect_match_threshold: f64,
    /// Width of the uniform weight perturbation, centred on zero
    pub step: f64,
    /// Hill-climb iterations per (pigment count, loading) trial
    pub iterations: usize,
    /// Pigment loadings to try, in percent of the ink
    pub pigment_totals: Vec<f64>,
    pub min_pigments: usize,
    pub max_pigments: usize,
    /// Number of ranked pigments kept as mixing candidates
    pub pool_size: usize,
    /// Formula lines below this percentage are dropped as noise
    pub min_line_percent: f64,
    /// Fixed seed for reproducible searches; entropy when absent
    pub seed: Option<u64>,
    /// Wall-clock budget per request in milliseconds
    pub deadline_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            spot_match_threshold: 2.0,
            perfect_match_threshold: 1.0,
            step: 0.03,
            iterations: 6000,
            pigment_totals: vec![70.0, 75.0, 80.0, 85.0, 90.0, 95.0],
            min_pigments: 2,
            max_pigments: 10,
            pool_size: 40,
            min_line_percent: 0.25,
            seed: None,
            deadline_ms: None,
        }
    }
}

/// Tinting strength of one pigment family, matched by substring of its name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyStrength {
    pub family: String,
    pub strength: f64,
}

impl FamilyStrength {
    fn new(family: &str, strength: f64) -> Self {
        Self {
            family: family.to_string(),
            strength,
        }
    }
}

/// Live edit simulator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Global sensitivity of the colour shift per percent changed
    pub sensitivity: f64,
    /// Lightness a pigment must exceed to lighten the mix
    pub neutral_lightness: f64,
    /// Chroma at which a pigment's shift is doubled
    pub chroma_scale: f64,
    /// Colour extender edits pull towards
    pub carrier: LabColor,
    /// Checked in order; the first family found in the pigment name wins
    pub strengths: Vec<FamilyStrength>,
    pub default_strength: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            neutral_lightness: 70.0,
            chroma_scale: 80.0,
            carrier: LabColor::new(100.0, 0.0, 0.0),
            strengths: vec![
                FamilyStrength::new("RED", 1.2),
                FamilyStrength::new("YELLOW", 1.1),
                FamilyStrength::new("BLUE", 1.3),
                FamilyStrength::new("GREEN", 1.0),
                FamilyStrength::new("VIOLET", 1.25),
                FamilyStrength::new("BLACK", 0.8),
                FamilyStrength::new("WHITE", 0.6),
                FamilyStrength::new("ORANGE", 1.15),
                FamilyStrength::new("MAGENTA", 1.25),
                FamilyStrength::new("EXTENDER", 0.4),
                FamilyStrength::new("BASE", 0.5),
            ],
            default_strength: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.search.iterations, 6000);
        assert_eq!(config.search.pigment_totals.len(), 6);
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = EngineConfig::from_toml_str(
            r#"
            [reference]
            extender_code = "EXT-1"

            [search]
            seed = 9
            pigment_totals = [80.0, 90.0]

            [simulator]
            carrier = { L = 95.0, a = 0.5, b = 2.0 }
            strengths = [{ family = "BLUE", strength = 2.0 }]
            "#,
        )
        .unwrap();
        assert_eq!(config.reference.extender_code, "EXT-1");
        assert_eq!(config.reference.extender_name, "Extender");
        assert_eq!(config.search.seed, Some(9));
        assert_eq!(config.search.pigment_totals, vec![80.0, 90.0]);
        assert_eq!(config.search.step, 0.03);
        assert_eq!(config.simulator.carrier, LabColor::new(95.0, 0.5, 2.0));
        assert_eq!(config.simulator.strengths.len(), 1);
    }

    #[test]
    fn load_from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        fs::write(&path, "[search]\nstep = 0.05\n").unwrap();
        let config = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(config.search.step, 0.05);
    }

    #[test]
    fn malformed_toml_is_reported() {
        assert!(matches!(
            EngineConfig::from_toml_str("[search\nstep = "),
            Err(ConfigError::Parse(_))
        ));
    }
}
