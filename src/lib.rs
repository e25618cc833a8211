//! Ink formulation matching: predicts pigment formulas for a target
//! L*a*b* colour and estimates the effect of live formula edits.

pub mod api;
pub mod config;
pub mod data;
pub mod models;
pub mod services;
pub mod state;

// Re-export for convenience
pub use config::EngineConfig;
pub use models::{FormulaLine, LabColor, MatchError, MatchSource, PredictionResult};
pub use state::AppState;
