mod colour;
mod error;
mod ink;

pub use colour::{LabColor, Xyz};
pub use error::{DataError, MatchError};
pub use ink::{
    BaseInkModel, CandidateFormula, FormulaLine, InkReferenceRow, MatchSource, PmsEntry,
    PredictionResult,
};
