use std::path::PathBuf;

/// Errors surfaced to callers of the colour matching engine
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("Invalid target colour: {field} {reason}")]
    InvalidTarget { field: &'static str, reason: String },
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Errors that can occur while loading reference datasets
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed reference dataset: {0}")]
    Json(#[from] serde_json::Error),
}
