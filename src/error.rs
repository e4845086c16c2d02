//! Error types for the diet predictor

use thiserror::Error;

/// Result type alias for diet predictor operations
pub type Result<T> = std::result::Result<T, DietError>;

/// Main error type shared by the training pipeline and the prediction service
#[derive(Error, Debug)]
pub enum DietError {
    #[error("Dataset not found at: {0}")]
    DatasetNotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl From<polars::error::PolarsError> for DietError {
    fn from(err: polars::error::PolarsError) -> Self {
        DietError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for DietError {
    fn from(err: serde_json::Error) -> Self {
        DietError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DietError {
    fn from(err: ndarray::ShapeError) -> Self {
        DietError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
