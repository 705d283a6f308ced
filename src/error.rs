//! Error types for Synheart Stress

use thiserror::Error;

use crate::types::Feature;

/// Errors that can occur while loading a model or predicting
#[derive(Debug, Error)]
pub enum StressError {
    #[error("Failed to load model artifact: {0}")]
    ModelLoad(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown label '{label}' for feature {feature}")]
    UnknownLabel { feature: Feature, label: String },

    #[error("Unknown code {code} for feature {feature}")]
    UnknownCode { feature: Feature, code: u32 },

    #[error("Classifier failure: {0}")]
    ComputeError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl StressError {
    /// True for errors that mean the predictor cannot serve requests at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StressError::ServiceUnavailable(_))
    }
}
