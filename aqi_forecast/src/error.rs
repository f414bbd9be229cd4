//! Error types for the aqi_forecast crate

use crate::data::Division;
use aqi_features::FeatureError;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for the aqi_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Requested division is not one of the eight recognised divisions
    #[error(
        "Unknown division '{0}': division must be one of {names}",
        names = Division::names().join(", ")
    )]
    UnknownDivision(String),

    /// No fitted model is registered for a valid division
    #[error("No model for {0}")]
    NoModel(Division),

    /// Model directory held no model files at all
    #[error("No models found in {}", .0.display())]
    NoModels(PathBuf),

    /// The data source has no observations for the division
    #[error("No data for {0}")]
    NoData(Division),

    /// The engine was handed a series without observations
    #[error("Cannot forecast from an empty series")]
    EmptySeries,

    /// Series violates ordering or value invariants
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// Forecast was aborted through its cancellation flag
    #[error("Forecast cancelled")]
    Cancelled,

    /// Data source content could not be interpreted
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Model file is malformed or inconsistent with its schema
    #[error("Invalid model file {}: {reason}", .path.display())]
    ModelFormat { path: PathBuf, reason: String },

    /// Invalid runtime configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("{0}")]
    Csv(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from feature schema handling
    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Coarse classes a caller-facing layer translates into responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad caller input, not retried
    Validation,
    /// Server-side setup fault such as a missing model
    Configuration,
    /// The division exists but has no observations
    NoData,
    /// Contract violation by the calling code
    Precondition,
    Cancelled,
    Internal,
}

impl ErrorCategory {
    /// HTTP-style status code for the category
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::Validation => 400,
            ErrorCategory::NoData => 404,
            ErrorCategory::Cancelled => 499,
            ErrorCategory::Configuration
            | ErrorCategory::Precondition
            | ErrorCategory::Internal => 500,
        }
    }
}

impl ForecastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ForecastError::UnknownDivision(_) => ErrorCategory::Validation,
            ForecastError::NoModel(_)
            | ForecastError::NoModels(_)
            | ForecastError::ModelFormat { .. }
            | ForecastError::Config(_)
            | ForecastError::Feature(_) => ErrorCategory::Configuration,
            ForecastError::NoData(_) => ErrorCategory::NoData,
            ForecastError::EmptySeries | ForecastError::InvalidSeries(_) => {
                ErrorCategory::Precondition
            }
            ForecastError::Cancelled => ErrorCategory::Cancelled,
            ForecastError::DataSource(_)
            | ForecastError::Io(_)
            | ForecastError::Csv(_)
            | ForecastError::Json(_) => ErrorCategory::Internal,
        }
    }
}
