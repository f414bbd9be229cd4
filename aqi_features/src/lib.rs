//! # AQI Features
//!
//! Feature construction for daily air-quality series.
//! This crate turns an ordered sequence of daily values into the fixed-width
//! feature vector the per-division regressors were fitted on:
//!
//! - `lag_1` .. `lag_14`: the value L days before the reference date
//! - `roll7`, `roll14`: means of the 7 / 14 values preceding the reference date
//! - `dow`, `mon`, `doy`: calendar fields of the reference date
//!
//! Every function here is pure. Fields that cannot be computed from the
//! available history are reported as `None`, never as zero.

use thiserror::Error;

pub mod calendar;
pub mod features;
pub mod rolling;

pub use features::{FeatureBuilder, FeatureField, FeatureSchema, FeatureVector, MAX_LAG};

/// Errors raised while interpreting a feature schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("Unknown feature name: {0}")]
    UnknownField(String),

    #[error("Duplicate feature name in schema: {0}")]
    DuplicateField(String),

    #[error("Feature schema is empty")]
    EmptySchema,
}

/// Result type for feature operations
pub type Result<T> = std::result::Result<T, FeatureError>;
