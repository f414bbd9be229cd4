//! # AQI Forecast
//!
//! Seven-day air-quality forecasts for the eight divisions of Bangladesh.
//!
//! ## Components
//!
//! - [`store`]: cached, atomically refreshed snapshots of the cleaned daily series
//! - [`models`]: one pre-fitted regressor per division, loaded once at start-up
//! - [`engine`]: the autoregressive rollout that feeds each prediction back
//!   into the series it forecasts from
//! - [`service`]: request validation and error classification for callers
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use aqi_features::FeatureSchema;
//! use aqi_forecast::models::{FittedModel, LinearModel, ModelRegistry};
//! use aqi_forecast::{Division, ForecastEngine, Series, DEFAULT_HORIZON};
//! use chrono::NaiveDate;
//!
//! let schema = FeatureSchema::from_names(&["lag_1"])?;
//! let model = FittedModel::new(
//!     Division::Dhaka,
//!     schema,
//!     Box::new(LinearModel::new(0.0, vec![1.0])),
//! )?;
//! let mut registry = ModelRegistry::new();
//! registry.insert(model);
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let series = Series::daily(start, &[120.0, 130.0, 140.0])?;
//!
//! let engine = ForecastEngine::new(Arc::new(registry));
//! let forecast = engine.forecast(Division::Dhaka, &series, DEFAULT_HORIZON)?;
//! assert_eq!(forecast.len(), 7);
//! assert_eq!(forecast[0].predicted_value, 140.0);
//! # Ok::<(), aqi_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use crate::data::{Division, ForecastPoint, Observation, Series};
pub use crate::engine::{FeatureAnchor, ForecastEngine, DEFAULT_HORIZON};
pub use crate::error::{ErrorCategory, ForecastError, Result};
pub use crate::models::{FittedModel, ModelRegistry, Regressor};
pub use crate::service::{ForecastResponse, ForecastService, HealthReport};
pub use crate::store::{SeriesSnapshot, SeriesSource, SeriesStore};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
