//! # BD AQI
//!
//! Workspace facade for the division AQI forecaster.
//!
//! - [`features`]: lag, rolling-window and calendar feature construction
//! - [`forecast`]: series store, model registry, forecast engine and service
//!
//! ## Example
//!
//! ```
//! use bd_aqi_workspace::features::{FeatureBuilder, FeatureSchema};
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let features = FeatureBuilder::new().build_at(date, &[90.0, 110.0]);
//! assert_eq!(features.lag(1), Some(110.0));
//! assert_eq!((features.dow, features.mon, features.doy), (4, 3, 61));
//! assert!(!features.is_complete(&FeatureSchema::standard()));
//! ```

pub use aqi_features as features;
pub use aqi_forecast as forecast;

pub use aqi_forecast::{
    Division, ForecastEngine, ForecastError, ForecastPoint, ForecastService, Series,
    DEFAULT_HORIZON,
};
