//! Autoregressive multi-step forecasting
//!
//! Each step builds features from the working series, predicts one day
//! ahead and appends the prediction as if it had been observed, so later
//! steps see earlier predictions as history.

use crate::data::{Division, ForecastPoint, Observation, Series};
use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, ModelRegistry};
use aqi_features::{FeatureBuilder, FeatureVector};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of days forecast per request
pub const DEFAULT_HORIZON: usize = 7;

/// Number of trailing values averaged when features are incomplete
pub const FALLBACK_WINDOW: usize = 7;

/// Which timestep a step's feature vector describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureAnchor {
    /// The target date itself, with the whole working series as prior history
    #[default]
    NextStep,
    /// The last entry of the working series, with that entry excluded
    LastObservation,
}

/// How a step's value was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Model,
    /// Mean of the last [`FALLBACK_WINDOW`] working values
    Fallback,
}

/// One rollout step with the inputs that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastStep {
    /// 1-based step number
    pub step: usize,
    pub point: ForecastPoint,
    pub features: FeatureVector,
    pub source: PredictionSource,
}

/// Stateless driver of per-division rollouts over a shared registry
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    registry: Arc<ModelRegistry>,
    builder: FeatureBuilder,
    anchor: FeatureAnchor,
}

impl ForecastEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            builder: FeatureBuilder::new(),
            anchor: FeatureAnchor::default(),
        }
    }

    pub fn with_anchor(mut self, anchor: FeatureAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn anchor(&self) -> FeatureAnchor {
        self.anchor
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Forecast `horizon` days after the last observation of `series`
    ///
    /// Points are dated `last_date + 1 ..= last_date + horizon`. Fails with
    /// [`ForecastError::EmptySeries`] for an empty series regardless of the
    /// division, and with [`ForecastError::NoModel`] when the division has no
    /// registered model.
    pub fn forecast(
        &self,
        division: Division,
        series: &Series,
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>> {
        let steps = self.run(division, series, horizon, None)?;
        Ok(steps.into_iter().map(|s| s.point).collect())
    }

    /// Like [`ForecastEngine::forecast`], also returning each step's features
    pub fn forecast_traced(
        &self,
        division: Division,
        series: &Series,
        horizon: usize,
    ) -> Result<Vec<ForecastStep>> {
        self.run(division, series, horizon, None)
    }

    /// Like [`ForecastEngine::forecast`], aborting with
    /// [`ForecastError::Cancelled`] once `cancel` is set
    ///
    /// The flag is checked before every step.
    pub fn forecast_cancellable(
        &self,
        division: Division,
        series: &Series,
        horizon: usize,
        cancel: &AtomicBool,
    ) -> Result<Vec<ForecastPoint>> {
        let steps = self.run(division, series, horizon, Some(cancel))?;
        Ok(steps.into_iter().map(|s| s.point).collect())
    }

    /// Division-agnostic rollout with an explicit model
    pub fn rollout(
        &self,
        model: &FittedModel,
        series: &Series,
        horizon: usize,
    ) -> Result<Vec<ForecastStep>> {
        self.rollout_inner(model, series, horizon, None)
    }

    fn run(
        &self,
        division: Division,
        series: &Series,
        horizon: usize,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<ForecastStep>> {
        if series.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        let model = self
            .registry
            .get(division)
            .ok_or(ForecastError::NoModel(division))?;
        self.rollout_inner(model, series, horizon, cancel)
    }

    fn rollout_inner(
        &self,
        model: &FittedModel,
        series: &Series,
        horizon: usize,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<ForecastStep>> {
        let last_date = series.last_date().ok_or(ForecastError::EmptySeries)?;
        let division = model.division();
        let mut work = series.clone();
        let mut steps = Vec::with_capacity(horizon);

        for step in 1..=horizon {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                debug!(%division, step, "forecast cancelled");
                return Err(ForecastError::Cancelled);
            }

            let target_date = date_after(last_date, step)?;
            let features = self.features_for(&work, target_date)?;

            let (prediction, source) = match model.predict(&features) {
                Some(value) if value.is_finite() => (value, PredictionSource::Model),
                other => {
                    if let Some(value) = other {
                        warn!(%division, step, value, "non-finite model output, using fallback");
                    } else {
                        debug!(
                            %division,
                            step,
                            missing = features.missing(model.schema()).len(),
                            "incomplete features, using fallback"
                        );
                    }
                    let mean = work
                        .tail_mean(FALLBACK_WINDOW)
                        .ok_or(ForecastError::EmptySeries)?;
                    (mean, PredictionSource::Fallback)
                }
            };

            debug!(%division, step, %target_date, ?source, prediction, "forecast step");

            let point = ForecastPoint {
                date: target_date,
                predicted_value: prediction,
            };
            work.push(Observation::new(target_date, prediction))?;
            steps.push(ForecastStep {
                step,
                point,
                features,
                source,
            });
        }

        Ok(steps)
    }

    fn features_for(&self, work: &Series, target_date: NaiveDate) -> Result<FeatureVector> {
        match self.anchor {
            FeatureAnchor::NextStep => Ok(self.builder.build_at(target_date, work.values())),
            FeatureAnchor::LastObservation => {
                let reference = work.last_date().ok_or(ForecastError::EmptySeries)?;
                Ok(self.builder.build_last(reference, work.values()))
            }
        }
    }
}

fn date_after(last_date: NaiveDate, step: usize) -> Result<NaiveDate> {
    last_date
        .checked_add_days(Days::new(step as u64))
        .ok_or_else(|| {
            ForecastError::InvalidSeries(format!(
                "forecast date {} days after {} is out of range",
                step, last_date
            ))
        })
}
