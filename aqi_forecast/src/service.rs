//! Caller-facing forecast service
//!
//! Validates requests, resolves the division's series from the store and
//! drives the engine. Errors keep their [`crate::error::ErrorCategory`] so a
//! transport layer can translate them.

use crate::config::AppConfig;
use crate::data::{Division, ForecastPoint};
use crate::engine::ForecastEngine;
use crate::error::{ForecastError, Result};
use crate::models::ModelRegistry;
use crate::store::{CsvFileSource, SeriesSnapshot, SeriesStore};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Liveness report listing divisions that can be forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub divisions: Vec<Division>,
}

/// Forecast for one division
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResponse {
    pub division: Division,
    pub forecast_days: usize,
    pub predictions: Vec<ForecastPoint>,
}

#[derive(Debug)]
pub struct ForecastService {
    store: SeriesStore,
    engine: ForecastEngine,
    horizon: usize,
}

impl ForecastService {
    pub fn new(store: SeriesStore, engine: ForecastEngine, horizon: usize) -> Self {
        Self {
            store,
            engine,
            horizon,
        }
    }

    /// Load the models and wire a CSV-backed store from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = Arc::new(ModelRegistry::load_dir(&config.models_dir)?);
        let store = SeriesStore::new(
            Box::new(CsvFileSource::new(&config.data_path)),
            config.cache_max_age(),
        );
        Ok(Self::new(store, ForecastEngine::new(registry), config.horizon))
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            divisions: self.engine.registry().divisions(),
        }
    }

    /// Forecast for a division given by name
    pub fn predict(&self, raw_division: &str) -> Result<ForecastResponse> {
        let division: Division = raw_division.parse()?;
        self.ensure_model(division)?;
        let snapshot = self.store.snapshot()?;
        self.predict_from(&snapshot, division)
    }

    /// Forecast every division with a model, in parallel, over one snapshot
    pub fn predict_all(&self) -> Result<Vec<(Division, Result<ForecastResponse>)>> {
        let snapshot = self.store.snapshot()?;
        let started = Instant::now();
        let results: Vec<_> = self
            .engine
            .registry()
            .divisions()
            .into_par_iter()
            .map(|division| (division, self.predict_from(&snapshot, division)))
            .collect();
        info!(
            divisions = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "forecast all divisions"
        );
        Ok(results)
    }

    fn ensure_model(&self, division: Division) -> Result<()> {
        if self.engine.registry().contains(division) {
            Ok(())
        } else {
            Err(ForecastError::NoModel(division))
        }
    }

    fn predict_from(
        &self,
        snapshot: &SeriesSnapshot,
        division: Division,
    ) -> Result<ForecastResponse> {
        let series = snapshot
            .get(division)
            .filter(|series| !series.is_empty())
            .ok_or(ForecastError::NoData(division))?;
        let predictions = self.engine.forecast(division, series, self.horizon)?;
        info!(%division, history = series.len(), days = predictions.len(), "forecast complete");
        Ok(ForecastResponse {
            division,
            forecast_days: self.horizon,
            predictions,
        })
    }
}
