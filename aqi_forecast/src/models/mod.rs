//! Model Registry: one pre-fitted regressor per division
//!
//! Models are loaded once at start-up and are read-only afterwards. The
//! registry is an explicit value shared behind an `Arc` rather than a
//! process-wide global.

use crate::data::Division;
use crate::error::{ForecastError, Result};
use aqi_features::{FeatureSchema, FeatureVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub mod linear;
pub mod tree;

pub use linear::LinearModel;
pub use tree::{RegressionTree, TreeEnsemble, TreeNode};

/// Opaque fitted regressor: feature row in, scalar prediction out
///
/// The row follows the schema of the [`FittedModel`] that owns the regressor.
pub trait Regressor: Send + Sync + Debug {
    fn predict(&self, row: &[f64]) -> f64;

    /// Row width the regressor was fitted on, when it records one
    fn n_features(&self) -> Option<usize> {
        None
    }

    /// Check the regressor can score rows of `width` features
    fn validate(&self, width: usize) -> std::result::Result<(), String> {
        match self.n_features() {
            Some(n) if n != width => Err(format!(
                "regressor expects {} features but the schema lists {}",
                n, width
            )),
            _ => Ok(()),
        }
    }
}

/// Serialized regressor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

/// On-disk model file: `<models_dir>/<Division>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    /// Feature names in the order the model consumes them
    pub features: FeatureSchema,
    pub model: ModelSpec,
}

impl ModelFile {
    fn into_regressor(self) -> Box<dyn Regressor> {
        match self.model {
            ModelSpec::Linear(linear) => Box::new(linear),
            ModelSpec::TreeEnsemble(ensemble) => Box::new(ensemble),
        }
    }
}

/// A regressor bound to its division and feature schema
#[derive(Debug)]
pub struct FittedModel {
    division: Division,
    schema: FeatureSchema,
    regressor: Box<dyn Regressor>,
}

impl FittedModel {
    /// Bind a regressor to a schema, rejecting regressors that cannot score
    /// rows of the schema's width
    pub fn new(
        division: Division,
        schema: FeatureSchema,
        regressor: Box<dyn Regressor>,
    ) -> Result<Self> {
        regressor.validate(schema.len()).map_err(|reason| {
            ForecastError::Config(format!("model for {}: {}", division, reason))
        })?;
        Ok(Self {
            division,
            schema,
            regressor,
        })
    }

    /// Read and validate a model file
    pub fn from_file<P: AsRef<Path>>(division: Division, path: P) -> Result<Self> {
        let path = path.as_ref();
        let format_error = |reason: String| ForecastError::ModelFormat {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path)?;
        let file: ModelFile =
            serde_json::from_str(&content).map_err(|e| format_error(e.to_string()))?;
        let schema = file.features.clone();
        let regressor = file.into_regressor();
        regressor.validate(schema.len()).map_err(format_error)?;

        Self::new(division, schema, regressor)
    }

    pub fn division(&self) -> Division {
        self.division
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn regressor(&self) -> &dyn Regressor {
        self.regressor.as_ref()
    }

    /// Prediction for a feature vector, `None` if a schema field is missing
    pub fn predict(&self, features: &FeatureVector) -> Option<f64> {
        features
            .to_row(&self.schema)
            .map(|row| self.regressor.predict(&row))
    }
}

/// Division → fitted model map, built once and then only read
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<Division, FittedModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model, replacing any previous one for its division
    pub fn insert(&mut self, model: FittedModel) -> Option<FittedModel> {
        self.models.insert(model.division(), model)
    }

    /// Load `<dir>/<Division>.json` for every division that has one
    ///
    /// Fails when the directory holds none of them, or when any present file
    /// is malformed.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut registry = Self::new();

        for division in Division::ALL {
            let path = dir.join(format!("{}.json", division));
            if !path.is_file() {
                warn!(%division, path = %path.display(), "no model file for division");
                continue;
            }
            let model = FittedModel::from_file(division, &path)?;
            info!(%division, features = model.schema().len(), "loaded model");
            registry.insert(model);
        }

        if registry.is_empty() {
            return Err(ForecastError::NoModels(dir.to_path_buf()));
        }
        Ok(registry)
    }

    pub fn get(&self, division: Division) -> Option<&FittedModel> {
        self.models.get(&division)
    }

    pub fn contains(&self, division: Division) -> bool {
        self.models.contains_key(&division)
    }

    /// Divisions with a model, in canonical order
    pub fn divisions(&self) -> Vec<Division> {
        Division::ALL
            .iter()
            .copied()
            .filter(|division| self.models.contains_key(division))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
