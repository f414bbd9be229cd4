//! Daily AQI observations, divisions and forecast output types

use crate::error::{ForecastError, Result};
use aqi_features::rolling;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the eight administrative divisions of Bangladesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Division {
    Dhaka,
    Chattogram,
    Sylhet,
    Khulna,
    Rajshahi,
    Barishal,
    Mymensingh,
    Rangpur,
}

impl Division {
    /// All divisions in canonical order
    pub const ALL: [Division; 8] = [
        Division::Dhaka,
        Division::Chattogram,
        Division::Sylhet,
        Division::Khulna,
        Division::Rajshahi,
        Division::Barishal,
        Division::Mymensingh,
        Division::Rangpur,
    ];

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Division::Dhaka => "Dhaka",
            Division::Chattogram => "Chattogram",
            Division::Sylhet => "Sylhet",
            Division::Khulna => "Khulna",
            Division::Rajshahi => "Rajshahi",
            Division::Barishal => "Barishal",
            Division::Mymensingh => "Mymensingh",
            Division::Rangpur => "Rangpur",
        }
    }

    /// Canonical names in canonical order
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Division::as_str).collect()
    }

    /// Resolve a city name as it appears in the data source
    ///
    /// Applies the known spelling corrections of the source sheet before
    /// matching canonical names. Returns `None` for cities outside the eight
    /// divisions.
    pub fn from_source_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let canonical = match name {
            "Chittagong" | "Chittgong" => "Chattogram",
            "Barisal" => "Barishal",
            other => other,
        };
        canonical.parse().ok()
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Division {
    type Err = ForecastError;

    /// Strict lookup: surrounding whitespace is ignored, aliases are not
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|division| division.as_str() == trimmed)
            .ok_or_else(|| ForecastError::UnknownDivision(trimmed.to_string()))
    }
}

/// A single daily AQI value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Append-only, strictly date-ordered sequence of observations for one division
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl Series {
    /// Create an empty series
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a series, validating date order and value finiteness
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        let mut series = Self {
            dates: Vec::with_capacity(observations.len()),
            values: Vec::with_capacity(observations.len()),
        };
        for observation in observations {
            series.push(observation)?;
        }
        Ok(series)
    }

    /// Create a series of consecutive days starting at `start`
    pub fn daily(start: NaiveDate, values: &[f64]) -> Result<Self> {
        let observations = start
            .iter_days()
            .zip(values.iter())
            .map(|(date, value)| Observation::new(date, *value))
            .collect();
        Self::new(observations)
    }

    /// Append an observation after the current last date
    pub fn push(&mut self, observation: Observation) -> Result<()> {
        if !observation.value.is_finite() {
            return Err(ForecastError::InvalidSeries(format!(
                "value on {} is not finite: {}",
                observation.date, observation.value
            )));
        }
        if let Some(last) = self.last_date() {
            if observation.date <= last {
                return Err(ForecastError::InvalidSeries(format!(
                    "date {} does not follow last date {}",
                    observation.date, last
                )));
            }
        }
        self.dates.push(observation.date);
        self.values.push(observation.value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<Observation> {
        self.get(0)
    }

    pub fn last(&self) -> Option<Observation> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn get(&self, index: usize) -> Option<Observation> {
        Some(Observation::new(
            *self.dates.get(index)?,
            *self.values.get(index)?,
        ))
    }

    /// Values in date order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Dates in increasing order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.dates
            .iter()
            .zip(self.values.iter())
            .map(|(date, value)| Observation::new(*date, *value))
    }

    /// Mean of the last `min(n, len)` values, `None` when empty
    pub fn tail_mean(&self, n: usize) -> Option<f64> {
        rolling::tail_mean(&self.values, n)
    }
}

/// Predicted AQI for one future date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    #[serde(rename = "predicted_aqi")]
    pub predicted_value: f64,
}
