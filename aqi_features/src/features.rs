//! Feature schema and the per-timestep feature vector
//!
//! The schema is the contract between feature construction and a fitted
//! regressor: the regressor consumes a row whose columns follow the schema's
//! declared order exactly.

use crate::{calendar, rolling, FeatureError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Deepest lag feature (`lag_14`)
pub const MAX_LAG: usize = 14;

/// Window of the short rolling mean (`roll7`)
pub const SHORT_WINDOW: usize = 7;

/// Window of the long rolling mean (`roll14`)
pub const LONG_WINDOW: usize = 14;

/// A single named column of the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FeatureField {
    /// Value L days before the reference date, 1 <= L <= 14
    Lag(u8),
    /// Mean of the 7 values preceding the reference date
    Roll7,
    /// Mean of the 14 values preceding the reference date
    Roll14,
    /// Day of week of the reference date (Monday = 0)
    Dow,
    /// Month of the reference date
    Mon,
    /// Day of year of the reference date
    Doy,
}

impl FeatureField {
    /// Canonical column name, as persisted alongside each model
    pub fn name(&self) -> String {
        match self {
            FeatureField::Lag(l) => format!("lag_{}", l),
            FeatureField::Roll7 => "roll7".to_string(),
            FeatureField::Roll14 => "roll14".to_string(),
            FeatureField::Dow => "dow".to_string(),
            FeatureField::Mon => "mon".to_string(),
            FeatureField::Doy => "doy".to_string(),
        }
    }

    /// Whether the field can be missing for short histories
    pub fn is_history_dependent(&self) -> bool {
        matches!(
            self,
            FeatureField::Lag(_) | FeatureField::Roll7 | FeatureField::Roll14
        )
    }
}

impl fmt::Display for FeatureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for FeatureField {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "roll7" => Ok(FeatureField::Roll7),
            "roll14" => Ok(FeatureField::Roll14),
            "dow" => Ok(FeatureField::Dow),
            "mon" => Ok(FeatureField::Mon),
            "doy" => Ok(FeatureField::Doy),
            other => {
                let lag = other
                    .strip_prefix("lag_")
                    .filter(|digits| !digits.starts_with('0'))
                    .and_then(|digits| digits.parse::<u8>().ok())
                    .filter(|l| (1..=MAX_LAG as u8).contains(l));
                lag.map(FeatureField::Lag)
                    .ok_or_else(|| FeatureError::UnknownField(other.to_string()))
            }
        }
    }
}

impl TryFrom<String> for FeatureField {
    type Error = FeatureError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FeatureField> for String {
    fn from(field: FeatureField) -> Self {
        field.name()
    }
}

/// Ordered list of feature columns a model was fitted on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    fields: Vec<FeatureField>,
}

impl FeatureSchema {
    /// Create a schema from fields, rejecting duplicates and empty lists
    pub fn new(fields: Vec<FeatureField>) -> Result<Self> {
        if fields.is_empty() {
            return Err(FeatureError::EmptySchema);
        }
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(*field) {
                return Err(FeatureError::DuplicateField(field.name()));
            }
        }
        Ok(Self { fields })
    }

    /// Parse a schema from persisted column names
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let fields = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<_>>>()?;
        Self::new(fields)
    }

    /// Training order: `lag_1..lag_14, roll7, roll14, dow, mon, doy`
    pub fn standard() -> Self {
        let mut fields: Vec<FeatureField> =
            (1..=MAX_LAG as u8).map(FeatureField::Lag).collect();
        fields.extend([
            FeatureField::Roll7,
            FeatureField::Roll14,
            FeatureField::Dow,
            FeatureField::Mon,
            FeatureField::Doy,
        ]);
        Self { fields }
    }

    pub fn fields(&self) -> &[FeatureField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in declared order
    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(FeatureField::name).collect()
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = FeatureError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::from_names(&names)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.names()
    }
}

/// Features of one reference date
///
/// History-dependent fields are `None` when there was not enough prior data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    /// Date the calendar fields describe
    pub reference_date: NaiveDate,
    /// `lags[L - 1]` holds `lag_L`
    pub lags: [Option<f64>; MAX_LAG],
    pub roll7: Option<f64>,
    pub roll14: Option<f64>,
    pub dow: u32,
    pub mon: u32,
    pub doy: u32,
}

impl FeatureVector {
    /// `lag_L`, or `None` if out of range or missing
    pub fn lag(&self, l: usize) -> Option<f64> {
        if l == 0 || l > MAX_LAG {
            return None;
        }
        self.lags[l - 1]
    }

    /// Value of a single field
    pub fn get(&self, field: FeatureField) -> Option<f64> {
        match field {
            FeatureField::Lag(l) => self.lag(l as usize),
            FeatureField::Roll7 => self.roll7,
            FeatureField::Roll14 => self.roll14,
            FeatureField::Dow => Some(self.dow as f64),
            FeatureField::Mon => Some(self.mon as f64),
            FeatureField::Doy => Some(self.doy as f64),
        }
    }

    /// Schema fields that could not be computed
    pub fn missing(&self, schema: &FeatureSchema) -> Vec<FeatureField> {
        schema
            .fields()
            .iter()
            .copied()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }

    pub fn is_complete(&self, schema: &FeatureSchema) -> bool {
        schema.fields().iter().all(|field| self.get(*field).is_some())
    }

    /// Model input row in schema order, or `None` if any field is missing
    pub fn to_row(&self, schema: &FeatureSchema) -> Option<Vec<f64>> {
        schema.fields().iter().map(|field| self.get(*field)).collect()
    }
}

/// Builds feature vectors from an ordered history of daily values
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Features for `reference_date` given the values strictly before it
    ///
    /// `prior` must be chronological with the value of the day before the
    /// reference date last. Nothing at or after the reference date is read.
    pub fn build_at(&self, reference_date: NaiveDate, prior: &[f64]) -> FeatureVector {
        let mut lags = [None; MAX_LAG];
        for (i, slot) in lags.iter_mut().enumerate() {
            *slot = rolling::lag(prior, i + 1);
        }

        FeatureVector {
            reference_date,
            lags,
            roll7: rolling::trailing_mean(prior, SHORT_WINDOW),
            roll14: rolling::trailing_mean(prior, LONG_WINDOW),
            dow: calendar::day_of_week(reference_date),
            mon: calendar::month(reference_date),
            doy: calendar::day_of_year(reference_date),
        }
    }

    /// Features for the last timestep of a series
    ///
    /// `values` ends with the value observed on `last_date`; that value is
    /// excluded and everything before it is treated as prior history.
    pub fn build_last(&self, last_date: NaiveDate, values: &[f64]) -> FeatureVector {
        let prior = match values.split_last() {
            Some((_, prior)) => prior,
            None => &[],
        };
        self.build_at(last_date, prior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("lag_1", FeatureField::Lag(1))]
    #[case("lag_14", FeatureField::Lag(14))]
    #[case("roll7", FeatureField::Roll7)]
    #[case("roll14", FeatureField::Roll14)]
    #[case("doy", FeatureField::Doy)]
    fn test_field_names_parse(#[case] name: &str, #[case] expected: FeatureField) {
        let field: FeatureField = name.parse().unwrap();
        assert_eq!(field, expected);
        assert_eq!(field.name(), name);
    }

    #[rstest]
    #[case("lag_0")]
    #[case("lag_15")]
    #[case("lag_01")]
    #[case("roll30")]
    #[case("AQI")]
    fn test_unknown_field_names(#[case] name: &str) {
        assert_eq!(
            name.parse::<FeatureField>(),
            Err(FeatureError::UnknownField(name.to_string()))
        );
    }

    #[test]
    fn test_standard_schema_order() {
        let names = FeatureSchema::standard().names();
        assert_eq!(names.len(), 19);
        assert_eq!(names[0], "lag_1");
        assert_eq!(names[13], "lag_14");
        assert_eq!(&names[14..], &["roll7", "roll14", "dow", "mon", "doy"]);
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let result = FeatureSchema::from_names(&["lag_1", "dow", "lag_1"]);
        assert_eq!(result, Err(FeatureError::DuplicateField("lag_1".to_string())));
        let empty: [&str; 0] = [];
        assert_eq!(FeatureSchema::from_names(&empty), Err(FeatureError::EmptySchema));
    }

    #[test]
    fn test_build_at_full_history() {
        let prior: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        let features = FeatureBuilder::new().build_at(date(2024, 1, 21), &prior);

        assert_eq!(features.lag(1), Some(20.0));
        assert_eq!(features.lag(14), Some(7.0));
        assert_eq!(features.roll7, Some(17.0)); // mean of 14..=20
        assert_eq!(features.roll14, Some(13.5)); // mean of 7..=20
        assert!(features.is_complete(&FeatureSchema::standard()));
    }

    #[test]
    fn test_build_at_short_history_marks_missing() {
        let prior = [5.0, 6.0, 7.0, 8.0, 9.0];
        let features = FeatureBuilder::new().build_at(date(2024, 3, 1), &prior);
        let schema = FeatureSchema::standard();

        assert_eq!(features.lag(5), Some(5.0));
        assert_eq!(features.lag(6), None);
        assert_eq!(features.roll7, None);
        assert_eq!(features.roll14, None);
        assert_eq!((features.dow, features.mon, features.doy), (4, 3, 61));
        assert!(features.to_row(&schema).is_none());

        let missing = features.missing(&schema);
        assert_eq!(missing.len(), 9 + 2);
        assert!(missing.iter().all(FeatureField::is_history_dependent));
    }

    #[test]
    fn test_build_last_excludes_reference_value() {
        let values: Vec<f64> = (1..=15).map(|v| v as f64).collect();
        let features = FeatureBuilder::new().build_last(date(2024, 1, 15), &values);

        assert_eq!(features.reference_date, date(2024, 1, 15));
        assert_eq!(features.lag(1), Some(14.0));
        assert_eq!(features.lag(14), Some(1.0));
        assert_eq!(features.roll7, Some(11.0)); // mean of 8..=14

        let single = FeatureBuilder::new().build_last(date(2024, 1, 1), &[42.0]);
        assert_eq!(single.lag(1), None);
        let empty = FeatureBuilder::new().build_last(date(2024, 1, 1), &[]);
        assert_eq!(empty.roll7, None);
    }

    #[test]
    fn test_row_follows_schema_order() {
        let prior: Vec<f64> = (1..=14).map(|v| v as f64).collect();
        let features = FeatureBuilder::new().build_at(date(2024, 3, 1), &prior);
        let schema = FeatureSchema::from_names(&["doy", "lag_2", "roll7"]).unwrap();

        assert_eq!(features.to_row(&schema), Some(vec![61.0, 13.0, 11.0]));
    }
}
