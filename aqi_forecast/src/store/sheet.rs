//! Parsing and cleaning of the AQI sheet CSV export
//!
//! Expected header columns are `Date` (`MM/DD/YYYY`), `City` and `AQI`;
//! other columns are ignored.

use super::{SeriesSnapshot, SeriesSource};
use crate::data::{Division, Observation, Series};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const DATE_FORMAT: &str = "%m/%d/%Y";
const REQUIRED_COLUMNS: [&str; 3] = ["Date", "City", "AQI"];

type RawPoint = (NaiveDate, Option<f64>);

#[derive(Debug, Deserialize)]
struct SheetRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "AQI", default)]
    aqi: Option<String>,
}

/// Parse and clean a sheet export into per-division series
pub fn parse_sheet<R: Read>(reader: R) -> Result<HashMap<Division, Series>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ForecastError::DataSource(format!(
                "missing required column '{}'",
                column
            )));
        }
    }

    let mut grouped: BTreeMap<Division, Vec<RawPoint>> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in csv_reader.deserialize::<SheetRow>() {
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                debug!(error = %e, "dropping undecodable row");
                skipped += 1;
                continue;
            }
        };
        let Some(division) = Division::from_source_name(&row.city) else {
            skipped += 1;
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(&row.date, DATE_FORMAT) else {
            debug!(city = %row.city, date = %row.date, "dropping row with unparsable date");
            skipped += 1;
            continue;
        };
        let value = row
            .aqi
            .and_then(|aqi| aqi.parse::<f64>().ok())
            .filter(|v| v.is_finite());
        grouped.entry(division).or_default().push((date, value));
    }

    if skipped > 0 {
        debug!(skipped, "rows dropped: undecodable, bad date or unknown city");
    }

    let mut out = HashMap::with_capacity(grouped.len());
    for (division, rows) in grouped {
        let rows = collapse_duplicates(rows);
        let raw: Vec<Option<f64>> = rows.iter().map(|(_, v)| *v).collect();
        let Some(values) = interpolate(&raw) else {
            debug!(%division, "no numeric AQI values, division skipped");
            continue;
        };
        let observations = rows
            .iter()
            .zip(values)
            .map(|((date, _), value)| Observation::new(*date, value))
            .collect();
        out.insert(division, Series::new(observations)?);
    }

    Ok(out)
}

/// Sort by date and keep one row per date
///
/// For repeated dates the last row with a value wins; a date only keeps a
/// missing value if none of its rows had one.
fn collapse_duplicates(mut rows: Vec<RawPoint>) -> Vec<RawPoint> {
    rows.sort_by_key(|(date, _)| *date);
    let mut out: Vec<RawPoint> = Vec::with_capacity(rows.len());
    for (date, value) in rows {
        match out.last_mut() {
            Some((last_date, last_value)) if *last_date == date => {
                if value.is_some() {
                    *last_value = value;
                }
            }
            _ => out.push((date, value)),
        }
    }
    out
}

/// Fill gaps linearly by position; edges take the nearest known value
///
/// Returns `None` when no value is known.
fn interpolate(raw: &[Option<f64>]) -> Option<Vec<f64>> {
    let known: Vec<(usize, f64)> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let (first_idx, first_val) = *known.first()?;
    let (last_idx, last_val) = *known.last()?;

    let mut out = Vec::with_capacity(raw.len());
    let mut segment = 0usize;
    for i in 0..raw.len() {
        let value = if i <= first_idx {
            first_val
        } else if i >= last_idx {
            last_val
        } else {
            while known[segment + 1].0 < i {
                segment += 1;
            }
            let (a, va) = known[segment];
            let (b, vb) = known[segment + 1];
            if i == b {
                vb
            } else {
                va + (vb - va) * (i - a) as f64 / (b - a) as f64
            }
        };
        out.push(value);
    }
    Some(out)
}

/// Reads the sheet export from a local CSV file on every fetch
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeriesSource for CsvFileSource {
    fn fetch(&self) -> Result<SeriesSnapshot> {
        let file = File::open(&self.path)?;
        let series = parse_sheet(file)?;
        Ok(SeriesSnapshot::new(series))
    }
}
