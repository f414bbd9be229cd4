//! Runtime configuration loaded from the process environment

use crate::engine::DEFAULT_HORIZON;
use crate::error::{ForecastError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ForecastError::Config(format!(
                "unsupported log format '{}', expected 'text' or 'json'",
                other
            ))),
        }
    }
}

/// Snapshot of configuration values consumed by the service
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// CSV export of the AQI sheet
    pub data_path: PathBuf,
    /// Directory holding one `<Division>.json` model per division
    pub models_dir: PathBuf,
    /// Maximum age of the cached series snapshot, in seconds
    pub cache_secs: u64,
    pub horizon: usize,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/aqi.csv"),
            models_dir: PathBuf::from("models"),
            cache_secs: 1800,
            horizon: DEFAULT_HORIZON,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Read `AQI_DATA_PATH`, `AQI_MODELS_DIR`, `CACHE_SECS`, `AQI_HORIZON`
    /// and `AQI_LOG_FORMAT`, falling back to defaults for unset keys
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cache_secs = match lookup("CACHE_SECS") {
            Some(raw) => parse_number("CACHE_SECS", &raw)?,
            None => defaults.cache_secs,
        };
        let horizon = match lookup("AQI_HORIZON") {
            Some(raw) => parse_number("AQI_HORIZON", &raw)?,
            None => defaults.horizon,
        };
        if horizon == 0 {
            return Err(ForecastError::Config(
                "AQI_HORIZON must be at least 1".to_string(),
            ));
        }
        let log_format = match lookup("AQI_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => defaults.log_format,
        };

        Ok(Self {
            data_path: lookup("AQI_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            models_dir: lookup("AQI_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            cache_secs,
            horizon,
            log_format,
        })
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_secs)
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        ForecastError::Config(format!("{} must be a non-negative integer, got '{}'", key, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.cache_max_age(), Duration::from_secs(1800));
        assert_eq!(cfg.horizon, 7);
    }

    #[test]
    fn test_overrides() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("AQI_DATA_PATH", "/srv/aqi.csv"),
            ("AQI_MODELS_DIR", "/srv/models"),
            ("CACHE_SECS", "60"),
            ("AQI_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("/srv/aqi.csv"));
        assert_eq!(cfg.models_dir, PathBuf::from("/srv/models"));
        assert_eq!(cfg.cache_secs, 60);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup_from(&[("CACHE_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ForecastError::Config(_)));
        assert!(AppConfig::from_lookup(lookup_from(&[("AQI_HORIZON", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("AQI_LOG_FORMAT", "xml")])).is_err());
    }
}
