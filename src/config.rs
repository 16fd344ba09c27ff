//! Configuration Module
//!
//! Runtime settings read from `LOCATOR_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::location::{Position, Precision};
use crate::session::{SessionConfig, DEFAULT_REPORT_PERIOD};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub report_interval: Duration,
    pub request_timeout: Duration,
    pub precision: Precision,
    pub log_dir: PathBuf,
    /// Vehicle shared by the headless host
    pub vehicle_id: Option<String>,
    /// Fixed position served by the headless host
    pub fixed_position: Option<Position>,
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = get("LOCATOR_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_base_url = Url::parse(raw_url.trim())
            .map_err(|e| ConfigError::Invalid("LOCATOR_API_URL", e.to_string()))?;
        if api_base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid("LOCATOR_API_URL", "not a base URL".into()));
        }

        let report_interval = match get("LOCATOR_REPORT_INTERVAL_SECS") {
            Some(v) => parse_secs("LOCATOR_REPORT_INTERVAL_SECS", &v)?,
            None => DEFAULT_REPORT_PERIOD,
        };
        let request_timeout = match get("LOCATOR_REQUEST_TIMEOUT_SECS") {
            Some(v) => parse_secs("LOCATOR_REQUEST_TIMEOUT_SECS", &v)?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let precision = match get("LOCATOR_PRECISION") {
            Some(v) => v.parse().map_err(|e| ConfigError::Invalid("LOCATOR_PRECISION", e))?,
            None => Precision::default(),
        };

        let log_dir = get("LOCATOR_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_log_directory);

        let fixed_position = match (get("LOCATOR_LATITUDE"), get("LOCATOR_LONGITUDE")) {
            (Some(lat), Some(lon)) => Some(Position::new(
                parse_coordinate("LOCATOR_LATITUDE", &lat, 90.0)?,
                parse_coordinate("LOCATOR_LONGITUDE", &lon, 180.0)?,
            )),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(
                    "LOCATOR_LATITUDE",
                    "latitude and longitude must be set together".into(),
                ))
            }
        };

        Ok(Self {
            api_base_url,
            report_interval,
            request_timeout,
            precision,
            log_dir,
            vehicle_id: get("LOCATOR_VEHICLE_ID"),
            fixed_position,
        })
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            period: self.report_interval,
            precision: self.precision,
        }
    }
}

fn parse_secs(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::Invalid(key, e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::Invalid(key, "must be greater than zero".into()));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_coordinate(key: &'static str, raw: &str, limit: f64) -> Result<f64, ConfigError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| ConfigError::Invalid(key, e.to_string()))?;
    if !value.is_finite() || value.abs() > limit {
        return Err(ConfigError::Invalid(key, format!("{} is out of range", value)));
    }
    Ok(value)
}

fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("VehicleLocator")
        .join("logs")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.report_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.precision, Precision::High);
        assert!(config.vehicle_id.is_none());
        assert!(config.fixed_position.is_none());
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("LOCATOR_API_URL", "http://192.168.0.31:5000"),
            ("LOCATOR_REPORT_INTERVAL_SECS", "15"),
            ("LOCATOR_PRECISION", "balanced"),
            ("LOCATOR_VEHICLE_ID", "V123"),
            ("LOCATOR_LATITUDE", "37.7"),
            ("LOCATOR_LONGITUDE", "-122.4"),
            ("LOCATOR_LOG_DIR", "/tmp/locator"),
        ])
        .unwrap();

        assert_eq!(config.session().period, Duration::from_secs(15));
        assert_eq!(config.session().precision, Precision::Balanced);
        assert_eq!(config.vehicle_id.as_deref(), Some("V123"));
        assert_eq!(config.fixed_position, Some(Position::new(37.7, -122.4)));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/locator"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("LOCATOR_REPORT_INTERVAL_SECS", "0")]).is_err());
        assert!(load(&[("LOCATOR_REPORT_INTERVAL_SECS", "soon")]).is_err());
        assert!(load(&[("LOCATOR_API_URL", "not a url")]).is_err());
        assert!(load(&[("LOCATOR_API_URL", "mailto:fleet@example.com")]).is_err());
        assert!(load(&[("LOCATOR_LATITUDE", "91"), ("LOCATOR_LONGITUDE", "0")]).is_err());
        assert!(load(&[("LOCATOR_LATITUDE", "10")]).is_err());
    }
}
