//! Process configuration, resolved once at startup from the environment.
//!
//! Credentials are never compiled in. A source whose credential is not set
//! is skipped and shows as unavailable.

use std::env;
use std::time::Duration;

use chrono::NaiveDate;

use crate::data_sources::bls::CONSTRUCTION_EMPLOYMENT_SERIES;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Default state the dashboard covers.
pub const DEFAULT_STATE: &str = "NJ";

/// A configuration value could not be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be a date (YYYY-MM-DD), got '{value}'")]
    InvalidDate { name: &'static str, value: String },

    #[error("{name} must be a two-letter state code, got '{value}'")]
    InvalidState { name: &'static str, value: String },

    #[error("{start_name} ({start}) is after {end_name} ({end})")]
    InvertedRange {
        start_name: &'static str,
        start: String,
        end_name: &'static str,
        end: String,
    },
}

/// Dashboard configuration.
#[derive(Clone)]
pub struct DashboardConfig {
    /// Listen port for the HTTP API.
    pub port: u16,

    /// Two-letter state code used as the jurisdiction filter.
    pub state: String,

    /// First year requested from the labor series.
    pub start_year: i32,

    /// Last year requested from the labor series.
    pub end_year: i32,

    /// Award date range for the spending search.
    pub spending_start: NaiveDate,
    pub spending_end: NaiveDate,

    /// Series whose latest value is reported as total employment.
    pub employment_series: String,

    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,

    /// BLS registration key.
    pub bls_api_key: Option<String>,

    /// OSHA bearer token.
    pub osha_api_token: Option<String>,

    /// DOL bearer token.
    pub dol_api_token: Option<String>,

    /// Base URL overrides, mostly for staging and tests.
    pub bls_base_url: Option<String>,
    pub spending_base_url: Option<String>,
    pub osha_base_url: Option<String>,
    pub dol_base_url: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            state: DEFAULT_STATE.to_string(),
            start_year: 2020,
            end_year: 2024,
            spending_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            spending_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            employment_series: CONSTRUCTION_EMPLOYMENT_SERIES.to_string(),
            request_timeout: None,
            bls_api_key: None,
            osha_api_token: None,
            dol_api_token: None,
            bls_base_url: None,
            spending_base_url: None,
            osha_base_url: None,
            dol_base_url: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Unset and blank variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(port) = get("SITESTATS_PORT") {
            config.port = parse_number("SITESTATS_PORT", &port)?;
        }

        if let Some(state) = get("SITESTATS_STATE") {
            if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::InvalidState {
                    name: "SITESTATS_STATE",
                    value: state,
                });
            }
            config.state = state.to_uppercase();
        }

        if let Some(year) = get("SITESTATS_START_YEAR") {
            config.start_year = parse_number("SITESTATS_START_YEAR", &year)?;
        }
        if let Some(year) = get("SITESTATS_END_YEAR") {
            config.end_year = parse_number("SITESTATS_END_YEAR", &year)?;
        }
        if config.start_year > config.end_year {
            return Err(ConfigError::InvertedRange {
                start_name: "SITESTATS_START_YEAR",
                start: config.start_year.to_string(),
                end_name: "SITESTATS_END_YEAR",
                end: config.end_year.to_string(),
            });
        }

        if let Some(date) = get("SITESTATS_SPENDING_START") {
            config.spending_start = parse_date("SITESTATS_SPENDING_START", &date)?;
        }
        if let Some(date) = get("SITESTATS_SPENDING_END") {
            config.spending_end = parse_date("SITESTATS_SPENDING_END", &date)?;
        }
        if config.spending_start > config.spending_end {
            return Err(ConfigError::InvertedRange {
                start_name: "SITESTATS_SPENDING_START",
                start: config.spending_start.to_string(),
                end_name: "SITESTATS_SPENDING_END",
                end: config.spending_end.to_string(),
            });
        }

        if let Some(series) = get("SITESTATS_EMPLOYMENT_SERIES") {
            config.employment_series = series;
        }

        if let Some(secs) = get("SITESTATS_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number("SITESTATS_REQUEST_TIMEOUT_SECS", &secs)?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        config.bls_api_key = get("BLS_API_KEY");
        config.osha_api_token = get("OSHA_API_TOKEN");
        config.dol_api_token = get("DOL_API_TOKEN");

        config.bls_base_url = get("SITESTATS_BLS_URL");
        config.spending_base_url = get("SITESTATS_SPENDING_URL");
        config.osha_base_url = get("SITESTATS_OSHA_URL");
        config.dol_base_url = get("SITESTATS_DOL_URL");

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

fn parse_date(name: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        name,
        value: value.to_string(),
    })
}
