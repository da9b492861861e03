//! Department of Labor (DOL) time series client.
//!
//! Fetches a single labor-market series for the state. Unlike BLS, DOL
//! returns observation values as JSON numbers.
//!
//! # Authentication
//!
//! Requires a bearer token.

use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::bls::CONSTRUCTION_EMPLOYMENT_SERIES;
use super::{SourceError, require_records, send_json};
use crate::model::{LaborSeries, SeriesPoint, SourceEnvelope, SourceName};

/// Base URL for the DOL API.
const DOL_API_BASE: &str = "https://api.dol.gov/v1";

const SOURCE: SourceName = SourceName::LaborMarket;

/// Client for the DOL time series endpoint.
#[derive(Clone)]
pub struct DolClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    series_id: String,
    start_year: i32,
    end_year: i32,
}

impl DolClient {
    /// Create a new DOL client for the construction employment series.
    pub fn new(api_token: &str) -> Self {
        Self::with_base_url(DOL_API_BASE, api_token)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, api_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            series_id: CONSTRUCTION_EMPLOYMENT_SERIES.to_string(),
            start_year: 2020,
            end_year: 2024,
        }
    }

    /// Use a shared HTTP client (carrying timeouts and connection pool).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the inclusive year range requested.
    pub fn with_years(mut self, start_year: i32, end_year: i32) -> Self {
        self.start_year = start_year;
        self.end_year = end_year;
        self
    }

    /// Replace the requested series identifier.
    pub fn with_series(mut self, series_id: &str) -> Self {
        self.series_id = series_id.to_string();
        self
    }

    /// Fetch the configured series.
    ///
    /// Never fails; problems are reported inside the envelope.
    #[instrument(skip(self), fields(series_id = %self.series_id))]
    pub async fn fetch(&self) -> SourceEnvelope<Vec<LaborSeries>> {
        let result = self.try_fetch().await;

        match &result {
            Ok(series) => info!(series = series.len(), "DOL series fetched"),
            Err(e) => warn!(error = %e, shape = e.is_shape_failure(), "DOL fetch failed"),
        }

        SourceEnvelope::from_result(result)
    }

    /// Fetch and validate the configured series.
    pub async fn try_fetch(&self) -> Result<Vec<LaborSeries>, SourceError> {
        let url = format!(
            "{}/timeseries?series_id={}&start_year={}&end_year={}",
            self.base_url,
            urlencoding::encode(&self.series_id),
            self.start_year,
            self.end_year
        );

        let request = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token));

        let response: DolResponse = send_json(SOURCE, request).await?;
        let series = require_records(SOURCE, response.series)?;

        series
            .into_iter()
            .map(|s| s.into_labor_series().map_err(|e| SourceError::Malformed(SOURCE, e)))
            .collect()
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Response from the DOL time series endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DolResponse {
    #[serde(default)]
    pub series: Option<Vec<DolSeries>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DolSeries {
    pub series_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub data: Vec<DolDataPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DolDataPoint {
    pub year: String,

    pub period: String,

    pub value: f64,
}

impl DolSeries {
    /// Convert into the shared [`LaborSeries`] shape.
    pub fn into_labor_series(self) -> Result<LaborSeries, String> {
        let series_id = self.series_id;
        let points = self
            .data
            .into_iter()
            .map(|point| -> Result<SeriesPoint, String> {
                let year = point.year.trim().parse::<i32>().map_err(|_| {
                    format!("series {} has invalid year '{}'", series_id, point.year)
                })?;

                Ok(SeriesPoint {
                    year,
                    period: point.period,
                    value: point.value,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(LaborSeries {
            series_id,
            title: self.title,
            points,
        })
    }
}
