//! Bureau of Labor Statistics (BLS) public data API client.
//!
//! Pulls Current Employment Statistics series for the state's construction
//! sector. Series are returned most recent observation first.
//!
//! # API Reference
//!
//! See: <https://www.bls.gov/developers/api_signature_v2.htm>
//!
//! # Authentication
//!
//! A registration key is sent both as the `BLS-API-KEY` header and as the
//! `registrationkey` body field.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{SourceError, require_records, send_json};
use crate::model::{LaborSeries, SeriesPoint, SourceEnvelope, SourceName};

/// Base URL for the BLS API.
const BLS_API_BASE: &str = "https://api.bls.gov/publicAPI/v2";

const SOURCE: SourceName = SourceName::LaborStatistics;

/// Status string BLS reports for a request it processed.
const REQUEST_SUCCEEDED: &str = "REQUEST_SUCCEEDED";

// CES series ids encode the state (the "20" after "CES" here). These
// defaults are New Jersey's; pointing `SITESTATS_STATE` elsewhere needs a
// matching `SITESTATS_EMPLOYMENT_SERIES` as well.

/// New Jersey construction employment, the default headline series.
pub const CONSTRUCTION_EMPLOYMENT_SERIES: &str = "CES2023230001";

/// New Jersey construction wages.
pub const CONSTRUCTION_WAGES_SERIES: &str = "CES2023230002";

/// New Jersey total nonfarm employment.
pub const TOTAL_NONFARM_SERIES: &str = "CES2023600001";

/// Client for the BLS time series endpoint.
#[derive(Clone)]
pub struct BlsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    series_ids: Vec<String>,
    start_year: i32,
    end_year: i32,
}

impl BlsClient {
    /// Create a new BLS client for the default construction series.
    ///
    /// # Arguments
    ///
    /// * `api_key` - BLS registration key.
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(BLS_API_BASE, api_key)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            series_ids: vec![
                CONSTRUCTION_EMPLOYMENT_SERIES.to_string(),
                CONSTRUCTION_WAGES_SERIES.to_string(),
                TOTAL_NONFARM_SERIES.to_string(),
            ],
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

    /// Replace the requested series identifiers.
    pub fn with_series(mut self, series_ids: Vec<String>) -> Self {
        self.series_ids = series_ids;
        self
    }

    /// Request `series_id` first, followed by the default companion series.
    pub fn with_headline_series(self, series_id: &str) -> Self {
        let mut series_ids = vec![series_id.to_string()];
        for companion in [CONSTRUCTION_WAGES_SERIES, TOTAL_NONFARM_SERIES] {
            if companion != series_id {
                series_ids.push(companion.to_string());
            }
        }
        self.with_series(series_ids)
    }

    /// Series identifiers sent with each request.
    pub fn series_ids(&self) -> &[String] {
        &self.series_ids
    }

    /// Fetch all configured series.
    ///
    /// Never fails; problems are reported inside the envelope.
    #[instrument(skip(self), fields(start_year = self.start_year, end_year = self.end_year))]
    pub async fn fetch(&self) -> SourceEnvelope<Vec<LaborSeries>> {
        let result = self.try_fetch().await;

        match &result {
            Ok(series) => info!(series = series.len(), "BLS series fetched"),
            Err(e) => warn!(error = %e, shape = e.is_shape_failure(), "BLS fetch failed"),
        }

        SourceEnvelope::from_result(result)
    }

    /// Fetch and validate the configured series.
    pub async fn try_fetch(&self) -> Result<Vec<LaborSeries>, SourceError> {
        let url = format!("{}/timeseries/data/", self.base_url);
        let body = BlsRequest {
            seriesid: &self.series_ids,
            startyear: self.start_year.to_string(),
            endyear: self.end_year.to_string(),
            registrationkey: &self.api_key,
        };

        let request = self
            .client
            .post(&url)
            .header("BLS-API-KEY", &self.api_key)
            .json(&body);

        let response: BlsResponse = send_json(SOURCE, request).await?;

        if let Some(status) = &response.status {
            if status != REQUEST_SUCCEEDED {
                let message = if response.message.is_empty() {
                    status.clone()
                } else {
                    response.message.join("; ")
                };
                return Err(SourceError::Rejected(SOURCE, message));
            }
        }

        let series = require_records(SOURCE, response.results.and_then(|r| r.series))?;

        series
            .into_iter()
            .map(|s| s.into_labor_series().map_err(|e| SourceError::Malformed(SOURCE, e)))
            .collect()
    }
}

// ============================================================================
// Request and response types
// ============================================================================

#[derive(Serialize)]
struct BlsRequest<'a> {
    seriesid: &'a [String],
    startyear: String,
    endyear: String,
    registrationkey: &'a str,
}

/// Response from the BLS time series endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BlsResponse {
    /// Processing status, e.g. "REQUEST_SUCCEEDED" or "REQUEST_NOT_PROCESSED".
    #[serde(default)]
    pub status: Option<String>,

    /// Provider messages (quota warnings, rejection reasons).
    #[serde(default)]
    pub message: Vec<String>,

    #[serde(default, rename = "Results")]
    pub results: Option<BlsResults>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlsResults {
    #[serde(default)]
    pub series: Option<Vec<BlsSeries>>,
}

/// A series as BLS encodes it: every field is a string.
#[derive(Debug, Clone, Deserialize)]
pub struct BlsSeries {
    #[serde(rename = "seriesID")]
    pub series_id: String,

    #[serde(default, rename = "seriesTitle")]
    pub title: String,

    #[serde(default)]
    pub data: Vec<BlsDataPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlsDataPoint {
    pub year: String,

    pub period: String,

    #[serde(default, rename = "periodName")]
    pub period_name: String,

    pub value: String,
}

impl BlsSeries {
    /// Parse the string-typed observations into a [`LaborSeries`].
    pub fn into_labor_series(self) -> Result<LaborSeries, String> {
        let series_id = self.series_id;
        let points = self
            .data
            .into_iter()
            .map(|point| -> Result<SeriesPoint, String> {
                let year = point.year.trim().parse::<i32>().map_err(|_| {
                    format!("series {} has invalid year '{}'", series_id, point.year)
                })?;
                // `f64::from_str` also takes "NaN" and "inf"; neither is a reading.
                let value = point
                    .value
                    .trim()
                    .replace(',', "")
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        format!(
                            "series {} has non-numeric value '{}' for {} {}",
                            series_id, point.value, point.year, point.period
                        )
                    })?;

                Ok(SeriesPoint {
                    year,
                    period: point.period,
                    value,
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series(values: &[&str]) -> BlsSeries {
        BlsSeries {
            series_id: CONSTRUCTION_EMPLOYMENT_SERIES.to_string(),
            title: "Construction employment".to_string(),
            data: values
                .iter()
                .enumerate()
                .map(|(i, v)| BlsDataPoint {
                    year: "2024".to_string(),
                    period: format!("M{:02}", 12 - i),
                    period_name: String::new(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_series_conversion() {
        let series = sample_series(&["158000", "155,000"]).into_labor_series().unwrap();

        assert_eq!(series.series_id, CONSTRUCTION_EMPLOYMENT_SERIES);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].value, 158000.0);
        assert_eq!(series.points[1].value, 155000.0);
        assert_eq!(series.points[0].period, "M12");
    }

    #[test]
    fn test_series_conversion_rejects_placeholder_values() {
        let err = sample_series(&["158000", "-"]).into_labor_series().unwrap_err();
        assert!(err.contains("non-numeric value '-'"));
    }

    #[test]
    fn test_series_conversion_rejects_non_finite_values() {
        for value in ["NaN", "inf", "-infinity"] {
            let err = sample_series(&[value, "155000"]).into_labor_series().unwrap_err();
            assert!(err.contains(&format!("non-numeric value '{}'", value)), "{}", err);
        }
    }

    #[test]
    fn test_headline_series_leads_request() {
        let client = BlsClient::new("key").with_headline_series("CES3623230001");
        assert_eq!(
            client.series_ids(),
            ["CES3623230001", CONSTRUCTION_WAGES_SERIES, TOTAL_NONFARM_SERIES]
        );

        let client = BlsClient::new("key").with_headline_series(CONSTRUCTION_WAGES_SERIES);
        assert_eq!(
            client.series_ids(),
            [CONSTRUCTION_WAGES_SERIES, TOTAL_NONFARM_SERIES]
        );
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "status": "REQUEST_SUCCEEDED",
            "responseTime": 120,
            "message": [],
            "Results": {
                "series": [
                    {
                        "seriesID": "CES2023230001",
                        "data": [
                            {"year": "2024", "period": "M12", "periodName": "December", "value": "158000"}
                        ]
                    }
                ]
            }
        }"#;

        let response: BlsResponse = serde_json::from_str(json).unwrap();
        let series = response.results.unwrap().series.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].data[0].period_name, "December");
    }

    #[test]
    fn test_response_without_results() {
        let json = r#"{"status": "REQUEST_SUCCEEDED", "message": []}"#;
        let response: BlsResponse = serde_json::from_str(json).unwrap();
        assert!(response.results.is_none());
    }
}
