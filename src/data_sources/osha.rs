//! OSHA enforcement data client.
//!
//! Lists workplace-safety inspections of establishments in the configured
//! state.
//!
//! # Authentication
//!
//! Requires a bearer token issued by the Department of Labor data portal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{SourceError, require_records, send_json};
use crate::model::{SourceEnvelope, SourceName};

/// Base URL for the OSHA data API.
const OSHA_API_BASE: &str = "https://data.osha.gov/api/v1";

const SOURCE: SourceName = SourceName::Safety;

/// Inspections requested per call.
const INSPECTION_LIMIT: u32 = 100;

/// Client for the OSHA inspections endpoint.
#[derive(Clone)]
pub struct OshaClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    state: String,
}

impl OshaClient {
    /// Create a new OSHA client.
    ///
    /// # Arguments
    ///
    /// * `api_token` - Bearer token for the data portal.
    /// * `state` - Two-letter state code to filter inspections by.
    pub fn new(api_token: &str, state: &str) -> Self {
        Self::with_base_url(OSHA_API_BASE, api_token, state)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, api_token: &str, state: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            state: state.to_uppercase(),
        }
    }

    /// Use a shared HTTP client (carrying timeouts and connection pool).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Fetch inspections for the state.
    ///
    /// Never fails; problems are reported inside the envelope.
    #[instrument(skip(self), fields(state = %self.state))]
    pub async fn fetch(&self) -> SourceEnvelope<Vec<Inspection>> {
        let result = self.try_fetch().await;

        match &result {
            Ok(inspections) => info!(inspections = inspections.len(), "OSHA inspections fetched"),
            Err(e) => warn!(error = %e, shape = e.is_shape_failure(), "OSHA fetch failed"),
        }

        SourceEnvelope::from_result(result)
    }

    /// Fetch and validate inspections.
    pub async fn try_fetch(&self) -> Result<Vec<Inspection>, SourceError> {
        let url = format!(
            "{}/inspections?state={}&limit={}&offset=0",
            self.base_url,
            urlencoding::encode(&self.state),
            INSPECTION_LIMIT
        );

        let request = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token));

        let response: InspectionsResponse = send_json(SOURCE, request).await?;
        require_records(SOURCE, response.results)
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Response from the inspections endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectionsResponse {
    #[serde(default)]
    pub results: Option<Vec<Inspection>>,
}

/// A single OSHA inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    /// OSHA activity number.
    #[serde(default)]
    pub activity_nr: String,

    /// Establishment name.
    #[serde(default)]
    pub estab_name: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub state: String,

    /// Opening date (YYYY-MM-DD).
    #[serde(default)]
    pub inspection_date: String,

    /// e.g. "Planned", "Complaint", "Accident".
    #[serde(default)]
    pub inspection_type: String,

    /// Violation classification, absent when the inspection found none.
    #[serde(default)]
    pub violation_type: Option<String>,

    #[serde(default)]
    pub penalty_amount: f64,
}

impl Inspection {
    /// Whether a violation was recorded.
    pub fn has_violation(&self) -> bool {
        self.violation_type
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    /// Parse the inspection date. Accepts a plain date or an RFC 3339 timestamp.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.inspection_date.get(..10)?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}
