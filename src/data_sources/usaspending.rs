//! USAspending.gov award search client.
//!
//! Lists federal contract awards to construction-sector (NAICS 23)
//! recipients located in the configured state, largest obligations first.
//!
//! # API Reference
//!
//! See: <https://api.usaspending.gov/docs/endpoints>
//!
//! No authentication is required.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{SourceError, require_records, send_json};
use crate::model::{SourceEnvelope, SourceName};

/// Base URL for the USAspending API.
const USASPENDING_API_BASE: &str = "https://api.usaspending.gov/api/v2";

const SOURCE: SourceName = SourceName::Spending;

/// Contract award type codes (definitive contracts, purchase orders, delivery orders, BPA calls).
const CONTRACT_AWARD_TYPES: [&str; 4] = ["A", "B", "C", "D"];

/// NAICS sector for construction.
const CONSTRUCTION_NAICS: &str = "23";

const AWARD_FIELDS: [&str; 6] = [
    "award_id",
    "recipient_name",
    "total_obligation",
    "award_date",
    "naics_code",
    "naics_description",
];

/// Page size requested from the award search.
const PAGE_LIMIT: u32 = 50;

/// Client for the USAspending award search endpoint.
#[derive(Clone)]
pub struct UsaSpendingClient {
    client: reqwest::Client,
    base_url: String,
    state: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl UsaSpendingClient {
    /// Create a client for awards to recipients in `state` (two-letter code).
    pub fn new(state: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self::with_base_url(USASPENDING_API_BASE, state, start_date, end_date)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(
        base_url: &str,
        state: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            state: state.to_uppercase(),
            start_date,
            end_date,
        }
    }

    /// Use a shared HTTP client (carrying timeouts and connection pool).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Fetch contract awards.
    ///
    /// Never fails; problems are reported inside the envelope.
    #[instrument(skip(self), fields(state = %self.state))]
    pub async fn fetch(&self) -> SourceEnvelope<Vec<ContractAward>> {
        let result = self.try_fetch().await;

        match &result {
            Ok(awards) => info!(contracts = awards.len(), "USA Spending awards fetched"),
            Err(e) => warn!(error = %e, shape = e.is_shape_failure(), "USA Spending fetch failed"),
        }

        SourceEnvelope::from_result(result)
    }

    /// Fetch and validate contract awards.
    pub async fn try_fetch(&self) -> Result<Vec<ContractAward>, SourceError> {
        let url = format!("{}/search/spending_by_award/", self.base_url);
        let request = self.client.post(&url).json(&self.request_body());

        let response: AwardSearchResponse = send_json(SOURCE, request).await?;
        require_records(SOURCE, response.results)
    }

    fn request_body(&self) -> serde_json::Value {
        json!({
            "filters": {
                "award_type_codes": CONTRACT_AWARD_TYPES,
                "naics_codes": [CONSTRUCTION_NAICS],
                "recipient_locations": [{ "country": "USA", "state": self.state }],
                "time_period": [{
                    "start_date": self.start_date.format("%Y-%m-%d").to_string(),
                    "end_date": self.end_date.format("%Y-%m-%d").to_string(),
                }],
            },
            "fields": AWARD_FIELDS,
            "page": 1,
            "limit": PAGE_LIMIT,
            "sort": "total_obligation",
            "order": "desc",
        })
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Response from the award search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AwardSearchResponse {
    #[serde(default)]
    pub results: Option<Vec<ContractAward>>,
}

/// A federal contract award.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAward {
    #[serde(default)]
    pub award_id: String,

    #[serde(default)]
    pub recipient_name: String,

    /// Obligated amount in dollars.
    #[serde(default)]
    pub total_obligation: f64,

    #[serde(default)]
    pub award_date: String,

    #[serde(default)]
    pub naics_code: String,

    #[serde(default)]
    pub naics_description: String,
}

impl ContractAward {
    /// Parse the award date (YYYY-MM-DD).
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.award_date, "%Y-%m-%d").ok()
    }
}
