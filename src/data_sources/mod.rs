//! Clients for the public statistics APIs behind the dashboard.
//!
//! Each client wraps exactly one upstream call with fixed parameters and
//! folds the reply, or the failure, into a [`SourceEnvelope`]. A client's
//! `fetch` never returns an error to its caller.
//!
//! # Data Sources
//!
//! - [`bls`]: Bureau of Labor Statistics employment series
//! - [`usaspending`]: USAspending.gov federal contract awards
//! - [`osha`]: OSHA workplace-safety inspections
//! - [`dol`]: Department of Labor time series
//!
//! [`SourceEnvelope`]: crate::model::SourceEnvelope

use serde::de::DeserializeOwned;

use crate::model::SourceName;

pub mod bls;
pub mod dol;
pub mod osha;
pub mod usaspending;

pub use bls::BlsClient;
pub use dol::DolClient;
pub use osha::OshaClient;
pub use usaspending::UsaSpendingClient;

/// Why a single source fetch failed.
///
/// Transport and shape failures render differently so they can be told
/// apart in logs and on the status cards.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The request never produced a response.
    #[error("{0} API Error: {1}")]
    Transport(SourceName, String),

    /// The provider answered with a non-2xx status.
    #[error("{0} API Error: HTTP {1}")]
    Status(SourceName, u16),

    /// The provider answered 2xx but reported failure in the body.
    #[error("{0} API Error: {1}")]
    Rejected(SourceName, String),

    /// The body could not be decoded into the provider's schema.
    #[error("{0} response malformed: {1}")]
    Malformed(SourceName, String),

    /// The expected payload field was absent or empty.
    #[error("No {0} data found")]
    NoData(SourceName),
}

impl SourceError {
    /// True for failures where the provider's reply had the wrong shape.
    pub fn is_shape_failure(&self) -> bool {
        matches!(self, SourceError::Malformed(..) | SourceError::NoData(_))
    }
}

/// Send a prepared request and decode a JSON body.
///
/// Non-2xx statuses and undecodable bodies are mapped onto the
/// [`SourceError`] taxonomy for `source`.
pub(crate) async fn send_json<R: DeserializeOwned>(
    source: SourceName,
    request: reqwest::RequestBuilder,
) -> Result<R, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| SourceError::Transport(source, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(source, status.as_u16()));
    }

    response.json::<R>().await.map_err(|e| {
        if e.is_decode() {
            SourceError::Malformed(source, e.to_string())
        } else {
            SourceError::Transport(source, e.to_string())
        }
    })
}

/// Treat an absent or empty payload list as "no data".
pub(crate) fn require_records<T>(
    source: SourceName,
    records: Option<Vec<T>>,
) -> Result<Vec<T>, SourceError> {
    match records {
        Some(records) if !records.is_empty() => Ok(records),
        _ => Err(SourceError::NoData(source)),
    }
}
