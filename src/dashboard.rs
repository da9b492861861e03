//! Dashboard refresh: fan out to every source, then aggregate.
//!
//! A refresh launches each configured source client as its own task and
//! waits for all of them to settle. One source failing never stops the
//! others from being used; every outcome is recorded on its own.
//!
//! # Usage
//!
//! ```ignore
//! let dashboard = Dashboard::new(DashboardConfig::from_env()?)?;
//! let report = dashboard.refresh().await;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{Instrument, info, instrument, warn};

use crate::aggregation::{
    SafetySummary, SpendingTotals, TOP_CONTRACT_LIMIT, derive_metrics, top_contracts, trend,
};
use crate::config::DashboardConfig;
use crate::data_sources::osha::Inspection;
use crate::data_sources::usaspending::ContractAward;
use crate::data_sources::{BlsClient, DolClient, OshaClient, UsaSpendingClient};
use crate::model::{DashboardMetrics, LaborSeries, SourceEnvelope, SourceName, TrendPoint};
use crate::status::SourceStatus;

/// Prefix of the top-level refresh error shown above the cards.
const REFRESH_FAILED: &str = "Failed to fetch dashboard data";

/// A fault in the refresh itself, not attributable to a source's reply.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RefreshError {
    /// A source's fetch task panicked or was cancelled before settling.
    #[error("{name} fetch task failed: {message}")]
    TaskFailed { name: SourceName, message: String },
}

/// Envelopes from one refresh. `None` marks a source that never settled.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub labor_statistics: Option<SourceEnvelope<Vec<LaborSeries>>>,
    pub spending: Option<SourceEnvelope<Vec<ContractAward>>>,
    pub safety: Option<SourceEnvelope<Vec<Inspection>>>,
    pub labor_market: Option<SourceEnvelope<Vec<LaborSeries>>>,
}

impl SourceSet {
    /// Status of every source, keyed in display order.
    pub fn statuses(&self) -> BTreeMap<SourceName, SourceStatus> {
        BTreeMap::from([
            (
                SourceName::LaborStatistics,
                SourceStatus::from_envelope(SourceName::LaborStatistics, self.labor_statistics.as_ref()),
            ),
            (
                SourceName::Spending,
                SourceStatus::from_envelope(SourceName::Spending, self.spending.as_ref()),
            ),
            (
                SourceName::Safety,
                SourceStatus::from_envelope(SourceName::Safety, self.safety.as_ref()),
            ),
            (
                SourceName::LaborMarket,
                SourceStatus::from_envelope(SourceName::LaborMarket, self.labor_market.as_ref()),
            ),
        ])
    }
}

/// Result of [`Dashboard::fan_out`].
#[derive(Debug, Clone, Default)]
pub struct FanOut {
    pub sources: SourceSet,

    /// Tasks that did not settle normally.
    pub faults: Vec<RefreshError>,
}

/// Dashboard API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    /// When this report was generated.
    pub generated_at: DateTime<Utc>,

    pub metrics: DashboardMetrics,

    /// Status of every source.
    pub sources: BTreeMap<SourceName, SourceStatus>,

    /// Top-level refresh error, separate from per-source errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Single-source view backing the per-source pages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SourceDetail {
    LaborStatistics {
        status: SourceStatus,
        trend: Vec<TrendPoint>,
        series: Vec<LaborSeries>,
    },
    Spending {
        status: SourceStatus,
        totals: SpendingTotals,
        top_contracts: Vec<ContractAward>,
    },
    Safety {
        status: SourceStatus,
        summary: SafetySummary,
    },
    LaborMarket {
        status: SourceStatus,
        trend: Vec<TrendPoint>,
        series: Vec<LaborSeries>,
    },
}

impl DashboardReport {
    /// Derive metrics and statuses from settled sources.
    ///
    /// Faults are folded into one top-level error; their sources stay unset
    /// and are reported unavailable.
    pub fn from_fan_out(fan_out: FanOut, employment_series: &str) -> Self {
        let FanOut { sources, faults } = fan_out;

        let metrics = derive_metrics(
            sources.labor_statistics.as_ref(),
            sources.spending.as_ref(),
            employment_series,
        );

        let error = if faults.is_empty() {
            None
        } else {
            let details: Vec<String> = faults.iter().map(ToString::to_string).collect();
            warn!(faults = faults.len(), "Dashboard refresh had faults");
            Some(format!("{}: {}", REFRESH_FAILED, details.join("; ")))
        };

        Self {
            generated_at: Utc::now(),
            metrics,
            sources: sources.statuses(),
            error,
        }
    }
}

impl SourceDetail {
    pub fn status(&self) -> &SourceStatus {
        match self {
            SourceDetail::LaborStatistics { status, .. }
            | SourceDetail::Spending { status, .. }
            | SourceDetail::Safety { status, .. }
            | SourceDetail::LaborMarket { status, .. } => status,
        }
    }
}

/// Dashboard over the four statistics sources.
#[derive(Clone)]
pub struct Dashboard {
    config: Arc<DashboardConfig>,
    bls: Option<BlsClient>,
    spending: UsaSpendingClient,
    osha: Option<OshaClient>,
    dol: Option<DolClient>,
}

impl Dashboard {
    /// Create a new dashboard with the given configuration.
    ///
    /// Sources whose credential is missing are skipped on every refresh.
    pub fn new(config: DashboardConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let bls = config.bls_api_key.as_deref().map(|key| {
            let client = match &config.bls_base_url {
                Some(url) => BlsClient::with_base_url(url, key),
                None => BlsClient::new(key),
            };
            client
                .with_http_client(http.clone())
                .with_headline_series(&config.employment_series)
                .with_years(config.start_year, config.end_year)
        });

        let spending = match &config.spending_base_url {
            Some(url) => UsaSpendingClient::with_base_url(
                url,
                &config.state,
                config.spending_start,
                config.spending_end,
            ),
            None => UsaSpendingClient::new(&config.state, config.spending_start, config.spending_end),
        }
        .with_http_client(http.clone());

        let osha = config.osha_api_token.as_deref().map(|token| {
            let client = match &config.osha_base_url {
                Some(url) => OshaClient::with_base_url(url, token, &config.state),
                None => OshaClient::new(token, &config.state),
            };
            client.with_http_client(http.clone())
        });

        let dol = config.dol_api_token.as_deref().map(|token| {
            let client = match &config.dol_base_url {
                Some(url) => DolClient::with_base_url(url, token),
                None => DolClient::new(token),
            };
            client
                .with_http_client(http.clone())
                .with_series(&config.employment_series)
                .with_years(config.start_year, config.end_year)
        });

        for (source, configured) in [
            (SourceName::LaborStatistics, bls.is_some()),
            (SourceName::Safety, osha.is_some()),
            (SourceName::LaborMarket, dol.is_some()),
        ] {
            if !configured {
                warn!(source = %source, "No credential configured; source will be skipped");
            }
        }

        Ok(Self {
            bls,
            spending,
            osha,
            dol,
            config: Arc::new(config),
        })
    }

    /// Run every configured source concurrently and wait for all to settle.
    ///
    /// Each source runs in its own task. No source's failure short-circuits
    /// the others. A task that panics leaves its source unset and is
    /// reported as a fault.
    pub async fn fan_out(&self) -> FanOut {
        let labor = self
            .bls
            .clone()
            .map(|client| tokio::spawn(async move { client.fetch().await }.in_current_span()));
        let spending = {
            let client = self.spending.clone();
            Some(tokio::spawn(async move { client.fetch().await }.in_current_span()))
        };
        let safety = self
            .osha
            .clone()
            .map(|client| tokio::spawn(async move { client.fetch().await }.in_current_span()));
        let market = self
            .dol
            .clone()
            .map(|client| tokio::spawn(async move { client.fetch().await }.in_current_span()));

        let (labor, spending, safety, market) = tokio::join!(
            settle(SourceName::LaborStatistics, labor),
            settle(SourceName::Spending, spending),
            settle(SourceName::Safety, safety),
            settle(SourceName::LaborMarket, market),
        );

        let mut faults = Vec::new();
        let sources = SourceSet {
            labor_statistics: record(labor, &mut faults),
            spending: record(spending, &mut faults),
            safety: record(safety, &mut faults),
            labor_market: record(market, &mut faults),
        };

        FanOut { sources, faults }
    }

    /// Refresh every source and derive a fresh report.
    ///
    /// Always produces a report; a refresh-level fault is carried in
    /// [`DashboardReport::error`] alongside whatever did settle.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> DashboardReport {
        let fan_out = self.fan_out().await;
        let report = DashboardReport::from_fan_out(fan_out, &self.config.employment_series);

        let available = report.sources.values().filter(|s| s.is_available()).count();
        info!(
            available,
            total_employment = report.metrics.total_employment,
            contract_count = report.metrics.contract_count,
            "Dashboard refreshed"
        );

        report
    }

    /// Fetch one source alone and build its detail view.
    #[instrument(skip(self))]
    pub async fn source_detail(&self, source: SourceName) -> SourceDetail {
        match source {
            SourceName::LaborStatistics => {
                let envelope = match &self.bls {
                    Some(client) => Some(client.fetch().await),
                    None => None,
                };
                let series = envelope.as_ref().map(|e| e.data.clone()).unwrap_or_default();
                SourceDetail::LaborStatistics {
                    status: SourceStatus::from_envelope(source, envelope.as_ref()),
                    trend: self.series_trend(&series),
                    series,
                }
            }
            SourceName::Spending => {
                let envelope = self.spending.fetch().await;
                SourceDetail::Spending {
                    status: SourceStatus::from_envelope(source, Some(&envelope)),
                    totals: SpendingTotals::from_awards(&envelope.data),
                    top_contracts: top_contracts(&envelope.data, TOP_CONTRACT_LIMIT),
                }
            }
            SourceName::Safety => {
                let envelope = match &self.osha {
                    Some(client) => Some(client.fetch().await),
                    None => None,
                };
                let inspections = envelope.as_ref().map(|e| e.data.as_slice()).unwrap_or_default();
                SourceDetail::Safety {
                    status: SourceStatus::from_envelope(source, envelope.as_ref()),
                    summary: SafetySummary::from_inspections(inspections),
                }
            }
            SourceName::LaborMarket => {
                let envelope = match &self.dol {
                    Some(client) => Some(client.fetch().await),
                    None => None,
                };
                let series = envelope.as_ref().map(|e| e.data.clone()).unwrap_or_default();
                SourceDetail::LaborMarket {
                    status: SourceStatus::from_envelope(source, envelope.as_ref()),
                    trend: self.series_trend(&series),
                    series,
                }
            }
        }
    }

    /// Trend of the headline series, or of the first series if it is absent.
    fn series_trend(&self, series: &[LaborSeries]) -> Vec<TrendPoint> {
        series
            .iter()
            .find(|s| s.series_id == self.config.employment_series)
            .or_else(|| series.first())
            .map(trend)
            .unwrap_or_default()
    }
}

/// Await one source's task, if it was started.
///
/// `Ok(None)` means the source was skipped. A task that panicked or was
/// cancelled becomes [`RefreshError::TaskFailed`].
pub async fn settle<T>(
    name: SourceName,
    task: Option<JoinHandle<SourceEnvelope<T>>>,
) -> Result<Option<SourceEnvelope<T>>, RefreshError> {
    match task {
        None => Ok(None),
        Some(handle) => handle.await.map(Some).map_err(|e| RefreshError::TaskFailed {
            name,
            message: e.to_string(),
        }),
    }
}

fn record<T>(
    settled: Result<Option<SourceEnvelope<T>>, RefreshError>,
    faults: &mut Vec<RefreshError>,
) -> Option<SourceEnvelope<T>> {
    settled.unwrap_or_else(|fault| {
        warn!(error = %fault, "Source task did not settle");
        faults.push(fault);
        None
    })
}
