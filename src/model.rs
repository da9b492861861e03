//! Data models for Sitestats.
//!
//! These are the shapes that flow between the source clients, the
//! aggregator, and the HTTP layer. Every value here is rebuilt on each
//! refresh; nothing is persisted.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the four external statistics providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
    /// Bureau of Labor Statistics employment series.
    LaborStatistics,
    /// USAspending.gov federal contract awards.
    Spending,
    /// OSHA workplace-safety inspections.
    Safety,
    /// Department of Labor time series.
    LaborMarket,
}

impl SourceName {
    /// Every source, in display order.
    pub const ALL: [SourceName; 4] = [
        SourceName::LaborStatistics,
        SourceName::Spending,
        SourceName::Safety,
        SourceName::LaborMarket,
    ];

    /// Short provider label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            SourceName::LaborStatistics => "BLS",
            SourceName::Spending => "USA Spending",
            SourceName::Safety => "OSHA",
            SourceName::LaborMarket => "DOL",
        }
    }

    /// Title of the status card for this source.
    pub fn title(&self) -> &'static str {
        match self {
            SourceName::LaborStatistics => "BLS Employment Data",
            SourceName::Spending => "USA Spending Data",
            SourceName::Safety => "OSHA Safety Data",
            SourceName::LaborMarket => "DOL Labor Data",
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a source name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source: {0}")]
pub struct UnknownSource(pub String);

impl FromStr for SourceName {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "labor_statistics" | "bls" => Ok(SourceName::LaborStatistics),
            "spending" | "usaspending" | "usa_spending" => Ok(SourceName::Spending),
            "safety" | "osha" => Ok(SourceName::Safety),
            "labor_market" | "dol" => Ok(SourceName::LaborMarket),
            _ => Err(UnknownSource(s.to_string())),
        }
    }
}

/// Uniform wrapper every source client returns.
///
/// A successful envelope never carries an error; a failed one carries the
/// default value of `T` and a non-empty message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEnvelope<T> {
    pub data: T,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Default> SourceEnvelope<T> {
    /// Wrap a successfully extracted payload.
    pub fn success(data: T) -> Self {
        Self {
            data,
            success: true,
            error: None,
        }
    }

    /// Build a failed envelope. An empty message becomes "Unknown error".
    pub fn failure(message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "Unknown error".to_string();
        }

        Self {
            data: T::default(),
            success: false,
            error: Some(message),
        }
    }

    /// Fold a fallible fetch into an envelope.
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Summary numbers shown on the dashboard's metric cards.
///
/// Recomputed from scratch on every refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    /// Latest value of the designated employment series.
    pub total_employment: f64,

    /// Percent change from the previous observation to the latest.
    pub employment_growth: f64,

    /// Sum of obligated dollars across returned contract awards.
    pub total_spending: f64,

    /// Number of returned contract awards.
    pub contract_count: usize,

    /// Reserved. No source populates it yet.
    pub average_wage: f64,

    /// Reserved. No source populates it yet.
    pub unemployment_rate: f64,
}

/// A single observation of a labor series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: i32,

    /// Provider period code, e.g. "M07" for July or "M13" for the annual average.
    pub period: String,

    pub value: f64,
}

impl SeriesPoint {
    /// Calendar month this point covers, if it is a monthly observation.
    pub fn date(&self) -> Option<NaiveDate> {
        let month: u32 = self.period.strip_prefix('M')?.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, month, 1)
    }
}

/// A labor time series, most recent observation first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborSeries {
    pub series_id: String,

    #[serde(default)]
    pub title: String,

    pub points: Vec<SeriesPoint>,
}

/// A dated value for charting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}
