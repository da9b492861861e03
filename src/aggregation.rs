//! Metric derivation from source payloads.
//!
//! Everything here is pure: each function reads only the envelopes or
//! records it is handed, so results do not depend on the order in which
//! the sources settled.

use serde::{Deserialize, Serialize};

use crate::data_sources::osha::Inspection;
use crate::data_sources::usaspending::ContractAward;
use crate::model::{DashboardMetrics, LaborSeries, SourceEnvelope, TrendPoint};

/// Number of inspections listed in the safety summary.
pub const RECENT_INSPECTION_LIMIT: usize = 10;

/// Number of contracts listed in the spending detail.
pub const TOP_CONTRACT_LIMIT: usize = 10;

/// Percent change from `previous` to `latest`.
///
/// Returns 0 when there is no baseline to compare against.
pub fn employment_growth(latest: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    ((latest - previous) / previous) * 100.0
}

/// The two most recent observations of the headline employment series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmploymentReading {
    pub latest: f64,

    /// Equal to `latest` when the series has a single observation.
    pub previous: f64,
}

impl EmploymentReading {
    /// Read the designated series out of a BLS payload (most recent first).
    pub fn from_series(series: &[LaborSeries], series_id: &str) -> Option<Self> {
        let series = series.iter().find(|s| s.series_id == series_id)?;
        let latest = series.points.first()?.value;
        let previous = series.points.get(1).map_or(latest, |p| p.value);

        Some(Self { latest, previous })
    }

    pub fn growth(&self) -> f64 {
        employment_growth(self.latest, self.previous)
    }
}

/// Totals over a set of contract awards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendingTotals {
    pub total_spending: f64,

    pub contract_count: usize,

    /// Mean obligation per contract, 0 when there are no contracts.
    pub average_contract: f64,
}

impl SpendingTotals {
    pub fn from_awards(awards: &[ContractAward]) -> Self {
        let total_spending: f64 = awards.iter().map(|a| a.total_obligation).sum();
        let contract_count = awards.len();
        let average_contract = if contract_count == 0 {
            0.0
        } else {
            total_spending / contract_count as f64
        };

        Self {
            total_spending,
            contract_count,
            average_contract,
        }
    }
}

/// Largest awards by obligation, descending.
pub fn top_contracts(awards: &[ContractAward], limit: usize) -> Vec<ContractAward> {
    let mut sorted = awards.to_vec();
    sorted.sort_by(|a, b| b.total_obligation.total_cmp(&a.total_obligation));
    sorted.truncate(limit);
    sorted
}

/// Counts over a set of OSHA inspections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetySummary {
    pub inspection_count: usize,

    /// Inspections with a recorded violation.
    pub violation_count: usize,

    /// Inspections without one.
    pub compliant_count: usize,

    pub total_penalties: f64,

    /// Most recent inspections first; undated ones sort last.
    pub recent: Vec<Inspection>,
}

impl SafetySummary {
    pub fn from_inspections(inspections: &[Inspection]) -> Self {
        let violation_count = inspections.iter().filter(|i| i.has_violation()).count();
        let total_penalties = inspections.iter().map(|i| i.penalty_amount).sum();

        let mut recent = inspections.to_vec();
        recent.sort_by(|a, b| b.date().cmp(&a.date()));
        recent.truncate(RECENT_INSPECTION_LIMIT);

        Self {
            inspection_count: inspections.len(),
            violation_count,
            compliant_count: inspections.len() - violation_count,
            total_penalties,
            recent,
        }
    }
}

/// Monthly observations of a series as dated points, oldest first.
///
/// Non-monthly periods (annual averages, quarters) are dropped.
pub fn trend(series: &LaborSeries) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = series
        .points
        .iter()
        .filter_map(|p| {
            p.date().map(|date| TrendPoint {
                date,
                value: p.value,
            })
        })
        .collect();

    points.sort_by_key(|p| p.date);
    points
}

/// Derive the dashboard metrics from one refresh's envelopes.
///
/// A source contributes only when its envelope succeeded; otherwise its
/// metrics keep their zero value. `average_wage` and `unemployment_rate`
/// are reserved and always 0.
pub fn derive_metrics(
    labor: Option<&SourceEnvelope<Vec<LaborSeries>>>,
    spending: Option<&SourceEnvelope<Vec<ContractAward>>>,
    employment_series: &str,
) -> DashboardMetrics {
    let mut metrics = DashboardMetrics::default();

    if let Some(envelope) = labor.filter(|e| e.success) {
        if let Some(reading) = EmploymentReading::from_series(&envelope.data, employment_series) {
            metrics.total_employment = reading.latest;
            metrics.employment_growth = reading.growth();
        }
    }

    if let Some(envelope) = spending.filter(|e| e.success) {
        let totals = SpendingTotals::from_awards(&envelope.data);
        metrics.total_spending = totals.total_spending;
        metrics.contract_count = totals.contract_count;
    }

    metrics
}
