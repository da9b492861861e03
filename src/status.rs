//! Per-source availability for the status cards.
//!
//! Pure classification of a fetch outcome; no state, no I/O.

use serde::{Deserialize, Serialize};

use crate::model::{SourceEnvelope, SourceName};

/// Presentation state of a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOutcome {
    /// The source returned data.
    Available,
    /// The source was called and reported a failure.
    Error,
    /// The source was never called, or failed without saying why.
    Unavailable,
}

impl SourceOutcome {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SourceOutcome::Available => "Available",
            SourceOutcome::Error => "Error",
            SourceOutcome::Unavailable => "Unavailable",
        }
    }
}

/// Classify a fetch. `None` means the call never completed.
pub fn classify<T>(envelope: Option<&SourceEnvelope<T>>) -> SourceOutcome {
    match envelope {
        Some(envelope) if envelope.success => SourceOutcome::Available,
        Some(SourceEnvelope {
            error: Some(_), ..
        }) => SourceOutcome::Error,
        _ => SourceOutcome::Unavailable,
    }
}

/// Status card model for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source: SourceName,

    /// Card title, e.g. "OSHA Safety Data".
    pub title: String,

    pub outcome: SourceOutcome,

    /// "Available", "Error" or "Unavailable".
    pub label: String,

    /// Failure message shown under the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceStatus {
    /// Build the status for `source` from its envelope, if any.
    pub fn from_envelope<T>(source: SourceName, envelope: Option<&SourceEnvelope<T>>) -> Self {
        let outcome = classify(envelope);
        let error = match outcome {
            SourceOutcome::Error => envelope.and_then(|e| e.error.clone()),
            _ => None,
        };

        Self {
            source,
            title: source.title().to_string(),
            outcome,
            label: outcome.label().to_string(),
            error,
        }
    }

    /// Status for a source that was skipped.
    pub fn unavailable(source: SourceName) -> Self {
        Self::from_envelope::<()>(source, None)
    }

    pub fn is_available(&self) -> bool {
        self.outcome == SourceOutcome::Available
    }
}
