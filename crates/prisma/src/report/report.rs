//! The report handed to renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidatedClaim, Verdict};

use super::metrics::MetricsSummary;

/// Generated text and where it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightSource {
    pub text: String,
    /// Identifier of the model that produced the text.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl InsightSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }
}

/// Validation results for one piece of generated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub dataset: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dataset_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub model: Option<String>,
    /// When the text was generated, if known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub generated_at: Option<DateTime<Utc>>,
    pub validated_at: DateTime<Utc>,
    /// In extraction order.
    pub claims: Vec<ValidatedClaim>,
    pub summary: MetricsSummary,
}

impl Report {
    pub fn with_verdict(&self, verdict: Verdict) -> impl Iterator<Item = &ValidatedClaim> {
        self.claims.iter().filter(move |c| c.verdict == verdict)
    }

    pub fn hallucinations(&self) -> impl Iterator<Item = &ValidatedClaim> {
        self.with_verdict(Verdict::Hallucination)
    }
}
