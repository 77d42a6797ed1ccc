//! Reducing verdicts to summary metrics.

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::validation::{ValidatedClaim, Verdict};

use super::report::{InsightSource, Report};

/// Verdict counts for a subset of claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub valid: usize,
    pub hallucinations: usize,
    pub unverified: usize,
}

impl VerdictCounts {
    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Valid => self.valid += 1,
            Verdict::Hallucination => self.hallucinations += 1,
            Verdict::Unverified => self.unverified += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.valid + self.hallucinations + self.unverified
    }
}

/// Headline numbers for a set of validated claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total: usize,
    pub valid: usize,
    pub hallucinations: usize,
    pub unverified: usize,
    /// Percentage of all claims that are hallucinations.
    pub hallucination_rate: f64,
    /// Percentage of all claims that are valid.
    pub insight_validity_score: f64,
    /// Counts per claim type, keyed by type label, in first-seen order.
    #[serde(default)]
    pub by_claim_type: IndexMap<String, VerdictCounts>,
}

impl MetricsSummary {
    /// Summary for the given counts; `unverified` is whatever remains.
    pub fn from_counts(total: usize, valid: usize, hallucinations: usize) -> Self {
        Self {
            total,
            valid,
            hallucinations,
            unverified: total.saturating_sub(valid + hallucinations),
            hallucination_rate: percentage(hallucinations, total),
            insight_validity_score: percentage(valid, total),
            by_claim_type: IndexMap::new(),
        }
    }

    pub fn unverified_rate(&self) -> f64 {
        percentage(self.unverified, self.total)
    }

    /// Render a rate as a percentage with two decimals.
    pub fn format_rate(rate: f64) -> String {
        format!("{:.2}%", rate)
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

/// Aggregates validated claims into metrics and reports.
pub struct MetricsAggregator;

impl MetricsAggregator {
    pub fn summarize(claims: &[ValidatedClaim]) -> MetricsSummary {
        let mut counts = VerdictCounts::default();
        let mut by_claim_type: IndexMap<String, VerdictCounts> = IndexMap::new();

        for validated in claims {
            counts.record(validated.verdict);
            by_claim_type
                .entry(validated.claim.claim_type.label().to_string())
                .or_default()
                .record(validated.verdict);
        }

        let mut summary =
            MetricsSummary::from_counts(counts.total(), counts.valid, counts.hallucinations);
        summary.by_claim_type = by_claim_type;
        summary
    }

    /// Build a report. Claims are put back into extraction order first.
    pub fn report(
        dataset: impl Into<String>,
        dataset_hash: Option<String>,
        source: &InsightSource,
        mut claims: Vec<ValidatedClaim>,
    ) -> Report {
        claims.sort_by_key(ValidatedClaim::index);
        let summary = Self::summarize(&claims);

        info!(
            total = summary.total,
            valid = summary.valid,
            hallucinations = summary.hallucinations,
            hallucination_rate = summary.hallucination_rate,
            "report summarized"
        );

        Report {
            dataset: dataset.into(),
            dataset_hash,
            model: source.model.clone(),
            generated_at: source.generated_at,
            validated_at: Utc::now(),
            claims,
            summary,
        }
    }
}
