//! Verdicts and the reasons behind them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::claims::{Claim, DescriptiveStat};
use crate::ground_truth::GroundTruthEntry;

/// Outcome of checking one claim against ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Supported by the data.
    Valid,
    /// Cannot be checked against the data.
    Unverified,
    /// Contradicted by the data.
    Hallucination,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Valid => "VALID",
            Verdict::Unverified => "UNVERIFIED",
            Verdict::Hallucination => "HALLUCINATION",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a claim received its verdict.
///
/// Each reason belongs to exactly one verdict (see [`VerdictReason::verdict`])
/// and has a stable machine-readable [`code`](VerdictReason::code).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum VerdictReason {
    /// Fewer than two dataset variables were recognized.
    InsufficientVariables { found: usize },
    /// The claim fits none of the checkable claim types.
    Unclassified,
    /// The claim asserts both directions.
    AmbiguousDirection,
    /// The store has no entry for the claimed variables and test.
    NoGroundTruth { entry: String },
    /// The matching entry could not be computed from the data.
    UndefinedEntry { entry: String, reason: String },
    /// A named level has no group statistics.
    UnknownLevel { variable: String, level: String },
    /// A descriptive claim with no number to compare.
    MissingValue,
    /// A descriptive claim about a statistic the variable does not have.
    UnsupportedStatistic,
    /// A significant relationship in the claimed direction.
    Confirmed { p_value: f64 },
    /// A negated claim, and the data shows no significant relationship.
    AbsenceConfirmed { p_value: f64 },
    /// The claimed relationship is not statistically significant.
    NotSignificant { p_value: f64 },
    /// The data shows the opposite of what is claimed.
    Contradicted { detail: String },
    ValueMatches {
        statistic: DescriptiveStat,
        claimed: f64,
        actual: f64,
    },
    ValueMismatch {
        statistic: DescriptiveStat,
        claimed: f64,
        actual: f64,
        tolerance: f64,
    },
    /// Claimed range bounds agree with the observed minimum and maximum.
    BoundsMatch { claimed: [f64; 2], actual: [f64; 2] },
    BoundsMismatch {
        claimed: [f64; 2],
        actual: [f64; 2],
        tolerance: f64,
    },
}

impl VerdictReason {
    pub fn verdict(&self) -> Verdict {
        match self {
            VerdictReason::Confirmed { .. }
            | VerdictReason::AbsenceConfirmed { .. }
            | VerdictReason::ValueMatches { .. }
            | VerdictReason::BoundsMatch { .. } => Verdict::Valid,
            VerdictReason::NotSignificant { .. }
            | VerdictReason::Contradicted { .. }
            | VerdictReason::ValueMismatch { .. }
            | VerdictReason::BoundsMismatch { .. } => Verdict::Hallucination,
            VerdictReason::InsufficientVariables { .. }
            | VerdictReason::Unclassified
            | VerdictReason::AmbiguousDirection
            | VerdictReason::NoGroundTruth { .. }
            | VerdictReason::UndefinedEntry { .. }
            | VerdictReason::UnknownLevel { .. }
            | VerdictReason::MissingValue
            | VerdictReason::UnsupportedStatistic => Verdict::Unverified,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            VerdictReason::InsufficientVariables { .. } => "insufficient-variables",
            VerdictReason::Unclassified => "unclassified",
            VerdictReason::AmbiguousDirection => "ambiguous-direction",
            VerdictReason::NoGroundTruth { .. } => "no-ground-truth",
            VerdictReason::UndefinedEntry { .. } => "undefined-entry",
            VerdictReason::UnknownLevel { .. } => "unknown-level",
            VerdictReason::MissingValue => "missing-value",
            VerdictReason::UnsupportedStatistic => "unsupported-statistic",
            VerdictReason::Confirmed { .. } => "confirmed",
            VerdictReason::AbsenceConfirmed { .. } => "absence-confirmed",
            VerdictReason::NotSignificant { .. } => "not-significant",
            VerdictReason::Contradicted { .. } => "contradicted",
            VerdictReason::ValueMatches { .. } => "value-matches",
            VerdictReason::ValueMismatch { .. } => "value-mismatch",
            VerdictReason::BoundsMatch { .. } => "bounds-match",
            VerdictReason::BoundsMismatch { .. } => "bounds-mismatch",
        }
    }
}

/// p-values are shown to four decimals, with a floor.
pub(crate) fn format_p(p: f64) -> String {
    if p < 0.0001 {
        "p < 0.0001".to_string()
    } else {
        format!("p = {:.4}", p)
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictReason::InsufficientVariables { found } => write!(
                f,
                "insufficient-variables: {} dataset variable{} recognized",
                found,
                if *found == 1 { "" } else { "s" }
            ),
            VerdictReason::Unclassified => {
                write!(f, "claim does not match a checkable claim type")
            }
            VerdictReason::AmbiguousDirection => {
                write!(f, "ambiguous direction: both positive and negative cues")
            }
            VerdictReason::NoGroundTruth { entry } => {
                write!(f, "no ground-truth entry for {}", entry)
            }
            VerdictReason::UndefinedEntry { entry, reason } => {
                write!(f, "ground truth for {} is undefined: {}", entry, reason)
            }
            VerdictReason::UnknownLevel { variable, level } => {
                write!(f, "no group statistics for {} = '{}'", variable, level)
            }
            VerdictReason::MissingValue => write!(f, "no claimed value to compare"),
            VerdictReason::UnsupportedStatistic => {
                write!(f, "claim names no statistic available for this variable")
            }
            VerdictReason::Confirmed { p_value } => {
                write!(f, "supported by data ({})", format_p(*p_value))
            }
            VerdictReason::AbsenceConfirmed { p_value } => write!(
                f,
                "no statistically significant relationship, as claimed ({})",
                format_p(*p_value)
            ),
            VerdictReason::NotSignificant { p_value } => write!(
                f,
                "not statistically significant: no relationship in the data ({})",
                format_p(*p_value)
            ),
            VerdictReason::Contradicted { detail } => {
                write!(f, "contradicted by data: {}", detail)
            }
            VerdictReason::ValueMatches {
                statistic,
                claimed,
                actual,
            } => write!(
                f,
                "claimed {} {} matches observed {}",
                statistic.label(),
                format_value(*claimed),
                format_value(*actual)
            ),
            VerdictReason::ValueMismatch {
                statistic,
                claimed,
                actual,
                tolerance,
            } => write!(
                f,
                "claimed {} {} differs from observed {} by more than {}",
                statistic.label(),
                format_value(*claimed),
                format_value(*actual),
                format_value(*tolerance)
            ),
            VerdictReason::BoundsMatch { claimed, actual } => write!(
                f,
                "claimed range {}-{} matches observed {}-{}",
                format_value(claimed[0]),
                format_value(claimed[1]),
                format_value(actual[0]),
                format_value(actual[1])
            ),
            VerdictReason::BoundsMismatch {
                claimed,
                actual,
                tolerance,
            } => write!(
                f,
                "claimed range {}-{} differs from observed {}-{} by more than {}",
                format_value(claimed[0]),
                format_value(claimed[1]),
                format_value(actual[0]),
                format_value(actual[1]),
                format_value(*tolerance)
            ),
        }
    }
}

/// A claim with its verdict and the entry it was checked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedClaim {
    pub claim: Claim,
    pub verdict: Verdict,
    pub reason: VerdictReason,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub evidence: Option<GroundTruthEntry>,
}

impl ValidatedClaim {
    pub fn new(claim: Claim, reason: VerdictReason, evidence: Option<GroundTruthEntry>) -> Self {
        Self {
            verdict: reason.verdict(),
            claim,
            reason,
            evidence,
        }
    }

    pub fn index(&self) -> usize {
        self.claim.index
    }
}
