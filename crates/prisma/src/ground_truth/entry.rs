//! Ground-truth entry types.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::stats::{CategoricalSummary, NumericSummary};

/// Statistical test behind a pair entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Pearson product-moment correlation (numeric × numeric).
    Pearson,
    /// Spearman rank correlation (numeric × numeric).
    Spearman,
    /// Welch's t-test (two-level categorical × numeric).
    WelchTTest,
    /// One-way ANOVA (multi-level categorical × numeric).
    Anova,
    /// Chi-square test of independence (categorical × categorical).
    ChiSquare,
}

impl TestKind {
    /// Every pair test, in lookup order.
    pub const ALL: [TestKind; 5] = [
        TestKind::Pearson,
        TestKind::Spearman,
        TestKind::WelchTTest,
        TestKind::Anova,
        TestKind::ChiSquare,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TestKind::Pearson => "Pearson correlation",
            TestKind::Spearman => "Spearman correlation",
            TestKind::WelchTTest => "Welch t-test",
            TestKind::Anova => "one-way ANOVA",
            TestKind::ChiSquare => "chi-square test",
        }
    }

    pub fn is_correlation(&self) -> bool {
        matches!(self, TestKind::Pearson | TestKind::Spearman)
    }

    pub fn is_group_test(&self) -> bool {
        matches!(self, TestKind::WelchTTest | TestKind::Anova)
    }
}

/// Identity of a ground-truth entry.
///
/// Pair variables are stored sorted so `(a, b)` and `(b, a)` address the
/// same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKey {
    Pair { variables: [String; 2], test: TestKind },
    Descriptive { variable: String },
}

impl EntryKey {
    pub fn pair(a: impl Into<String>, b: impl Into<String>, test: TestKind) -> Self {
        let (a, b) = (a.into(), b.into());
        let variables = if a <= b { [a, b] } else { [b, a] };
        EntryKey::Pair { variables, test }
    }

    pub fn descriptive(variable: impl Into<String>) -> Self {
        EntryKey::Descriptive {
            variable: variable.into(),
        }
    }

    /// Variables this entry is about.
    pub fn variables(&self) -> Vec<&str> {
        match self {
            EntryKey::Pair { variables, .. } => variables.iter().map(String::as_str).collect(),
            EntryKey::Descriptive { variable } => vec![variable.as_str()],
        }
    }

    pub fn test(&self) -> Option<TestKind> {
        match self {
            EntryKey::Pair { test, .. } => Some(*test),
            EntryKey::Descriptive { .. } => None,
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Pair { variables, test } => {
                write!(f, "{} × {} ({})", variables[0], variables[1], test.label())
            }
            EntryKey::Descriptive { variable } => write!(f, "{} (descriptive)", variable),
        }
    }
}

/// Qualitative size of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Negligible,
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    pub fn label(&self) -> &'static str {
        match self {
            Strength::Negligible => "negligible",
            Strength::Weak => "weak",
            Strength::Moderate => "moderate",
            Strength::Strong => "strong",
        }
    }
}

/// Direction of a significant relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
    /// Group levels with the highest and lowest mean.
    Groups { highest: String, lowest: String },
}

/// Outcome of a pairwise test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
    /// `p_value < alpha` at computation time.
    pub significant: bool,
    /// Rows used after pairwise null exclusion.
    pub n: usize,
    /// Only set when significant; chi-square never carries one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub degrees_of_freedom: Option<f64>,
    /// r for correlations, eta-squared for group tests, Cramér's V for chi-square.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub effect_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub strength: Option<Strength>,
    /// Mean of the numeric variable per categorical level (sorted by level).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group_means: Option<IndexMap<String, f64>>,
}

/// What was computed for an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOutcome {
    Test(TestResult),
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
    /// The statistic could not be computed from the data.
    Undefined { reason: String },
}

/// A single fact in the ground-truth store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthEntry {
    pub key: EntryKey,
    pub outcome: EntryOutcome,
}

impl GroundTruthEntry {
    pub fn new(key: EntryKey, outcome: EntryOutcome) -> Self {
        Self { key, outcome }
    }

    pub fn undefined(key: EntryKey, reason: impl Into<String>) -> Self {
        Self::new(
            key,
            EntryOutcome::Undefined {
                reason: reason.into(),
            },
        )
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Undefined { .. })
    }

    pub fn undefined_reason(&self) -> Option<&str> {
        match &self.outcome {
            EntryOutcome::Undefined { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn test_result(&self) -> Option<&TestResult> {
        match &self.outcome {
            EntryOutcome::Test(result) => Some(result),
            _ => None,
        }
    }

    pub fn numeric_summary(&self) -> Option<&NumericSummary> {
        match &self.outcome {
            EntryOutcome::Numeric(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn categorical_summary(&self) -> Option<&CategoricalSummary> {
        match &self.outcome {
            EntryOutcome::Categorical(summary) => Some(summary),
            _ => None,
        }
    }
}
