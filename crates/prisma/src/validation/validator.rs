//! Matching claims against ground truth.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::claims::{Claim, ClaimDirection, ClaimType, DescriptiveStat, GroupComparison};
use crate::ground_truth::{EntryKey, GroundTruthEntry, GroundTruthStore, TestKind, TestResult};
use crate::stats::NumericSummary;

use super::verdict::{ValidatedClaim, Verdict, VerdictReason, format_p};

/// How descriptive claims naming fewer than two variables are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptiveGate {
    /// Every claim needs two recognized variables, descriptive ones included.
    #[default]
    RequireTwoVariables,
    /// Descriptive claims about a single variable are checked against its
    /// statistics; a count claim with no variable is checked against the
    /// row count.
    EvaluateSingleVariable,
}

/// Which correlation entries a correlation claim is checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Whichever of Pearson and Spearman has the smaller p-value.
    #[default]
    Either,
    Pearson,
    Spearman,
}

impl CorrelationMethod {
    fn tests(&self) -> &'static [TestKind] {
        match self {
            CorrelationMethod::Either => &[TestKind::Pearson, TestKind::Spearman],
            CorrelationMethod::Pearson => &[TestKind::Pearson],
            CorrelationMethod::Spearman => &[TestKind::Spearman],
        }
    }
}

/// Configuration for claim validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// A relationship is significant when `p <= alpha`.
    pub alpha: f64,
    pub descriptive_gate: DescriptiveGate,
    /// Allowed distance from a descriptive statistic, in standard deviations.
    pub tolerance_std: f64,
    /// Allowed absolute distance for count claims.
    pub count_tolerance: f64,
    pub correlation_method: CorrelationMethod,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            descriptive_gate: DescriptiveGate::default(),
            tolerance_std: 1.0,
            count_tolerance: 5.0,
            correlation_method: CorrelationMethod::default(),
        }
    }
}

impl ValidationConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_descriptive_gate(mut self, gate: DescriptiveGate) -> Self {
        self.descriptive_gate = gate;
        self
    }

    pub fn with_tolerance_std(mut self, tolerance: f64) -> Self {
        self.tolerance_std = tolerance;
        self
    }

    pub fn with_correlation_method(mut self, method: CorrelationMethod) -> Self {
        self.correlation_method = method;
        self
    }
}

type Assessment<'s> = (VerdictReason, Option<&'s GroundTruthEntry>);

/// Assigns verdicts to claims.
///
/// Validation reads the store and nothing else: the verdict for a claim
/// depends only on the claim, the store and the configuration.
#[derive(Debug, Clone, Default)]
pub struct ClaimValidator {
    config: ValidationConfig,
}

impl ClaimValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn validate(&self, claim: &Claim, store: &GroundTruthStore) -> ValidatedClaim {
        let (reason, evidence) = self.assess(claim, store);
        debug!(
            index = claim.index,
            verdict = reason.verdict().label(),
            reason = reason.code(),
            "validated claim"
        );
        ValidatedClaim::new(claim.clone(), reason, evidence.cloned())
    }

    /// Validate every claim concurrently. The result is ordered by claim
    /// index whatever order the claims were given in.
    pub fn validate_all(&self, claims: &[Claim], store: &GroundTruthStore) -> Vec<ValidatedClaim> {
        let mut validated: Vec<ValidatedClaim> = claims
            .par_iter()
            .map(|claim| self.validate(claim, store))
            .collect();
        validated.sort_by_key(ValidatedClaim::index);

        info!(
            claims = validated.len(),
            valid = validated.iter().filter(|v| v.verdict == Verdict::Valid).count(),
            hallucinations = validated
                .iter()
                .filter(|v| v.verdict == Verdict::Hallucination)
                .count(),
            "validated claims"
        );
        validated
    }

    fn assess<'s>(&self, claim: &Claim, store: &'s GroundTruthStore) -> Assessment<'s> {
        match claim.claim_type {
            _ if self.lacks_variables(claim) => (
                VerdictReason::InsufficientVariables {
                    found: claim.variables.len(),
                },
                None,
            ),
            ClaimType::Unclassified => (VerdictReason::Unclassified, None),
            t if t.is_directional()
                && claim.direction == ClaimDirection::Ambiguous
                && !claim.negated =>
            {
                (VerdictReason::AmbiguousDirection, None)
            }
            ClaimType::Correlation => self.correlation(claim, store),
            ClaimType::GroupDifference => self.group_difference(claim, store),
            ClaimType::Association => self.association(claim, store),
            ClaimType::Descriptive => self.descriptive(claim, store),
        }
    }

    /// Fewer than two variables, whether or not the claim carries the tag.
    fn lacks_variables(&self, claim: &Claim) -> bool {
        (claim.variables.len() < 2 || claim.has_insufficient_variables())
            && !self.evaluates_single(claim)
    }

    fn evaluates_single(&self, claim: &Claim) -> bool {
        self.config.descriptive_gate == DescriptiveGate::EvaluateSingleVariable
            && claim.claim_type == ClaimType::Descriptive
    }

    fn correlation<'s>(&self, claim: &Claim, store: &'s GroundTruthStore) -> Assessment<'s> {
        let (a, b) = (&claim.variables[0], &claim.variables[1]);
        let tests = self.config.correlation_method.tests();
        let entries: Vec<&GroundTruthEntry> =
            tests.iter().filter_map(|&t| store.pair(a, b, t)).collect();

        let Some(&first) = entries.first() else {
            return no_ground_truth(EntryKey::pair(a, b, tests[0]));
        };

        // Lowest p-value wins; ties keep the earlier test.
        let best = entries
            .iter()
            .filter_map(|e| e.test_result().map(|r| (*e, r)))
            .min_by(|x, y| x.1.p_value.total_cmp(&y.1.p_value));
        let Some((entry, result)) = best else {
            return undefined(first);
        };

        self.judge(claim, entry, result, || {
            let actual = if result.statistic >= 0.0 {
                ClaimDirection::Positive
            } else {
                ClaimDirection::Negative
            };
            match claim.direction {
                ClaimDirection::Positive | ClaimDirection::Negative
                    if claim.direction != actual =>
                {
                    Err(VerdictReason::Contradicted {
                        detail: format!(
                            "claimed {} correlation, data shows {} ({} = {:.3})",
                            claim.direction.label(),
                            actual.label(),
                            statistic_symbol(entry),
                            result.statistic
                        ),
                    })
                }
                _ => Ok(()),
            }
        })
    }

    fn group_difference<'s>(&self, claim: &Claim, store: &'s GroundTruthStore) -> Assessment<'s> {
        let grouping = claim.group.as_ref().map(|g| g.variable.as_str());
        let pairs = variable_pairs(&claim.variables)
            .filter(|(a, b)| grouping.is_none_or(|g| g == *a || g == *b));

        let mut fallback = None;
        for (a, b) in pairs {
            let found = store
                .pair_entries(a, b)
                .find(|e| e.key.test().is_some_and(|t| t.is_group_test()));
            if let Some(entry) = found {
                return match entry.test_result() {
                    Some(result) => self.judge(claim, entry, result, || {
                        match &claim.group {
                            Some(group) => check_levels(group, result),
                            None => Ok(()),
                        }
                    }),
                    None => undefined(entry),
                };
            }
            if fallback.is_none() {
                fallback = Some(EntryKey::pair(a, b, TestKind::WelchTTest));
            }
        }

        match fallback {
            Some(key) => no_ground_truth(key),
            None => no_ground_truth(EntryKey::pair(
                &claim.variables[0],
                &claim.variables[1],
                TestKind::WelchTTest,
            )),
        }
    }

    fn association<'s>(&self, claim: &Claim, store: &'s GroundTruthStore) -> Assessment<'s> {
        let (a, b) = (&claim.variables[0], &claim.variables[1]);
        match store.pair(a, b, TestKind::ChiSquare) {
            None => no_ground_truth(EntryKey::pair(a, b, TestKind::ChiSquare)),
            Some(entry) => match entry.test_result() {
                Some(result) => self.judge(claim, entry, result, || Ok(())),
                None => undefined(entry),
            },
        }
    }

    /// Shared significance rule. `agrees` checks the claimed direction once
    /// the relationship is known to be significant.
    fn judge<'s>(
        &self,
        claim: &Claim,
        entry: &'s GroundTruthEntry,
        result: &TestResult,
        agrees: impl FnOnce() -> Result<(), VerdictReason>,
    ) -> Assessment<'s> {
        let p_value = result.p_value;
        let significant = p_value <= self.config.alpha;

        let reason = match (claim.negated, significant) {
            (true, false) => VerdictReason::AbsenceConfirmed { p_value },
            (true, true) => VerdictReason::Contradicted {
                detail: format!("a significant relationship exists ({})", format_p(p_value)),
            },
            (false, false) => VerdictReason::NotSignificant { p_value },
            (false, true) => match agrees() {
                Ok(()) => VerdictReason::Confirmed { p_value },
                Err(reason) => reason,
            },
        };
        (reason, Some(entry))
    }

    fn descriptive<'s>(&self, claim: &Claim, store: &'s GroundTruthStore) -> Assessment<'s> {
        let Some(statistic) = claim.statistic else {
            return (VerdictReason::UnsupportedStatistic, None);
        };
        let Some(claimed) = claim.claimed_value else {
            return (VerdictReason::MissingValue, None);
        };

        if claim.variables.is_empty() {
            // Only a claim about the dataset as a whole can name no variable.
            return match statistic {
                DescriptiveStat::Count => (
                    self.compare(
                        statistic,
                        claimed,
                        store.metadata().row_count as f64,
                        self.config.count_tolerance,
                    ),
                    None,
                ),
                _ => (VerdictReason::UnsupportedStatistic, None),
            };
        }

        let numeric = claim.variables.iter().find_map(|v| {
            let entry = store.descriptive(v)?;
            entry.numeric_summary().map(|summary| (v, entry, summary))
        });

        let Some((variable, entry, summary)) = numeric else {
            let variable = &claim.variables[0];
            let Some(entry) = store.descriptive(variable) else {
                return no_ground_truth(EntryKey::descriptive(variable));
            };
            return match (entry.categorical_summary(), statistic) {
                (Some(summary), DescriptiveStat::Count) => (
                    self.compare(
                        statistic,
                        claimed,
                        summary.count as f64,
                        self.config.count_tolerance,
                    ),
                    Some(entry),
                ),
                (Some(_), _) => (VerdictReason::UnsupportedStatistic, Some(entry)),
                (None, _) => undefined(entry),
            };
        };

        let tolerance = self.config.tolerance_std * summary.std.unwrap_or(0.0);

        if statistic == DescriptiveStat::Mean
            && let Some(mention) = claim.levels.iter().find(|m| &m.variable != variable)
        {
            return self.group_mean(
                store,
                variable,
                &mention.variable,
                &mention.level,
                claimed,
                tolerance,
            );
        }

        let reason = match statistic {
            DescriptiveStat::Range => self.range(claim, claimed, summary, tolerance),
            DescriptiveStat::Count => self.compare(
                statistic,
                claimed,
                summary.count as f64,
                self.config.count_tolerance,
            ),
            DescriptiveStat::StdDev => match summary.std {
                Some(std) => self.compare(statistic, claimed, std, tolerance),
                None => VerdictReason::UndefinedEntry {
                    entry: entry.key.to_string(),
                    reason: "standard deviation needs two observations".to_string(),
                },
            },
            DescriptiveStat::Mean => self.compare(statistic, claimed, summary.mean, tolerance),
            DescriptiveStat::Median => self.compare(statistic, claimed, summary.median, tolerance),
            DescriptiveStat::Minimum => self.compare(statistic, claimed, summary.min, tolerance),
            DescriptiveStat::Maximum => self.compare(statistic, claimed, summary.max, tolerance),
        };
        (reason, Some(entry))
    }

    /// Mean of `numeric` within one level of `grouping`.
    fn group_mean<'s>(
        &self,
        store: &'s GroundTruthStore,
        numeric: &str,
        grouping: &str,
        level: &str,
        claimed: f64,
        tolerance: f64,
    ) -> Assessment<'s> {
        let Some(entry) = store
            .pair_entries(numeric, grouping)
            .find(|e| e.key.test().is_some_and(|t| t.is_group_test()))
        else {
            return no_ground_truth(EntryKey::pair(numeric, grouping, TestKind::WelchTTest));
        };
        let Some(result) = entry.test_result() else {
            return undefined(entry);
        };

        let mean = result
            .group_means
            .as_ref()
            .and_then(|means| means.get(level).copied());
        let reason = match mean {
            Some(mean) => self.compare(DescriptiveStat::Mean, claimed, mean, tolerance),
            None => VerdictReason::UnknownLevel {
                variable: grouping.to_string(),
                level: level.to_string(),
            },
        };
        (reason, Some(entry))
    }

    fn range(
        &self,
        claim: &Claim,
        claimed: f64,
        summary: &NumericSummary,
        tolerance: f64,
    ) -> VerdictReason {
        let actual = [summary.min, summary.max];

        if let Some(second) = claim.secondary_value {
            let bounds = [claimed.min(second), claimed.max(second)];
            let matches = within(bounds[0], actual[0], tolerance)
                && within(bounds[1], actual[1], tolerance);
            return if matches {
                VerdictReason::BoundsMatch {
                    claimed: bounds,
                    actual,
                }
            } else {
                VerdictReason::BoundsMismatch {
                    claimed: bounds,
                    actual,
                    tolerance,
                }
            };
        }

        // A single number may be the width or either bound.
        let width = summary.range();
        match [width, summary.min, summary.max]
            .into_iter()
            .find(|&candidate| within(claimed, candidate, tolerance))
        {
            Some(actual) => VerdictReason::ValueMatches {
                statistic: DescriptiveStat::Range,
                claimed,
                actual,
            },
            None => VerdictReason::ValueMismatch {
                statistic: DescriptiveStat::Range,
                claimed,
                actual: width,
                tolerance,
            },
        }
    }

    fn compare(
        &self,
        statistic: DescriptiveStat,
        claimed: f64,
        actual: f64,
        tolerance: f64,
    ) -> VerdictReason {
        if within(claimed, actual, tolerance) {
            VerdictReason::ValueMatches {
                statistic,
                claimed,
                actual,
            }
        } else {
            VerdictReason::ValueMismatch {
                statistic,
                claimed,
                actual,
                tolerance,
            }
        }
    }
}

fn within(claimed: f64, actual: f64, tolerance: f64) -> bool {
    // Absorbs rounding in claims when the tolerance is zero.
    let slack = 1e-9 * actual.abs().max(1.0);
    (claimed - actual).abs() <= tolerance + slack
}

fn variable_pairs(variables: &[String]) -> impl Iterator<Item = (&str, &str)> {
    variables.iter().enumerate().flat_map(move |(i, a)| {
        variables[i + 1..]
            .iter()
            .map(move |b| (a.as_str(), b.as_str()))
    })
}

/// Whether the claimed higher/lower levels agree with the group means.
fn check_levels(group: &GroupComparison, result: &TestResult) -> Result<(), VerdictReason> {
    let Some(means) = result.group_means.as_ref().filter(|m| !m.is_empty()) else {
        return Ok(());
    };
    let mean_of = |level: &str| {
        means.get(level).copied().ok_or_else(|| VerdictReason::UnknownLevel {
            variable: group.variable.clone(),
            level: level.to_string(),
        })
    };

    let mut ranked: Vec<(&String, f64)> = means.iter().map(|(l, m)| (l, *m)).collect();
    ranked.sort_by(|x, y| y.1.total_cmp(&x.1));
    let (highest, lowest) = (ranked[0].0.as_str(), ranked[ranked.len() - 1].0.as_str());

    let contradicted = |detail: String| -> Result<(), VerdictReason> {
        Err(VerdictReason::Contradicted { detail })
    };

    match (group.higher.as_deref(), group.lower.as_deref()) {
        (Some(high), Some(low)) => {
            let (high_mean, low_mean) = (mean_of(high)?, mean_of(low)?);
            if high_mean > low_mean {
                Ok(())
            } else {
                contradicted(format!(
                    "mean for {} ({:.2}) is not above {} ({:.2})",
                    high, high_mean, low, low_mean
                ))
            }
        }
        (Some(high), None) => {
            mean_of(high)?;
            if high == highest {
                Ok(())
            } else {
                contradicted(format!("highest mean is in {}, not {}", highest, high))
            }
        }
        (None, Some(low)) => {
            mean_of(low)?;
            if low == lowest {
                Ok(())
            } else {
                contradicted(format!("lowest mean is in {}, not {}", lowest, low))
            }
        }
        (None, None) => Ok(()),
    }
}

fn statistic_symbol(entry: &GroundTruthEntry) -> &'static str {
    match entry.key.test() {
        Some(TestKind::Spearman) => "rho",
        _ => "r",
    }
}

fn no_ground_truth<'s>(key: EntryKey) -> Assessment<'s> {
    (
        VerdictReason::NoGroundTruth {
            entry: key.to_string(),
        },
        None,
    )
}

fn undefined(entry: &GroundTruthEntry) -> Assessment<'_> {
    (
        VerdictReason::UndefinedEntry {
            entry: entry.key.to_string(),
            reason: entry.undefined_reason().unwrap_or("not computed").to_string(),
        },
        Some(entry),
    )
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::claims::LevelMention;
    use crate::ground_truth::{Direction, EntryOutcome, STORE_FORMAT_VERSION, StoreMetadata};

    fn test_result(statistic: f64, p_value: f64) -> TestResult {
        TestResult {
            statistic,
            p_value,
            significant: p_value < 0.05,
            n: 100,
            direction: None,
            degrees_of_freedom: None,
            effect_size: None,
            strength: None,
            group_means: None,
        }
    }

    fn correlation(a: &str, b: &str, test: TestKind, r: f64, p: f64) -> GroundTruthEntry {
        let mut result = test_result(r, p);
        if result.significant {
            result.direction = Some(if r > 0.0 {
                Direction::Positive
            } else {
                Direction::Negative
            });
        }
        GroundTruthEntry::new(EntryKey::pair(a, b, test), EntryOutcome::Test(result))
    }

    fn group_test(
        numeric: &str,
        grouping: &str,
        p: f64,
        means: &[(&str, f64)],
    ) -> GroundTruthEntry {
        let test = if means.len() > 2 {
            TestKind::Anova
        } else {
            TestKind::WelchTTest
        };
        let mut result = test_result(5.0, p);
        result.group_means = Some(
            means
                .iter()
                .map(|(l, m)| (l.to_string(), *m))
                .collect::<IndexMap<_, _>>(),
        );
        GroundTruthEntry::new(EntryKey::pair(numeric, grouping, test), EntryOutcome::Test(result))
    }

    fn numeric(variable: &str, mean: f64, std: f64, min: f64, max: f64) -> GroundTruthEntry {
        GroundTruthEntry::new(
            EntryKey::descriptive(variable),
            EntryOutcome::Numeric(NumericSummary {
                count: 1338,
                null_count: 0,
                mean,
                std: Some(std),
                min,
                q1: mean - std,
                median: mean,
                q3: mean + std,
                max,
            }),
        )
    }

    fn store() -> GroundTruthStore {
        GroundTruthStore::new(
            StoreMetadata {
                dataset: "insurance".to_string(),
                dataset_hash: None,
                row_count: 1338,
                column_count: 5,
                alpha: 0.05,
                format_version: STORE_FORMAT_VERSION,
            },
            vec![
                correlation("age", "charges", TestKind::Pearson, 0.30, 1e-20),
                correlation("age", "charges", TestKind::Spearman, 0.53, 1e-90),
                correlation("income", "shoe_size", TestKind::Pearson, 0.02, 0.61),
                correlation("income", "shoe_size", TestKind::Spearman, 0.01, 0.72),
                correlation("age", "bmi", TestKind::Pearson, 0.11, 0.04),
                correlation("age", "bmi", TestKind::Spearman, 0.10, 0.06),
                group_test("charges", "smoker", 1e-30, &[("no", 8434.0), ("yes", 32050.0)]),
                group_test(
                    "charges",
                    "region",
                    0.03,
                    &[
                        ("northeast", 13406.0),
                        ("northwest", 12418.0),
                        ("southeast", 14735.0),
                        ("southwest", 12347.0),
                    ],
                ),
                GroundTruthEntry::new(
                    EntryKey::pair("sex", "smoker", TestKind::ChiSquare),
                    EntryOutcome::Test(test_result(7.4, 0.006)),
                ),
                GroundTruthEntry::undefined(
                    EntryKey::pair("constant", "age", TestKind::Pearson),
                    "constant input has zero variance",
                ),
                numeric("age", 39.2, 14.05, 18.0, 64.0),
                numeric("charges", 13270.4, 12110.0, 1121.9, 63770.4),
            ],
        )
    }

    fn correlation_claim(a: &str, b: &str, direction: ClaimDirection) -> Claim {
        Claim::new(0, "claim", ClaimType::Correlation)
            .with_variables([a, b])
            .with_direction(direction)
    }

    fn validate(claim: &Claim) -> ValidatedClaim {
        ClaimValidator::new().validate(claim, &store())
    }

    #[test]
    fn test_correlation_matching_direction_is_valid() {
        let result = validate(&correlation_claim("age", "charges", ClaimDirection::Positive));
        assert_eq!(result.verdict, Verdict::Valid);
        assert_eq!(result.reason.code(), "confirmed");
        // Spearman has the smaller p-value.
        assert_eq!(result.evidence.unwrap().key.test(), Some(TestKind::Spearman));
    }

    #[test]
    fn test_correlation_opposite_direction_is_hallucination() {
        let result = validate(&correlation_claim("charges", "age", ClaimDirection::Negative));
        assert_eq!(result.verdict, Verdict::Hallucination);
        assert_eq!(result.reason.code(), "contradicted");
    }

    #[test]
    fn test_unrelated_correlation_is_hallucination() {
        let result = validate(&correlation_claim("income", "shoe_size", ClaimDirection::Positive));
        assert_eq!(result.verdict, Verdict::Hallucination);
        assert_eq!(result.reason.code(), "not-significant");
        assert!(result.reason.to_string().contains("no relationship"));
    }

    #[test]
    fn test_correlation_method_pearson_only() {
        let validator = ClaimValidator::with_config(
            ValidationConfig::default().with_correlation_method(CorrelationMethod::Spearman),
        );
        let claim = correlation_claim("age", "bmi", ClaimDirection::Positive);
        assert_eq!(validator.validate(&claim, &store()).verdict, Verdict::Hallucination);
        assert_eq!(validate(&claim).verdict, Verdict::Valid);
    }

    #[test]
    fn test_negated_claims() {
        let absent =
            correlation_claim("income", "shoe_size", ClaimDirection::None).with_negated(true);
        assert_eq!(validate(&absent).reason.code(), "absence-confirmed");
        assert_eq!(validate(&absent).verdict, Verdict::Valid);

        let present = correlation_claim("age", "charges", ClaimDirection::None).with_negated(true);
        assert_eq!(validate(&present).verdict, Verdict::Hallucination);
    }

    #[test]
    fn test_ambiguous_direction_is_unverified() {
        let result = validate(&correlation_claim("age", "charges", ClaimDirection::Ambiguous));
        assert_eq!(result.verdict, Verdict::Unverified);
        assert_eq!(result.reason, VerdictReason::AmbiguousDirection);
    }

    #[test]
    fn test_missing_pair_is_unverified() {
        let result = validate(&correlation_claim("age", "happiness", ClaimDirection::Positive));
        assert_eq!(result.verdict, Verdict::Unverified);
        assert_eq!(result.reason.code(), "no-ground-truth");
        assert!(result.evidence.is_none());
    }

    #[test]
    fn test_undefined_entry_is_unverified() {
        let result = validate(&correlation_claim("age", "constant", ClaimDirection::Positive));
        assert_eq!(result.verdict, Verdict::Unverified);
        assert_eq!(result.reason.code(), "undefined-entry");
        assert!(result.reason.to_string().contains("zero variance"));
    }

    #[test]
    fn test_group_difference_levels() {
        let claim = |higher: &str, lower: &str| {
            Claim::new(0, "claim", ClaimType::GroupDifference)
                .with_variables(["smoker", "charges"])
                .with_group(GroupComparison {
                    variable: "smoker".to_string(),
                    higher: Some(higher.to_string()),
                    lower: Some(lower.to_string()),
                })
        };
        assert_eq!(validate(&claim("yes", "no")).verdict, Verdict::Valid);
        assert_eq!(validate(&claim("no", "yes")).verdict, Verdict::Hallucination);
    }

    #[test]
    fn test_group_difference_argmax_for_many_levels() {
        let claim = |higher: &str| {
            Claim::new(0, "claim", ClaimType::GroupDifference)
                .with_variables(["charges", "region"])
                .with_group(GroupComparison {
                    variable: "region".to_string(),
                    higher: Some(higher.to_string()),
                    lower: None,
                })
        };
        assert_eq!(validate(&claim("southeast")).verdict, Verdict::Valid);
        let wrong = validate(&claim("northwest"));
        assert_eq!(wrong.verdict, Verdict::Hallucination);
        assert!(wrong.reason.to_string().contains("southeast"));
    }

    #[test]
    fn test_association() {
        let claim =
            Claim::new(0, "claim", ClaimType::Association).with_variables(["smoker", "sex"]);
        assert_eq!(validate(&claim).verdict, Verdict::Valid);
    }

    #[test]
    fn test_single_variable_descriptive_gate() {
        let claim = Claim::new(0, "The average age is 39", ClaimType::Descriptive)
            .with_variables(["age"])
            .with_statistic(DescriptiveStat::Mean)
            .with_value(39.0);

        let gated = validate(&claim);
        assert_eq!(gated.verdict, Verdict::Unverified);
        assert_eq!(gated.reason, VerdictReason::InsufficientVariables { found: 1 });

        let open = ClaimValidator::with_config(
            ValidationConfig::default()
                .with_descriptive_gate(DescriptiveGate::EvaluateSingleVariable),
        );
        assert_eq!(open.validate(&claim, &store()).verdict, Verdict::Valid);

        let far = claim.with_value(80.0);
        assert_eq!(open.validate(&far, &store()).verdict, Verdict::Hallucination);
    }

    #[test]
    fn test_range_bounds() {
        let open = ClaimValidator::with_config(
            ValidationConfig::default()
                .with_descriptive_gate(DescriptiveGate::EvaluateSingleVariable)
                .with_tolerance_std(0.0),
        );
        let mut claim = Claim::new(0, "Age ranges from 18 to 64", ClaimType::Descriptive)
            .with_variables(["age"])
            .with_statistic(DescriptiveStat::Range)
            .with_value(18.0);
        claim.secondary_value = Some(64.0);
        assert_eq!(open.validate(&claim, &store()).reason.code(), "bounds-match");

        claim.secondary_value = Some(70.0);
        assert_eq!(open.validate(&claim, &store()).reason.code(), "bounds-mismatch");
    }

    #[test]
    fn test_level_conditioned_mean() {
        let mut claim = Claim::new(0, "Smokers average 32,000 in charges", ClaimType::Descriptive)
            .with_variables(["smoker", "charges"])
            .with_statistic(DescriptiveStat::Mean)
            .with_value(32000.0);
        claim.levels.push(LevelMention {
            variable: "smoker".to_string(),
            level: "yes".to_string(),
        });
        let validator =
            ClaimValidator::with_config(ValidationConfig::default().with_tolerance_std(0.01));
        let result = validator.validate(&claim, &store());
        assert_eq!(result.verdict, Verdict::Valid);
        assert_eq!(
            result.reason,
            VerdictReason::ValueMatches {
                statistic: DescriptiveStat::Mean,
                claimed: 32000.0,
                actual: 32050.0,
            }
        );
    }

    #[test]
    fn test_row_count_claim() {
        let open = ClaimValidator::with_config(
            ValidationConfig::default()
                .with_descriptive_gate(DescriptiveGate::EvaluateSingleVariable),
        );
        let claim = Claim::new(0, "The dataset has 1,338 records", ClaimType::Descriptive)
            .with_variables(Vec::<String>::new())
            .with_statistic(DescriptiveStat::Count)
            .with_value(1338.0);
        assert_eq!(open.validate(&claim, &store()).verdict, Verdict::Valid);
    }

    #[test]
    fn test_untagged_claim_without_variables_is_unverified() {
        let empty = GroundTruthStore::new(store().metadata().clone(), Vec::new());
        let claim = Claim::new(0, "Age correlates with BMI", ClaimType::Correlation);
        assert!(claim.tags.is_empty());

        let result = ClaimValidator::new().validate(&claim, &empty);
        assert_eq!(result.verdict, Verdict::Unverified);
        assert_eq!(result.reason.code(), "insufficient-variables");
        assert_eq!(result.reason, VerdictReason::InsufficientVariables { found: 0 });
    }

    #[test]
    fn test_deserialized_claim_with_one_variable_is_unverified() {
        let mut claim = Claim::new(0, "Smokers are common", ClaimType::Association);
        claim.variables = vec!["smoker".to_string()];
        assert!(!claim.has_insufficient_variables());

        let result = validate(&claim);
        assert_eq!(result.verdict, Verdict::Unverified);
        assert_eq!(result.reason, VerdictReason::InsufficientVariables { found: 1 });

        let open = ClaimValidator::with_config(
            ValidationConfig::default()
                .with_descriptive_gate(DescriptiveGate::EvaluateSingleVariable),
        );
        let mut group = Claim::new(0, "Smokers pay more", ClaimType::GroupDifference);
        group.variables = vec!["smoker".to_string()];
        assert_eq!(open.validate(&group, &store()).verdict, Verdict::Unverified);
    }

    #[test]
    fn test_unclassified_is_unverified() {
        let claim =
            Claim::new(0, "Looks clean", ClaimType::Unclassified).with_variables(["age", "bmi"]);
        assert_eq!(validate(&claim).reason, VerdictReason::Unclassified);
    }

    #[test]
    fn test_validate_all_orders_by_index() {
        let claims: Vec<Claim> = (0..20)
            .rev()
            .map(|i| {
                let mut claim = correlation_claim("age", "charges", ClaimDirection::Positive);
                claim.index = i;
                claim
            })
            .collect();
        let validated = ClaimValidator::new().validate_all(&claims, &store());
        let indices: Vec<usize> = validated.iter().map(ValidatedClaim::index).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_idempotent() {
        let claim = correlation_claim("age", "bmi", ClaimDirection::Negative);
        assert_eq!(validate(&claim), validate(&claim));
    }
}
