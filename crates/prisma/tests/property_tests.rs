//! Property-based tests for extraction, validation and metrics.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p prisma --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p prisma --test property_tests
//! ```

use proptest::prelude::*;

use prisma::claims::ColumnProfile;
use prisma::ground_truth::{
    Direction, EntryKey, EntryOutcome, STORE_FORMAT_VERSION, StoreMetadata, TestKind, TestResult,
};
use prisma::input::Column;
use prisma::{
    Claim, ClaimDirection, ClaimExtractor, ClaimType, ClaimValidator, Dataset, ExtractionConfig,
    GroundTruthEngine, GroundTruthEntry, GroundTruthStore, MetricsAggregator, ValidatedClaim,
    Verdict, VerdictReason,
};

// =============================================================================
// Test Strategies
// =============================================================================

/// Sentences built from words the extractor reacts to.
fn claim_like_text() -> impl Strategy<Value = String> {
    let words = prop::sample::select(vec![
        "age", "charges", "bmi", "smoker", "smokers", "non-smokers", "region", "is", "are",
        "higher", "lower", "more", "less", "correlated", "associated", "with", "than", "not",
        "no", "significant", "average", "mean", "median", "range", "increases", "decreases",
        "as", "the", "about", "25", "39.2", "1,121", "p", "<", "0.05", "-", "1.", "\n", "**",
    ]);
    prop::collection::vec(words, 0..60).prop_map(|w| w.join(" "))
}

fn insurance_columns() -> Vec<ColumnProfile> {
    vec![
        ColumnProfile::numeric("age"),
        ColumnProfile::numeric("bmi"),
        ColumnProfile::numeric("charges"),
        ColumnProfile::categorical("smoker", ["no", "yes"]),
        ColumnProfile::categorical("region", ["northeast", "northwest", "southeast", "southwest"]),
    ]
}

fn validated(index: usize, verdict: Verdict) -> ValidatedClaim {
    let reason = match verdict {
        Verdict::Valid => VerdictReason::Confirmed { p_value: 0.001 },
        Verdict::Hallucination => VerdictReason::NotSignificant { p_value: 0.5 },
        Verdict::Unverified => VerdictReason::Unclassified,
    };
    let claim = Claim::new(index, "claim", ClaimType::Correlation).with_variables(["a", "b"]);
    ValidatedClaim::new(claim, reason, None)
}

fn correlation_store(r: f64, p: f64) -> GroundTruthStore {
    let entries = [TestKind::Pearson, TestKind::Spearman]
        .into_iter()
        .map(|test| {
            let significant = p < 0.05;
            GroundTruthEntry::new(
                EntryKey::pair("x", "y", test),
                EntryOutcome::Test(TestResult {
                    statistic: r,
                    p_value: p,
                    significant,
                    n: 50,
                    direction: significant.then(|| {
                        if r > 0.0 {
                            Direction::Positive
                        } else {
                            Direction::Negative
                        }
                    }),
                    degrees_of_freedom: Some(48.0),
                    effect_size: Some(r),
                    strength: None,
                    group_means: None,
                }),
            )
        })
        .collect();
    GroundTruthStore::new(
        StoreMetadata {
            dataset: "synthetic".to_string(),
            dataset_hash: None,
            row_count: 50,
            column_count: 2,
            alpha: 0.05,
            format_version: STORE_FORMAT_VERSION,
        },
        entries,
    )
}

// =============================================================================
// Metrics
// =============================================================================

proptest! {
    #[test]
    fn prop_counts_partition_total(
        valid in 0usize..40,
        hallucinations in 0usize..40,
        unverified in 0usize..40,
    ) {
        let mut claims = Vec::new();
        for verdict in std::iter::repeat_n(Verdict::Valid, valid)
            .chain(std::iter::repeat_n(Verdict::Hallucination, hallucinations))
            .chain(std::iter::repeat_n(Verdict::Unverified, unverified))
        {
            claims.push(validated(claims.len(), verdict));
        }

        let summary = MetricsAggregator::summarize(&claims);
        prop_assert_eq!(summary.total, valid + hallucinations + unverified);
        prop_assert_eq!(summary.valid + summary.hallucinations + summary.unverified, summary.total);

        if summary.total > 0 {
            let sum = summary.hallucination_rate
                + summary.insight_validity_score
                + summary.unverified_rate();
            prop_assert!((sum - 100.0).abs() < 1e-9);
        } else {
            prop_assert_eq!(summary.hallucination_rate, 0.0);
            prop_assert_eq!(summary.insight_validity_score, 0.0);
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

proptest! {
    #[test]
    fn prop_correlation_sign_rule(
        magnitude in 0.05f64..1.0,
        positive_data in any::<bool>(),
        claims_positive in any::<bool>(),
        p in 1e-12f64..0.04,
    ) {
        let r = if positive_data { magnitude } else { -magnitude };
        let store = correlation_store(r, p);
        let direction = if claims_positive {
            ClaimDirection::Positive
        } else {
            ClaimDirection::Negative
        };
        let claim = Claim::new(0, "x and y", ClaimType::Correlation)
            .with_variables(["x", "y"])
            .with_direction(direction);

        let result = ClaimValidator::new().validate(&claim, &store);
        let expected = if positive_data == claims_positive {
            Verdict::Valid
        } else {
            Verdict::Hallucination
        };
        prop_assert_eq!(result.verdict, expected);
    }

    #[test]
    fn prop_missing_pair_is_unverified(
        claim_type in prop::sample::select(vec![
            ClaimType::Correlation,
            ClaimType::GroupDifference,
            ClaimType::Association,
        ]),
        negated in any::<bool>(),
    ) {
        let store = correlation_store(0.5, 0.001);
        let claim = Claim::new(0, "unknown pair", claim_type)
            .with_variables(["height", "weight"])
            .with_negated(negated);

        let result = ClaimValidator::new().validate(&claim, &store);
        prop_assert_eq!(result.verdict, Verdict::Unverified);
    }

    #[test]
    fn prop_validation_is_idempotent(
        xs in prop::collection::vec(-1000.0f64..1000.0, 3..40),
        ys in prop::collection::vec(-1000.0f64..1000.0, 3..40),
        direction in prop::sample::select(vec![
            ClaimDirection::Positive,
            ClaimDirection::Negative,
            ClaimDirection::None,
        ]),
    ) {
        let n = xs.len().min(ys.len());
        let dataset = Dataset::new(
            "random",
            vec![
                Column::numeric("x", xs[..n].iter().copied().map(Some).collect()),
                Column::numeric("y", ys[..n].iter().copied().map(Some).collect()),
            ],
        ).unwrap();
        let store = GroundTruthEngine::new().compute(&dataset);
        let claim = Claim::new(0, "x and y", ClaimType::Correlation)
            .with_variables(["x", "y"])
            .with_direction(direction);

        let validator = ClaimValidator::new();
        let first = validator.validate(&claim, &store);
        let second = validator.validate(&claim, &store);
        prop_assert_eq!(first.verdict, second.verdict);
        prop_assert_eq!(first.reason, second.reason);
    }

    #[test]
    fn prop_validate_all_restores_index_order(
        order in Just((0..12usize).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let store = correlation_store(0.4, 0.01);
        let claims: Vec<Claim> = order
            .iter()
            .map(|&i| {
                Claim::new(i, format!("claim {}", i), ClaimType::Correlation)
                    .with_variables(["x", "y"])
                    .with_direction(ClaimDirection::Positive)
            })
            .collect();

        let validated = ClaimValidator::new().validate_all(&claims, &store);
        let indices: Vec<usize> = validated.iter().map(ValidatedClaim::index).collect();
        prop_assert_eq!(indices, (0..12).collect::<Vec<_>>());
    }
}

// =============================================================================
// Extraction
// =============================================================================

proptest! {
    #[test]
    fn prop_extraction_is_deterministic(text in claim_like_text()) {
        let extractor = ClaimExtractor::new(ExtractionConfig::default(), &insurance_columns());
        let first = extractor.extract(&text);
        let second = extractor.extract(&text);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_extraction_indices_are_sequential(text in claim_like_text()) {
        let extractor = ClaimExtractor::new(ExtractionConfig::default(), &insurance_columns());
        for (i, claim) in extractor.extract(&text).iter().enumerate() {
            prop_assert_eq!(claim.index, i);
            prop_assert!(claim.span.start <= claim.span.end);
            prop_assert!(claim.span.end <= text.len());
        }
    }

    #[test]
    fn prop_extraction_never_panics(text in "\\PC{0,400}") {
        let extractor = ClaimExtractor::new(ExtractionConfig::default(), &insurance_columns());
        let _ = extractor.extract(&text);
    }

    #[test]
    fn prop_extraction_tags_insufficient_variables(text in claim_like_text()) {
        let extractor = ClaimExtractor::new(ExtractionConfig::default(), &insurance_columns());
        for claim in extractor.extract(&text) {
            prop_assert_eq!(claim.has_insufficient_variables(), claim.variables.len() < 2);
        }
    }
}
