//! Ground-truth computation.
//!
//! The engine runs a fixed taxonomy of tests over a typed dataset:
//!
//! | Pair                      | Test                                        |
//! |---------------------------|---------------------------------------------|
//! | numeric × numeric         | Pearson and Spearman correlation            |
//! | categorical × numeric     | Welch t-test (2 levels), one-way ANOVA (>2) |
//! | categorical × categorical | chi-square test of independence             |
//!
//! plus descriptive statistics for every column. Each test is independent,
//! so tasks run in parallel and are merged into the store once all finish.
//! A test that cannot be computed becomes an `Undefined` entry; the run
//! itself never fails.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::input::{Column, ColumnValues, Dataset};
use crate::stats::{
    self, ContingencyTable, Correlation, StatError, chi_square_independence,
    describe_categorical, describe_numeric, one_way_anova, welch_t_test,
};

use super::entry::{
    Direction, EntryKey, EntryOutcome, GroundTruthEntry, Strength, TestKind, TestResult,
};
use super::store::{GroundTruthStore, STORE_FORMAT_VERSION, StoreMetadata};

/// Cut-offs mapping an effect size onto a [`Strength`].
///
/// Applied to |r|, Cramér's V, and the square root of eta-squared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSizeThresholds {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl Default for EffectSizeThresholds {
    fn default() -> Self {
        Self {
            small: 0.2,
            medium: 0.5,
            large: 0.8,
        }
    }
}

impl EffectSizeThresholds {
    pub fn classify(&self, effect: f64) -> Strength {
        let effect = effect.abs();
        if effect >= self.large {
            Strength::Strong
        } else if effect >= self.medium {
            Strength::Moderate
        } else if effect >= self.small {
            Strength::Weak
        } else {
            Strength::Negligible
        }
    }
}

/// Configuration for ground-truth computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Significance level; a test is significant when `p < alpha`.
    pub alpha: f64,
    /// Categorical columns with more distinct levels than this get
    /// undefined pair entries.
    pub max_categorical_levels: usize,
    pub effect_size_thresholds: EffectSizeThresholds,
    /// Run tasks on the rayon thread pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            max_categorical_levels: 50,
            effect_size_thresholds: EffectSizeThresholds::default(),
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_categorical_levels(mut self, max: usize) -> Self {
        self.max_categorical_levels = max;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

type CorrelationKernel = fn(&[f64], &[f64]) -> Result<Correlation, StatError>;

/// One unit of independent work.
enum Task<'a> {
    Describe(&'a Column),
    Pair(&'a Column, &'a Column),
}

/// Computes the ground-truth store for a dataset.
#[derive(Debug, Clone, Default)]
pub struct GroundTruthEngine {
    config: EngineConfig,
}

impl GroundTruthEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute every entry for `dataset`.
    ///
    /// The result depends only on the dataset and the configuration: task
    /// order is fixed (descriptive entries in column order, then pairs
    /// `(i, j)` with `i < j`) and parallel collection preserves it.
    pub fn compute(&self, dataset: &Dataset) -> GroundTruthStore {
        let columns = dataset.columns();

        let mut tasks: Vec<Task<'_>> = columns.iter().map(Task::Describe).collect();
        for (i, a) in columns.iter().enumerate() {
            for b in &columns[i + 1..] {
                tasks.push(Task::Pair(a, b));
            }
        }

        let batches: Vec<Vec<GroundTruthEntry>> = if self.config.parallel {
            tasks.par_iter().map(|task| self.run(task)).collect()
        } else {
            tasks.iter().map(|task| self.run(task)).collect()
        };
        let entries: Vec<GroundTruthEntry> = batches.into_iter().flatten().collect();

        for entry in entries.iter().filter(|e| e.is_undefined()) {
            debug!(
                entry = %entry.key,
                reason = entry.undefined_reason().unwrap_or_default(),
                "undefined ground-truth entry"
            );
        }

        let store = GroundTruthStore::new(
            StoreMetadata {
                dataset: dataset.name().to_string(),
                dataset_hash: dataset.hash().map(str::to_string),
                row_count: dataset.row_count(),
                column_count: columns.len(),
                alpha: self.config.alpha,
                format_version: STORE_FORMAT_VERSION,
            },
            entries,
        );

        info!(
            dataset = dataset.name(),
            entries = store.len(),
            significant = store.significant_count(),
            undefined = store.undefined_count(),
            "computed ground truth"
        );
        store
    }

    fn run(&self, task: &Task<'_>) -> Vec<GroundTruthEntry> {
        match task {
            Task::Describe(column) => vec![self.describe(column)],
            Task::Pair(a, b) => match (a.values(), b.values()) {
                (ColumnValues::Numeric(x), ColumnValues::Numeric(y)) => {
                    self.correlate(a.name(), x, b.name(), y)
                }
                (ColumnValues::Categorical(_), ColumnValues::Numeric(y)) => {
                    vec![self.compare_groups(a, b.name(), y)]
                }
                (ColumnValues::Numeric(x), ColumnValues::Categorical(_)) => {
                    vec![self.compare_groups(b, a.name(), x)]
                }
                (ColumnValues::Categorical(x), ColumnValues::Categorical(y)) => {
                    vec![self.cross_tabulate(a, x, b, y)]
                }
            },
        }
    }

    fn describe(&self, column: &Column) -> GroundTruthEntry {
        let key = EntryKey::descriptive(column.name());
        let outcome = match column.values() {
            ColumnValues::Numeric(values) => describe_numeric(values).map(EntryOutcome::Numeric),
            ColumnValues::Categorical(values) => {
                describe_categorical(values).map(EntryOutcome::Categorical)
            }
        };
        into_entry(key, outcome)
    }

    /// Pearson and Spearman over pairwise-complete rows.
    fn correlate(
        &self,
        x_name: &str,
        x: &[Option<f64>],
        y_name: &str,
        y: &[Option<f64>],
    ) -> Vec<GroundTruthEntry> {
        let (xs, ys): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y)
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .unzip();

        let kernels: [(TestKind, CorrelationKernel); 2] = [
            (TestKind::Pearson, stats::pearson),
            (TestKind::Spearman, stats::spearman),
        ];

        kernels
            .into_iter()
            .map(|(test, kernel)| {
                let key = EntryKey::pair(x_name, y_name, test);
                let outcome = kernel(&xs, &ys).map(|c| self.correlation_result(c));
                into_entry(key, outcome)
            })
            .collect()
    }

    fn correlation_result(&self, c: Correlation) -> EntryOutcome {
        let significant = c.p_value < self.config.alpha;
        EntryOutcome::Test(TestResult {
            statistic: c.coefficient,
            p_value: c.p_value,
            significant,
            n: c.n,
            direction: significant.then(|| {
                if c.coefficient > 0.0 {
                    Direction::Positive
                } else {
                    Direction::Negative
                }
            }),
            degrees_of_freedom: Some(c.n.saturating_sub(2) as f64),
            effect_size: Some(c.coefficient),
            strength: Some(self.config.effect_size_thresholds.classify(c.coefficient)),
            group_means: None,
        })
    }

    /// Welch t-test or ANOVA of a numeric variable across categorical levels.
    ///
    /// The test is chosen by the factor's level count so the entry key does
    /// not depend on which groups survive null exclusion. Groups with fewer
    /// than two values are left out of the test.
    fn compare_groups(
        &self,
        factor: &Column,
        response_name: &str,
        response: &[Option<f64>],
    ) -> GroundTruthEntry {
        let level_count = factor.levels().len();
        let test = if level_count > 2 {
            TestKind::Anova
        } else {
            TestKind::WelchTTest
        };
        let key = EntryKey::pair(factor.name(), response_name, test);

        if level_count > self.config.max_categorical_levels {
            return too_many_levels(key, factor.name(), level_count);
        }

        let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        if let Some(labels) = factor.as_categorical() {
            for (label, value) in labels.iter().zip(response) {
                if let (Some(label), Some(value)) = (label, value) {
                    groups.entry(label.as_str()).or_default().push(*value);
                }
            }
        }
        groups.retain(|_, values| values.len() >= 2);

        let n: usize = groups.values().map(Vec::len).sum();
        let group_means: IndexMap<String, f64> = groups
            .iter()
            .map(|(level, values)| (level.to_string(), stats::mean(values)))
            .collect();

        let outcome = if groups.len() < 2 {
            Err(StatError::SingleLevel)
        } else if test == TestKind::WelchTTest {
            let samples: Vec<&Vec<f64>> = groups.values().collect();
            welch_t_test(samples[0], samples[1]).map(|t| {
                let eta_squared = t.statistic.powi(2) / (t.statistic.powi(2) + t.df);
                (t.statistic, t.p_value, t.df, eta_squared)
            })
        } else {
            let samples: Vec<&[f64]> = groups.values().map(Vec::as_slice).collect();
            one_way_anova(&samples)
                .map(|a| (a.statistic, a.p_value, a.df_between, a.eta_squared))
        };

        let outcome = outcome.map(|(statistic, p_value, df, eta_squared)| {
            let significant = p_value < self.config.alpha;
            let direction = significant.then(|| extremes(&group_means)).flatten();
            EntryOutcome::Test(TestResult {
                statistic,
                p_value,
                significant,
                n,
                direction,
                degrees_of_freedom: Some(df),
                effect_size: Some(eta_squared),
                strength: Some(
                    self.config
                        .effect_size_thresholds
                        .classify(eta_squared.sqrt()),
                ),
                group_means: Some(group_means),
            })
        });
        into_entry(key, outcome)
    }

    fn cross_tabulate(
        &self,
        a: &Column,
        x: &[Option<String>],
        b: &Column,
        y: &[Option<String>],
    ) -> GroundTruthEntry {
        let key = EntryKey::pair(a.name(), b.name(), TestKind::ChiSquare);

        for column in [a, b] {
            let level_count = column.levels().len();
            if level_count > self.config.max_categorical_levels {
                return too_many_levels(key, column.name(), level_count);
            }
        }

        let pairs: Vec<(&str, &str)> = x
            .iter()
            .zip(y)
            .filter_map(|(l, r)| Some((l.as_deref()?, r.as_deref()?)))
            .collect();
        let n = pairs.len();
        let table = ContingencyTable::from_pairs(pairs);

        let outcome = chi_square_independence(&table).map(|chi| {
            EntryOutcome::Test(TestResult {
                statistic: chi.statistic,
                p_value: chi.p_value,
                significant: chi.p_value < self.config.alpha,
                n,
                direction: None,
                degrees_of_freedom: Some(chi.dof as f64),
                effect_size: Some(chi.cramers_v),
                strength: Some(self.config.effect_size_thresholds.classify(chi.cramers_v)),
                group_means: None,
            })
        });
        into_entry(key, outcome)
    }
}

fn into_entry(key: EntryKey, outcome: Result<EntryOutcome, StatError>) -> GroundTruthEntry {
    match outcome {
        Ok(outcome) => GroundTruthEntry::new(key, outcome),
        Err(err) => GroundTruthEntry::undefined(key, err.to_string()),
    }
}

fn too_many_levels(key: EntryKey, column: &str, level_count: usize) -> GroundTruthEntry {
    GroundTruthEntry::undefined(
        key,
        format!("too many levels ({} in '{}')", level_count, column),
    )
}

/// Levels with the highest and lowest mean; first level wins ties.
fn extremes(means: &IndexMap<String, f64>) -> Option<Direction> {
    let mut iter = means.iter();
    let (first, &first_mean) = iter.next()?;
    let (mut highest, mut high) = (first, first_mean);
    let (mut lowest, mut low) = (first, first_mean);
    for (level, &mean) in iter {
        if mean > high {
            highest = level;
            high = mean;
        }
        if mean < low {
            lowest = level;
            low = mean;
        }
    }
    (highest != lowest).then(|| Direction::Groups {
        highest: highest.clone(),
        lowest: lowest.clone(),
    })
}
