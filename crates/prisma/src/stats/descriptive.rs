//! Per-variable descriptive statistics.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::StatError;

/// Descriptive statistics of a numeric column.
///
/// `std` is the sample standard deviation and is absent when fewer than two
/// values are available. Quartiles use linear interpolation between order
/// statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub null_count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Descriptive statistics of a categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub null_count: usize,
    /// Level frequencies, most frequent first (ties by level name).
    pub levels: IndexMap<String, usize>,
}

impl CategoricalSummary {
    /// The most frequent level and its count.
    pub fn mode(&self) -> Option<(&str, usize)> {
        self.levels.first().map(|(level, n)| (level.as_str(), *n))
    }
}

/// Welford accumulator for a numerically stable single-pass mean and variance.
#[derive(Debug, Clone, Default)]
struct RunningMoments {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningMoments {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn sample_std(&self) -> Option<f64> {
        (self.count >= 2).then(|| (self.m2 / (self.count - 1) as f64).sqrt())
    }
}

/// Summarize the non-null values of a numeric column.
pub fn describe_numeric(values: &[Option<f64>]) -> Result<NumericSummary, StatError> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return Err(StatError::InsufficientData {
            needed: 1,
            found: 0,
        });
    }

    let mut moments = RunningMoments::default();
    for &value in &present {
        moments.add(value);
    }

    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    Ok(NumericSummary {
        count: present.len(),
        null_count: values.len() - present.len(),
        mean: moments.mean,
        std: moments.sample_std(),
        min: present[0],
        q1: percentile_sorted(&present, 0.25),
        median: percentile_sorted(&present, 0.5),
        q3: percentile_sorted(&present, 0.75),
        max: present[present.len() - 1],
    })
}

/// Summarize the non-null values of a categorical column.
pub fn describe_categorical(values: &[Option<String>]) -> Result<CategoricalSummary, StatError> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.clone()).or_insert(0) += 1;
    }

    let count: usize = counts.values().sum();
    if count == 0 {
        return Err(StatError::InsufficientData {
            needed: 1,
            found: 0,
        });
    }

    counts.sort_by(|ka, va, kb, vb| vb.cmp(va).then_with(|| ka.cmp(kb)));

    Ok(CategoricalSummary {
        count,
        null_count: values.len() - count,
        levels: counts,
    })
}

/// Linear-interpolation percentile of an ascending, non-empty slice.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}
