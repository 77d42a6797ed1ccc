//! Numerical kernels behind the ground-truth engine.
//!
//! Every kernel is a pure function over `f64` slices that either returns a
//! finite result or a [`StatError`] describing why the input is degenerate.
//! Callers never see NaN or infinite statistics.

mod correlation;
mod descriptive;
mod distribution;
mod hypothesis;

use thiserror::Error;

pub use correlation::{Correlation, pearson, rank, spearman};
pub use descriptive::{CategoricalSummary, NumericSummary, describe_categorical, describe_numeric};
pub use distribution::{
    chi_square_sf, f_sf, ln_gamma, regularized_beta, regularized_gamma_q, student_t_two_sided,
};
pub use hypothesis::{
    AnovaOutcome, ChiSquareOutcome, ContingencyTable, TTestOutcome, chi_square_independence,
    one_way_anova, welch_t_test,
};

/// Why a statistic could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatError {
    #[error("fewer than {needed} non-null observations ({found} available)")]
    InsufficientData { needed: usize, found: usize },

    #[error("constant input has zero variance")]
    ConstantInput,

    #[error("only one level present")]
    SingleLevel,

    #[error("no variance within groups")]
    NoWithinGroupVariance,

    #[error("computation produced a non-finite value")]
    NonFinite,
}

pub(crate) fn ensure_finite(value: f64) -> Result<f64, StatError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StatError::NonFinite)
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator). Caller guarantees `len >= 2`.
pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub(crate) fn is_constant(values: &[f64]) -> bool {
    match values.split_first() {
        Some((first, rest)) => rest.iter().all(|v| v == first),
        None => true,
    }
}
