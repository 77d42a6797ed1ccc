//! Pearson and Spearman correlation with two-sided p-values.

use std::cmp::Ordering;

use super::distribution::student_t_two_sided;
use super::{StatError, ensure_finite, is_constant, mean};

/// A correlation coefficient and its significance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub coefficient: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Pearson product-moment correlation of two aligned samples.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<Correlation, StatError> {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len().min(y.len());
    if n < 2 {
        return Err(StatError::InsufficientData {
            needed: 2,
            found: n,
        });
    }
    if is_constant(x) || is_constant(y) {
        return Err(StatError::ConstantInput);
    }

    let mx = mean(x);
    let my = mean(y);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let r = ensure_finite(sxy / (sxx * syy).sqrt())?.clamp(-1.0, 1.0);

    Ok(Correlation {
        coefficient: r,
        p_value: correlation_p_value(r, n),
        n,
    })
}

/// Spearman rank correlation (Pearson on average ranks).
pub fn spearman(x: &[f64], y: &[f64]) -> Result<Correlation, StatError> {
    pearson(&rank(x), &rank(y))
}

/// Ranks starting at 1; tied values share the average of their ranks.
pub fn rank(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end are 0-based; ranks are 1-based.
        let average = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = average;
        }
        start = end;
    }

    ranks
}

/// p-value of H0: rho = 0 using the t approximation with n - 2 df.
fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n <= 2 {
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    student_t_two_sided(t, df)
}
