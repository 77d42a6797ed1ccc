//! Group-comparison and independence tests.

use std::collections::BTreeMap;

use super::distribution::{chi_square_sf, f_sf, student_t_two_sided};
use super::{StatError, ensure_finite, mean, sample_variance};

/// Result of Welch's unequal-variance t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTestOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub df: f64,
}

/// Result of a one-way ANOVA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnovaOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub df_between: f64,
    pub df_within: f64,
    /// Share of total variance explained by group membership.
    pub eta_squared: f64,
}

/// Result of a chi-square test of independence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquareOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
    pub cramers_v: f64,
}

/// Two-sided Welch t-test. Each sample needs at least two values.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TTestOutcome, StatError> {
    let smallest = a.len().min(b.len());
    if smallest < 2 {
        return Err(StatError::InsufficientData {
            needed: 2,
            found: smallest,
        });
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let va = sample_variance(a) / na;
    let vb = sample_variance(b) / nb;
    let se2 = va + vb;
    if se2 == 0.0 {
        return Err(StatError::NoWithinGroupVariance);
    }

    let t = ensure_finite((mean(a) - mean(b)) / se2.sqrt())?;
    let df = ensure_finite(se2 * se2 / (va * va / (na - 1.0) + vb * vb / (nb - 1.0)))?;

    Ok(TTestOutcome {
        statistic: t,
        p_value: student_t_two_sided(t, df),
        df,
    })
}

/// One-way ANOVA across two or more non-empty groups.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<AnovaOutcome, StatError> {
    if groups.len() < 2 {
        return Err(StatError::SingleLevel);
    }
    if let Some(empty) = groups.iter().find(|g| g.is_empty()) {
        return Err(StatError::InsufficientData {
            needed: 1,
            found: empty.len(),
        });
    }

    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if n <= k {
        return Err(StatError::InsufficientData {
            needed: k + 1,
            found: n,
        });
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let m = mean(group);
        ss_between += group.len() as f64 * (m - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    }

    if ss_within == 0.0 {
        return Err(StatError::NoWithinGroupVariance);
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let f = ensure_finite((ss_between / df_between) / (ss_within / df_within))?;

    Ok(AnovaOutcome {
        statistic: f,
        p_value: f_sf(f, df_between, df_within),
        df_between,
        df_within,
        eta_squared: ss_between / (ss_between + ss_within),
    })
}

/// Observed joint frequencies of two categorical variables.
///
/// Row and column labels are kept in sorted order so the same data always
/// produces the same table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContingencyTable {
    rows: Vec<String>,
    columns: Vec<String>,
    counts: Vec<Vec<f64>>,
}

impl ContingencyTable {
    /// Cross-tabulate aligned pairs of labels.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut cells: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
        let mut column_labels: BTreeMap<&str, ()> = BTreeMap::new();

        for (row, col) in pairs {
            *cells.entry(row).or_default().entry(col).or_insert(0) += 1;
            column_labels.insert(col, ());
        }

        let rows: Vec<String> = cells.keys().map(|s| s.to_string()).collect();
        let columns: Vec<String> = column_labels.keys().map(|s| s.to_string()).collect();
        let counts = cells
            .values()
            .map(|row| {
                column_labels
                    .keys()
                    .map(|col| row.get(col).copied().unwrap_or(0) as f64)
                    .collect()
            })
            .collect();

        Self {
            rows,
            columns,
            counts,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().flatten().sum()
    }

    pub fn row_labels(&self) -> &[String] {
        &self.rows
    }

    pub fn column_labels(&self) -> &[String] {
        &self.columns
    }
}

/// Chi-square test of independence.
///
/// Applies Yates' continuity correction when the table has a single degree
/// of freedom.
pub fn chi_square_independence(table: &ContingencyTable) -> Result<ChiSquareOutcome, StatError> {
    let (r, c) = table.shape();
    if r < 2 || c < 2 {
        return Err(StatError::SingleLevel);
    }

    let total = table.total();
    if total < 2.0 {
        return Err(StatError::InsufficientData {
            needed: 2,
            found: total as usize,
        });
    }

    let row_sums: Vec<f64> = table.counts.iter().map(|row| row.iter().sum()).collect();
    let col_sums: Vec<f64> = (0..c)
        .map(|j| table.counts.iter().map(|row| row[j]).sum())
        .collect();

    let dof = (r - 1) * (c - 1);
    let yates = dof == 1;

    let mut statistic = 0.0;
    for (i, row) in table.counts.iter().enumerate() {
        for (j, &observed) in row.iter().enumerate() {
            let expected = row_sums[i] * col_sums[j] / total;
            let mut diff = (observed - expected).abs();
            if yates {
                diff = (diff - 0.5).max(0.0);
            }
            statistic += diff * diff / expected;
        }
    }
    let statistic = ensure_finite(statistic)?;

    let min_dim = (r.min(c) - 1) as f64;
    let cramers_v = (statistic / (total * min_dim)).sqrt();

    Ok(ChiSquareOutcome {
        statistic,
        p_value: chi_square_sf(statistic, dof as f64),
        dof,
        cramers_v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welch_reference_values() {
        // scipy.stats.ttest_ind(a, b, equal_var=False)
        // -> statistic = -2.0, pvalue = 0.080516
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [3.0, 4.0, 5.0, 6.0, 7.0];
        let out = welch_t_test(&a, &b).unwrap();
        assert!((out.statistic + 2.0).abs() < 1e-9);
        assert!((out.df - 8.0).abs() < 1e-9);
        assert!((out.p_value - 0.080_516).abs() < 1e-5);
    }

    #[test]
    fn test_welch_needs_two_per_group() {
        assert_eq!(
            welch_t_test(&[1.0], &[1.0, 2.0]),
            Err(StatError::InsufficientData {
                needed: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_welch_zero_variance() {
        assert_eq!(
            welch_t_test(&[2.0, 2.0], &[2.0, 2.0]),
            Err(StatError::NoWithinGroupVariance)
        );
    }

    #[test]
    fn test_anova_reference_values() {
        // scipy.stats.f_oneway -> F = 27.0, p = 0.000992
        let g1 = [1.0, 2.0, 3.0];
        let g2 = [4.0, 5.0, 6.0];
        let g3 = [7.0, 8.0, 9.0];
        let out = one_way_anova(&[&g1, &g2, &g3]).unwrap();
        assert!((out.statistic - 27.0).abs() < 1e-9);
        assert!((out.p_value - 0.000_992).abs() < 1e-5);
        assert!((out.eta_squared - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_anova_single_group() {
        let g1 = [1.0, 2.0];
        assert_eq!(one_way_anova(&[&g1]), Err(StatError::SingleLevel));
    }

    #[test]
    fn test_contingency_table_is_sorted() {
        let table = ContingencyTable::from_pairs(vec![("b", "y"), ("a", "x"), ("b", "x")]);
        assert_eq!(table.row_labels(), &["a".to_string(), "b".to_string()]);
        assert_eq!(table.column_labels(), &["x".to_string(), "y".to_string()]);
        assert_eq!(table.total(), 3.0);
    }

    #[test]
    fn test_chi_square_2x2_with_yates() {
        // scipy.stats.chi2_contingency([[10, 20], [20, 10]])
        // -> chi2 = 5.4, p = 0.020137
        let mut pairs = Vec::new();
        pairs.extend(std::iter::repeat_n(("a", "x"), 10));
        pairs.extend(std::iter::repeat_n(("a", "y"), 20));
        pairs.extend(std::iter::repeat_n(("b", "x"), 20));
        pairs.extend(std::iter::repeat_n(("b", "y"), 10));
        let table = ContingencyTable::from_pairs(pairs);

        let out = chi_square_independence(&table).unwrap();
        assert_eq!(out.dof, 1);
        assert!((out.statistic - 5.4).abs() < 1e-9);
        assert!((out.p_value - 0.020_137).abs() < 1e-5);
    }

    #[test]
    fn test_chi_square_single_level() {
        let table = ContingencyTable::from_pairs(vec![("a", "x"), ("a", "y")]);
        assert_eq!(
            chi_square_independence(&table),
            Err(StatError::SingleLevel)
        );
    }
}
