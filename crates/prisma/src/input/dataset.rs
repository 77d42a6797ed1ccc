//! Typed, immutable dataset consumed by the ground-truth engine.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::source::DataTable;
use crate::error::{PrismaError, Result};

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
        }
    }
}

/// Row-aligned values of a column; `None` marks a null cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    /// Build a numeric column. Non-finite values are stored as nulls.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    /// Build a categorical column.
    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Categorical(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn kind(&self) -> ColumnKind {
        match self.values {
            ColumnValues::Numeric(_) => ColumnKind::Numeric,
            ColumnValues::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Numeric cells, if this is a numeric column.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v),
            ColumnValues::Categorical(_) => None,
        }
    }

    /// Categorical cells, if this is a categorical column.
    pub fn as_categorical(&self) -> Option<&[Option<String>]> {
        match &self.values {
            ColumnValues::Categorical(v) => Some(v),
            ColumnValues::Numeric(_) => None,
        }
    }

    /// Distinct non-null levels in sorted order (empty for numeric columns).
    pub fn levels(&self) -> Vec<String> {
        match &self.values {
            ColumnValues::Categorical(v) => v
                .iter()
                .flatten()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            ColumnValues::Numeric(_) => Vec::new(),
        }
    }
}

/// Options applied when typing a raw table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetOptions {
    /// Columns to treat as categorical even when every value is numeric
    /// (e.g. 0/1 flags, zip codes).
    pub categorical_columns: Vec<String>,
    /// Columns to drop before analysis (e.g. row identifiers).
    pub exclude_columns: Vec<String>,
    /// Fixed delimiter character; auto-detected when unset.
    pub delimiter: Option<char>,
}

impl DatasetOptions {
    pub fn with_categorical(mut self, column: impl Into<String>) -> Self {
        self.categorical_columns.push(column.into());
        self
    }

    pub fn with_excluded(mut self, column: impl Into<String>) -> Self {
        self.exclude_columns.push(column.into());
        self
    }
}

/// A typed dataset: ordered, uniquely named, equal-length columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    hash: Option<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from already-typed columns.
    ///
    /// Fails on duplicate column names or columns of differing lengths.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(PrismaError::DuplicateColumn {
                    column: column.name().to_string(),
                });
            }
        }

        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(ragged) = columns.iter().find(|c| c.len() != row_count) {
            return Err(PrismaError::RaggedColumn {
                column: ragged.name().to_string(),
                expected: row_count,
                found: ragged.len(),
            });
        }

        Ok(Self {
            name: name.into(),
            hash: None,
            columns,
            row_count,
        })
    }

    /// Type the columns of a parsed table.
    ///
    /// A column is numeric when it has at least one non-null value and every
    /// non-null value parses as a finite number; otherwise it is categorical.
    pub fn from_table(
        name: impl Into<String>,
        table: &DataTable,
        options: &DatasetOptions,
    ) -> Result<Self> {
        for configured in options
            .categorical_columns
            .iter()
            .chain(options.exclude_columns.iter())
        {
            if !table.headers.iter().any(|h| h == configured) {
                return Err(PrismaError::UnknownColumn(configured.clone()));
            }
        }

        let mut columns = Vec::with_capacity(table.column_count());

        for (index, header) in table.headers.iter().enumerate() {
            if options.exclude_columns.contains(header) {
                continue;
            }

            let cells: Vec<Option<&str>> = table
                .column_values(index)
                .map(|v| (!DataTable::is_null_value(v)).then(|| v.trim()))
                .collect();

            let forced_categorical = options.categorical_columns.contains(header);
            let column = if !forced_categorical && is_numeric_column(&cells) {
                Column::numeric(
                    header.clone(),
                    cells
                        .iter()
                        .map(|c| c.and_then(|v| v.parse::<f64>().ok()))
                        .collect(),
                )
            } else {
                Column::categorical(
                    header.clone(),
                    cells.iter().map(|c| c.map(str::to_string)).collect(),
                )
            };

            debug!(column = %header, kind = column.kind().label(), "typed column");
            columns.push(column);
        }

        Self::new(name, columns)
    }

    /// Attach the content hash of the source file.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }
}

fn is_numeric_column(cells: &[Option<&str>]) -> bool {
    let mut saw_value = false;
    for value in cells.iter().flatten() {
        saw_value = true;
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => {}
            _ => return false,
        }
    }
    saw_value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> DataTable {
        DataTable::new(
            headers.into_iter().map(String::from).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
            b',',
        )
    }

    #[test]
    fn test_types_numeric_and_categorical() {
        let table = make_table(
            vec!["age", "sex"],
            vec![vec!["30", "F"], vec!["NA", "M"], vec!["41.5", ""]],
        );
        let ds = Dataset::from_table("t", &table, &DatasetOptions::default()).unwrap();

        let age = ds.column("age").unwrap();
        assert_eq!(age.kind(), ColumnKind::Numeric);
        assert_eq!(age.as_numeric().unwrap(), &[Some(30.0), None, Some(41.5)]);

        let sex = ds.column("sex").unwrap();
        assert_eq!(sex.kind(), ColumnKind::Categorical);
        assert_eq!(sex.null_count(), 1);
        assert_eq!(sex.levels(), vec!["F", "M"]);
    }

    #[test]
    fn test_forced_categorical_and_excluded() {
        let table = make_table(
            vec!["id", "smoker", "charges"],
            vec![vec!["1", "0", "100"], vec!["2", "1", "250"]],
        );
        let options = DatasetOptions::default()
            .with_categorical("smoker")
            .with_excluded("id");
        let ds = Dataset::from_table("t", &table, &options).unwrap();

        assert_eq!(ds.column_names().collect::<Vec<_>>(), vec!["smoker", "charges"]);
        assert_eq!(ds.column("smoker").unwrap().kind(), ColumnKind::Categorical);
    }

    #[test]
    fn test_unknown_configured_column() {
        let table = make_table(vec!["a"], vec![vec!["1"]]);
        let options = DatasetOptions::default().with_excluded("missing");
        let err = Dataset::from_table("t", &table, &options).unwrap_err();
        assert!(matches!(err, PrismaError::UnknownColumn(c) if c == "missing"));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = Dataset::new(
            "t",
            vec![
                Column::numeric("x", vec![Some(1.0)]),
                Column::numeric("x", vec![Some(2.0)]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PrismaError::DuplicateColumn { column } if column == "x"));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = Dataset::new(
            "t",
            vec![
                Column::numeric("x", vec![Some(1.0), Some(2.0)]),
                Column::numeric("y", vec![Some(2.0)]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PrismaError::RaggedColumn { column, .. } if column == "y"));
    }

    #[test]
    fn test_all_null_column_is_categorical() {
        let table = make_table(vec!["empty"], vec![vec!["NA"], vec![""]]);
        let ds = Dataset::from_table("t", &table, &DatasetOptions::default()).unwrap();
        assert_eq!(ds.column("empty").unwrap().kind(), ColumnKind::Categorical);
    }

    #[test]
    fn test_non_finite_numbers_become_null() {
        let col = Column::numeric("x", vec![Some(f64::NAN), Some(1.0)]);
        assert_eq!(col.null_count(), 1);
    }
}
