//! Raw tabular data and provenance of the file it came from.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cell spellings read as missing, compared case-insensitively after trimming.
const NULL_TOKENS: [&str; 9] = ["", "na", "n/a", "null", "none", "nil", "nan", ".", "-"];

/// Layout of a delimited file, named after its separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Csv,
    Tsv,
    Semicolon,
    Pipe,
    Delimited,
}

impl SourceFormat {
    pub fn from_delimiter(delimiter: u8) -> Self {
        match delimiter {
            b',' => SourceFormat::Csv,
            b'\t' => SourceFormat::Tsv,
            b';' => SourceFormat::Semicolon,
            b'|' => SourceFormat::Pipe,
            _ => SourceFormat::Delimited,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Tsv => "tsv",
            SourceFormat::Semicolon => "csv-semicolon",
            SourceFormat::Pipe => "psv",
            SourceFormat::Delimited => "delimited",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a dataset was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without its directory.
    pub file: String,
    pub path: PathBuf,
    /// `sha256:` digest of the raw bytes.
    pub hash: String,
    pub size_bytes: u64,
    pub format: SourceFormat,
    /// Data rows, header excluded.
    pub row_count: usize,
    pub column_count: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Untyped table as read from disk: a header row and string cells.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: u8,
}

impl DataTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, delimiter: u8) -> Self {
        Self {
            headers,
            rows,
            delimiter,
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cells of one column, top to bottom. Cells past a short row read as "".
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map_or("", String::as_str))
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    pub fn is_null_value(value: &str) -> bool {
        let value = value.trim();
        NULL_TOKENS.iter().any(|token| value.eq_ignore_ascii_case(token))
    }
}
