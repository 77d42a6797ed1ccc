//! Delimited-file reader with separator detection.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::source::{DataTable, SourceFormat, SourceMetadata};
use crate::error::{PrismaError, Result};

/// Separators tried by detection, in tie-break order.
const CANDIDATES: [u8; 4] = [b'\t', b',', b';', b'|'];

/// Lines sampled when detecting the separator.
const SAMPLE_LINES: usize = 10;

#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Fixed separator; detected from the data when unset.
    pub delimiter: Option<u8>,
    /// Stop after this many data rows.
    pub max_rows: Option<usize>,
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

impl ParserConfig {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }
}

/// Reads delimited text into a [`DataTable`].
///
/// The first record is always the header. Rows shorter than the header are
/// padded with empty cells and longer rows are cut to the header width.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read and parse a file, recording its size, hash and layout.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| PrismaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let table = self.parse_bytes(&bytes)?;
        let format = SourceFormat::from_delimiter(table.delimiter);
        debug!(
            path = %path.display(),
            %format,
            rows = table.row_count(),
            columns = table.column_count(),
            "parsed dataset file"
        );

        let metadata = SourceMetadata {
            file: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            hash: content_hash(&bytes),
            size_bytes: bytes.len() as u64,
            format,
            row_count: table.row_count(),
            column_count: table.column_count(),
            loaded_at: Utc::now(),
        };
        Ok((table, metadata))
    }

    pub fn parse_str(&self, text: &str) -> Result<DataTable> {
        self.parse_bytes(text.as_bytes())
    }

    fn parse_bytes(&self, bytes: &[u8]) -> Result<DataTable> {
        let delimiter = match self.config.delimiter {
            Some(delimiter) => delimiter,
            None => detect_delimiter(bytes, self.config.quote)?,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.config.quote)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(PrismaError::EmptyData("No columns found".to_string()));
        }
        check_unique(&headers)?;

        let limit = self.config.max_rows.unwrap_or(usize::MAX);
        let width = headers.len();
        let mut rows = Vec::new();
        for record in reader.records().take(limit) {
            let record = record?;
            let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(DataTable::new(headers, rows, delimiter))
    }
}

fn check_unique(headers: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(headers.len());
    match headers.iter().find(|h| !seen.insert(h.as_str())) {
        Some(duplicate) => Err(PrismaError::DuplicateColumn {
            column: duplicate.clone(),
        }),
        None => Ok(()),
    }
}

/// SHA-256 of the raw file contents, prefixed with the algorithm name.
fn content_hash(bytes: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(bytes))
}

/// Pick the separator that splits the sampled lines most consistently.
///
/// A candidate must occur in the header line. Candidates that give every
/// sampled line the same field count beat those that don't, then more
/// fields beat fewer, then [`CANDIDATES`] order decides. Falls back to a
/// comma when no candidate occurs.
fn detect_delimiter(bytes: &[u8], quote: u8) -> Result<u8> {
    let text = String::from_utf8_lossy(bytes);
    let sample: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect();
    if sample.is_empty() {
        return Err(PrismaError::EmptyData("No lines to analyze".to_string()));
    }

    let best = CANDIDATES
        .iter()
        .enumerate()
        .filter_map(|(rank, &candidate)| {
            let counts: Vec<usize> = sample
                .iter()
                .map(|line| count_unquoted(line, candidate, quote))
                .collect();
            let header = counts[0];
            (header > 0).then(|| {
                let consistent = counts.iter().all(|&c| c == header);
                ((consistent, header, Reverse(rank)), candidate)
            })
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, candidate)| candidate);

    Ok(best.unwrap_or(b','))
}

/// Occurrences of `delimiter` outside quoted sections of a line.
fn count_unquoted(line: &str, delimiter: u8, quote: u8) -> usize {
    let mut quoted = false;
    line.bytes()
        .filter(|&b| {
            if b == quote {
                quoted = !quoted;
            }
            b == delimiter && !quoted
        })
        .count()
}
