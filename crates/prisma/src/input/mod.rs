//! Input parsing and the typed dataset model.

mod dataset;
mod parser;
mod source;

pub use dataset::{Column, ColumnKind, ColumnValues, Dataset, DatasetOptions};
pub use parser::{Parser, ParserConfig};
pub use source::{DataTable, SourceFormat, SourceMetadata};
