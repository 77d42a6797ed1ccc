//! Claim extraction from free-form generated text.
//!
//! The text is segmented into list items or paragraphs, each segment is
//! tokenized, variables are resolved against the dataset's columns and a
//! claim type, direction and any claimed values are read from keyword cues.

mod claim;
mod extractor;
mod lexicon;
mod resolver;
mod segment;

pub use claim::{
    Claim, ClaimDirection, ClaimTag, ClaimType, DescriptiveStat, GroupComparison, LevelMention,
    TextSpan,
};
pub use extractor::ClaimExtractor;
pub use lexicon::{DescriptiveCues, ExtractionConfig};
pub use resolver::ColumnProfile;
pub use segment::{Segment, segment};
