//! Ground truth: the statistical facts claims are checked against.
//!
//! [`GroundTruthEngine`] computes a [`GroundTruthStore`] once per dataset.
//! The store is immutable and can be cached to disk with
//! [`GroundTruthStore::save`] and reloaded with [`GroundTruthStore::load`].

mod engine;
mod entry;
mod persistence;
mod store;

pub use engine::{EffectSizeThresholds, EngineConfig, GroundTruthEngine};
pub use entry::{
    Direction, EntryKey, EntryOutcome, GroundTruthEntry, Strength, TestKind, TestResult,
};
pub use store::{GroundTruthStore, STORE_FORMAT_VERSION, StoreMetadata};
