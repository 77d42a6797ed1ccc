//! Prisma: statistical hallucination validation for generated insights.
//!
//! Prisma checks natural-language claims about a tabular dataset against
//! statistics computed from the dataset itself and labels each claim
//! VALID, UNVERIFIED or HALLUCINATION.
//!
//! # Pipeline
//!
//! - **Ground truth**: every pairwise test and descriptive statistic is
//!   computed once into an immutable [`GroundTruthStore`]
//! - **Extraction**: generated text is split into structured [`Claim`]s
//! - **Validation**: each claim is checked against the store
//! - **Metrics**: verdicts are reduced to a hallucination rate and an
//!   insight validity score
//!
//! # Example
//!
//! ```no_run
//! use prisma::{InsightSource, Prisma};
//!
//! let prisma = Prisma::new();
//! let dataset = prisma.load_dataset("insurance.csv").unwrap();
//! let store = prisma.compute_ground_truth(&dataset);
//!
//! let source = InsightSource::new("1. Age is positively correlated with charges.");
//! let report = prisma.evaluate(&dataset, &store, &source);
//!
//! println!("Hallucination rate: {:.2}%", report.summary.hallucination_rate);
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod ground_truth;
pub mod input;
pub mod report;
pub mod stats;
pub mod validation;

mod prisma;

pub use crate::prisma::Prisma;
pub use claims::{Claim, ClaimDirection, ClaimExtractor, ClaimType, ExtractionConfig};
pub use config::PrismaConfig;
pub use error::{PrismaError, Result};
pub use ground_truth::{EngineConfig, GroundTruthEngine, GroundTruthEntry, GroundTruthStore};
pub use input::{Dataset, DatasetOptions};
pub use report::{InsightSource, MetricsAggregator, MetricsSummary, Report};
pub use validation::{ClaimValidator, ValidatedClaim, ValidationConfig, Verdict, VerdictReason};
