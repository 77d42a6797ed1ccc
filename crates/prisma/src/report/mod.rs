//! Metrics and reports.

mod metrics;
#[allow(clippy::module_inception)]
mod report;

pub use metrics::{MetricsAggregator, MetricsSummary, VerdictCounts};
pub use report::{InsightSource, Report};
