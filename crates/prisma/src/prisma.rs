//! Main Prisma struct and public API.

use std::path::Path;

use tracing::{info, warn};

use crate::claims::{Claim, ClaimExtractor};
use crate::config::PrismaConfig;
use crate::error::{PrismaError, Result};
use crate::ground_truth::{GroundTruthEngine, GroundTruthStore};
use crate::input::{Dataset, Parser, ParserConfig};
use crate::report::{InsightSource, MetricsAggregator, Report};
use crate::validation::{ClaimValidator, ValidatedClaim};

/// The full validation pipeline: dataset, ground truth, claims, verdicts.
pub struct Prisma {
    config: PrismaConfig,
    engine: GroundTruthEngine,
    validator: ClaimValidator,
}

impl Prisma {
    /// Create a new Prisma instance with default configuration.
    pub fn new() -> Self {
        Self::with_config(PrismaConfig::default())
    }

    /// Create a Prisma instance with custom configuration.
    pub fn with_config(config: PrismaConfig) -> Self {
        Self {
            engine: GroundTruthEngine::with_config(config.engine.clone()),
            validator: ClaimValidator::with_config(config.validation.clone()),
            config,
        }
    }

    pub fn config(&self) -> &PrismaConfig {
        &self.config
    }

    /// Parse and type a delimited data file.
    ///
    /// The dataset is named after the file stem and carries the file's
    /// content hash.
    pub fn load_dataset(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();

        let mut parser_config = ParserConfig::default();
        if let Some(delimiter) = self.config.dataset.delimiter {
            let byte = u8::try_from(delimiter)
                .ok()
                .filter(u8::is_ascii)
                .ok_or_else(|| PrismaError::InvalidDelimiter(delimiter.to_string()))?;
            parser_config = parser_config.with_delimiter(byte);
        }

        let (table, source) = Parser::with_config(parser_config).parse_file(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.file.clone());

        let dataset =
            Dataset::from_table(name, &table, &self.config.dataset)?.with_hash(source.hash);
        info!(
            dataset = dataset.name(),
            rows = dataset.row_count(),
            columns = dataset.columns().len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    pub fn compute_ground_truth(&self, dataset: &Dataset) -> GroundTruthStore {
        self.engine.compute(dataset)
    }

    /// Load a cached store for `dataset`.
    ///
    /// The cache is used as is. A hash mismatch is logged but not fatal.
    pub fn load_ground_truth(
        &self,
        path: impl AsRef<Path>,
        dataset: &Dataset,
    ) -> Result<GroundTruthStore> {
        let store = GroundTruthStore::load(path)?;
        if let (Some(cached), Some(current)) =
            (store.metadata().dataset_hash.as_deref(), dataset.hash())
            && cached != current
        {
            warn!(
                dataset = dataset.name(),
                cached,
                current,
                "cached ground truth was computed from different data"
            );
        }
        Ok(store)
    }

    pub fn extractor(&self, dataset: &Dataset) -> ClaimExtractor {
        ClaimExtractor::for_dataset(dataset, self.config.extraction.clone())
    }

    pub fn extract(&self, dataset: &Dataset, text: &str) -> Vec<Claim> {
        self.extractor(dataset).extract(text)
    }

    pub fn validate(&self, claims: &[Claim], store: &GroundTruthStore) -> Vec<ValidatedClaim> {
        self.validator.validate_all(claims, store)
    }

    /// Extract, validate and summarize the claims in `source`.
    pub fn evaluate(
        &self,
        dataset: &Dataset,
        store: &GroundTruthStore,
        source: &InsightSource,
    ) -> Report {
        let claims = self.extract(dataset, &source.text);
        let validated = self.validate(&claims, store);
        MetricsAggregator::report(
            dataset.name(),
            dataset.hash().map(str::to_string),
            source,
            validated,
        )
    }
}

impl Default for Prisma {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Verdict;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn insurance_csv() -> String {
        let mut content = String::from("age,bmi,smoker,charges\n");
        for i in 0..40 {
            let age = 20 + i;
            let smoker = if i % 3 == 0 { "yes" } else { "no" };
            let bmi = 22.0 + (i % 7) as f64;
            let charges = 1000.0 + age as f64 * 250.0 + if smoker == "yes" { 5000.0 } else { 0.0 };
            content.push_str(&format!("{},{:.1},{},{:.2}\n", age, bmi, smoker, charges));
        }
        content
    }

    #[test]
    fn test_load_dataset_names_and_hashes() {
        let file = create_test_file(&insurance_csv());
        let dataset = Prisma::new().load_dataset(file.path()).unwrap();
        assert_eq!(dataset.row_count(), 40);
        assert!(dataset.hash().unwrap().starts_with("sha256:"));
        let stem = file.path().file_stem().unwrap().to_string_lossy().into_owned();
        assert_eq!(dataset.name(), stem);
    }

    #[test]
    fn test_load_dataset_duplicate_column() {
        let file = create_test_file("age,age\n1,2\n3,4\n");
        let err = Prisma::new().load_dataset(file.path()).unwrap_err();
        assert!(matches!(err, PrismaError::DuplicateColumn { ref column } if column == "age"));
    }

    #[test]
    fn test_evaluate_end_to_end() {
        let file = create_test_file(&insurance_csv());
        let prisma = Prisma::new();
        let dataset = prisma.load_dataset(file.path()).unwrap();
        let store = prisma.compute_ground_truth(&dataset);

        let source = InsightSource::new(
            "1. Age is positively correlated with charges.\n\
             2. Smokers have higher charges than non-smokers.\n\
             3. The average BMI is about 25.",
        )
        .with_model("test-model");
        let report = prisma.evaluate(&dataset, &store, &source);

        assert_eq!(report.model.as_deref(), Some("test-model"));
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.claims[0].verdict, Verdict::Valid);
        assert_eq!(report.claims[1].verdict, Verdict::Valid);
        assert_eq!(report.claims[2].verdict, Verdict::Unverified);
    }

    #[test]
    fn test_load_ground_truth_uses_cache() {
        let file = create_test_file(&insurance_csv());
        let prisma = Prisma::new();
        let dataset = prisma.load_dataset(file.path()).unwrap();
        let store = prisma.compute_ground_truth(&dataset);

        let dir = tempfile::TempDir::new().unwrap();
        let cache = dir.path().join("gt.json");
        store.save(&cache).unwrap();

        let loaded = prisma.load_ground_truth(&cache, &dataset).unwrap();
        assert_eq!(loaded, store);
    }
}
