//! Configuration file support.
//!
//! A configuration file is TOML with one optional table per stage:
//!
//! ```toml
//! [dataset]
//! categorical_columns = ["children"]
//!
//! [engine]
//! alpha = 0.01
//!
//! [extraction.aliases]
//! charges = ["medical costs", "premiums"]
//!
//! [validation]
//! descriptive_gate = "evaluate_single_variable"
//! ```
//!
//! Every key is optional; anything left out keeps its default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::claims::ExtractionConfig;
use crate::error::{PrismaError, Result};
use crate::ground_truth::EngineConfig;
use crate::input::DatasetOptions;
use crate::validation::ValidationConfig;

/// Configuration for every pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismaConfig {
    pub dataset: DatasetOptions,
    pub engine: EngineConfig,
    pub extraction: ExtractionConfig,
    pub validation: ValidationConfig,
}

impl PrismaConfig {
    /// Load and check a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| PrismaError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.check()?;
        Ok(config)
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Reject values no stage can work with.
    pub fn check(&self) -> Result<()> {
        check_alpha("engine.alpha", self.engine.alpha)?;
        check_alpha("validation.alpha", self.validation.alpha)?;

        let t = &self.engine.effect_size_thresholds;
        if !(0.0 <= t.small && t.small <= t.medium && t.medium <= t.large) {
            return Err(PrismaError::Config(format!(
                "engine.effect_size_thresholds must be ascending, got {} / {} / {}",
                t.small, t.medium, t.large
            )));
        }

        if !(0.0..=1.0).contains(&self.extraction.fuzzy_threshold) {
            return Err(PrismaError::Config(format!(
                "extraction.fuzzy_threshold must be within [0, 1], got {}",
                self.extraction.fuzzy_threshold
            )));
        }

        for (key, value) in [
            ("validation.tolerance_std", self.validation.tolerance_std),
            ("validation.count_tolerance", self.validation.count_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PrismaError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    key, value
                )));
            }
        }

        Ok(())
    }
}

fn check_alpha(key: &str, alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(PrismaError::Config(format!(
            "{} must be between 0 and 1, got {}",
            key, alpha
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::DescriptiveGate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = PrismaConfig::from_toml("").unwrap();
        assert_eq!(config, PrismaConfig::default());
        assert_eq!(config.engine.alpha, 0.05);
        assert_eq!(config.validation.tolerance_std, 1.0);
        assert_eq!(config.extraction.fuzzy_threshold, 0.85);
    }

    #[test]
    fn test_partial_sections() {
        let config = PrismaConfig::from_toml(
            r#"
            [dataset]
            categorical_columns = ["children"]
            delimiter = ";"

            [engine]
            alpha = 0.01

            [extraction.aliases]
            charges = ["medical costs"]

            [validation]
            descriptive_gate = "evaluate_single_variable"
            "#,
        )
        .unwrap();

        assert_eq!(config.dataset.categorical_columns, vec!["children"]);
        assert_eq!(config.dataset.delimiter, Some(';'));
        assert_eq!(config.engine.alpha, 0.01);
        assert_eq!(config.engine.max_categorical_levels, 50);
        assert_eq!(config.extraction.aliases["charges"], vec!["medical costs"]);
        assert!(!config.extraction.positive_cues.is_empty());
        assert_eq!(
            config.validation.descriptive_gate,
            DescriptiveGate::EvaluateSingleVariable
        );
    }

    #[test]
    fn test_rejects_bad_alpha() {
        let err = PrismaConfig::from_toml("[validation]\nalpha = 1.5").unwrap_err();
        assert!(err.to_string().contains("validation.alpha"));
    }

    #[test]
    fn test_rejects_unknown_gate() {
        let err =
            PrismaConfig::from_toml("[validation]\ndescriptive_gate = \"sometimes\"").unwrap_err();
        assert!(matches!(err, PrismaError::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nparallel = false").unwrap();
        let config = PrismaConfig::load(file.path()).unwrap();
        assert!(!config.engine.parallel);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = PrismaConfig::load("/nonexistent/prisma.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/prisma.toml"));
    }
}
