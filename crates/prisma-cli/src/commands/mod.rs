//! CLI command implementations.

pub mod claims;
pub mod ground_truth;
pub mod validate;

use std::path::{Path, PathBuf};

use colored::{ColoredString, Colorize};
use prisma::{PrismaConfig, Verdict};

/// Load `--config` if given, defaults otherwise.
pub fn load_config(path: Option<PathBuf>) -> Result<PrismaConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(PrismaConfig::load(path)?),
        None => Ok(PrismaConfig::default()),
    }
}

pub fn require_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    Ok(())
}

pub fn verdict_badge(verdict: Verdict) -> ColoredString {
    let label = format!("{:13}", verdict.label());
    match verdict {
        Verdict::Valid => label.green().bold(),
        Verdict::Unverified => label.yellow().bold(),
        Verdict::Hallucination => label.red().bold(),
    }
}
