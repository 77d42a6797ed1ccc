//! Ground-truth command - compute and cache every statistic for a dataset.

use std::path::{Path, PathBuf};

use colored::Colorize;
use prisma::Prisma;

pub fn run(
    dataset: PathBuf,
    output: Option<PathBuf>,
    json: bool,
    config: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    super::require_file(&dataset)?;
    let prisma = Prisma::with_config(super::load_config(config)?);

    let data = prisma.load_dataset(&dataset)?;
    let store = prisma.compute_ground_truth(&data);

    let output = output.unwrap_or_else(|| default_output(&dataset));
    store.save(&output)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&store)?);
        return Ok(());
    }

    let metadata = store.metadata();
    println!(
        "{} {}",
        "Ground truth".cyan().bold(),
        metadata.dataset.white()
    );
    println!(
        "  {} rows, {} columns, alpha = {}",
        metadata.row_count, metadata.column_count, metadata.alpha
    );
    println!(
        "  {} entries ({} significant, {} undefined)",
        store.len().to_string().white().bold(),
        store.significant_count().to_string().green(),
        store.undefined_count().to_string().yellow()
    );
    if let Some(hash) = &metadata.dataset_hash {
        println!("  {} {}", "Hash:".dimmed(), hash.dimmed());
    }
    println!();
    println!("Saved to {}", output.display().to_string().green());

    Ok(())
}

/// `<dir>/<stem>.ground_truth.json` next to the dataset.
fn default_output(dataset: &Path) -> PathBuf {
    let stem = dataset
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    dataset.with_file_name(format!("{}.ground_truth.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_sits_next_to_dataset() {
        let path = default_output(Path::new("data/insurance.csv"));
        assert_eq!(path, PathBuf::from("data/insurance.ground_truth.json"));
    }
}
