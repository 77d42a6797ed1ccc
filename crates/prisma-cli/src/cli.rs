//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Prisma: statistical hallucination validation for generated insights
#[derive(Parser)]
#[command(name = "prisma")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute ground truth for a dataset and cache it
    GroundTruth {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "DATASET")]
        dataset: PathBuf,

        /// Output path for the store (default: <dataset>.ground_truth.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the store as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show the claims extracted from generated text
    Claims {
        /// Path to the generated text
        #[arg(value_name = "INSIGHTS")]
        insights: PathBuf,

        /// Resolve variables against this dataset's columns
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate generated text against a dataset
    Validate {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "DATASET")]
        dataset: PathBuf,

        /// Path to the generated text
        #[arg(short, long)]
        insights: PathBuf,

        /// Model that generated the text
        #[arg(short, long)]
        model: Option<String>,

        /// Cached ground truth to use instead of recomputing
        #[arg(short, long)]
        ground_truth: Option<PathBuf>,

        /// Write the report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}
