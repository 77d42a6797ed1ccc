//! Prisma CLI - statistical hallucination validation.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::GroundTruth {
            dataset,
            output,
            json,
        } => commands::ground_truth::run(dataset, output, json, cli.config),

        Commands::Claims {
            insights,
            dataset,
            json,
        } => commands::claims::run(insights, dataset, json, cli.config),

        Commands::Validate {
            dataset,
            insights,
            model,
            ground_truth,
            output,
            json,
        } => commands::validate::run(
            commands::validate::Args {
                dataset,
                insights,
                model,
                ground_truth,
                output,
                json,
            },
            cli.config,
            cli.verbose,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr at WARN unless `RUST_LOG` says otherwise; `--verbose`
/// adds debug output from the library.
fn init_tracing(verbose: bool) {
    let mut filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    if verbose {
        if let Ok(directive) = "prisma=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
