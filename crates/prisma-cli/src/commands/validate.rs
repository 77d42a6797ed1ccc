//! Validate command - check generated text against a dataset.

use std::path::PathBuf;

use colored::Colorize;
use prisma::{InsightSource, MetricsSummary, Prisma, Report};

/// Arguments of the validate command.
pub struct Args {
    pub dataset: PathBuf,
    pub insights: PathBuf,
    pub model: Option<String>,
    pub ground_truth: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
}

pub fn run(
    args: Args,
    config: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    super::require_file(&args.dataset)?;
    super::require_file(&args.insights)?;

    let prisma = Prisma::with_config(super::load_config(config)?);
    let dataset = prisma.load_dataset(&args.dataset)?;
    let store = match &args.ground_truth {
        Some(path) => prisma.load_ground_truth(path, &dataset)?,
        None => prisma.compute_ground_truth(&dataset),
    };

    let mut source = InsightSource::new(std::fs::read_to_string(&args.insights)?);
    if let Some(model) = args.model {
        source = source.with_model(model);
    }
    let report = prisma.evaluate(&dataset, &store, &source);

    if let Some(output) = &args.output {
        std::fs::write(output, serde_json::to_string_pretty(&report)?)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report, verbose);
    if let Some(output) = &args.output {
        println!();
        println!("Report saved to {}", output.display().to_string().green());
    }

    Ok(())
}

fn print_report(report: &Report, verbose: bool) {
    println!(
        "{} {}",
        "Validating".cyan().bold(),
        report.dataset.white()
    );
    if let Some(model) = &report.model {
        println!("  {} {}", "Model:".dimmed(), model);
    }
    println!();

    if report.claims.is_empty() {
        println!("{}", "No claims found in the generated text.".yellow());
        return;
    }

    for validated in &report.claims {
        println!(
            "{:>3}. {} {}",
            validated.index() + 1,
            super::verdict_badge(validated.verdict),
            validated.claim.text
        );
        println!("     {}", validated.reason.to_string().dimmed());
        if verbose {
            if let Some(entry) = &validated.evidence {
                println!("     {} {}", "evidence:".dimmed(), entry.key.to_string().dimmed());
            }
        }
    }

    println!();
    print_summary(&report.summary);
}

/// Width of the count labels in the summary, colon included.
const COUNT_LABEL_WIDTH: usize = "Hallucinations:".len();

fn count_label(name: &str) -> String {
    format!("{:<width$}", format!("{}:", name), width = COUNT_LABEL_WIDTH)
}

fn print_summary(summary: &MetricsSummary) {
    println!("{}", "Summary".yellow().bold());
    println!("  {} {}", count_label("Claims"), summary.total.to_string().white().bold());
    println!("  {} {}", count_label("Valid"), summary.valid.to_string().green());
    println!(
        "  {} {}",
        count_label("Hallucinations"),
        summary.hallucinations.to_string().red()
    );
    println!("  {} {}", count_label("Unverified"), summary.unverified.to_string().yellow());
    println!();
    println!(
        "  Hallucination rate:     {}",
        MetricsSummary::format_rate(summary.hallucination_rate).red().bold()
    );
    println!(
        "  Insight validity score: {}",
        MetricsSummary::format_rate(summary.insight_validity_score).green().bold()
    );

    if summary.by_claim_type.len() > 1 {
        println!();
        println!("  {}", "By claim type:".dimmed());
        for (claim_type, counts) in &summary.by_claim_type {
            println!(
                "    {:18} {} valid, {} hallucination, {} unverified",
                claim_type,
                counts.valid.to_string().green(),
                counts.hallucinations.to_string().red(),
                counts.unverified.to_string().yellow()
            );
        }
    }
}
