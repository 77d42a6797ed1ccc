//! Claims command - show what the extractor finds in generated text.

use std::path::PathBuf;

use colored::Colorize;
use prisma::{Claim, ClaimExtractor, Prisma};

pub fn run(
    insights: PathBuf,
    dataset: Option<PathBuf>,
    json: bool,
    config: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    super::require_file(&insights)?;
    let prisma = Prisma::with_config(super::load_config(config)?);
    let text = std::fs::read_to_string(&insights)?;

    let extractor = match dataset {
        Some(path) => {
            super::require_file(&path)?;
            let data = prisma.load_dataset(&path)?;
            prisma.extractor(&data)
        }
        None => ClaimExtractor::new(prisma.config().extraction.clone(), &[]),
    };
    let claims = extractor.extract(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&claims)?);
        return Ok(());
    }

    println!(
        "{} {} claims from {}",
        "Extracted".cyan().bold(),
        claims.len().to_string().white().bold(),
        insights.display()
    );
    println!();
    for claim in &claims {
        print_claim(claim);
    }

    Ok(())
}

fn print_claim(claim: &Claim) {
    println!(
        "{:>3}. {} {}",
        claim.index + 1,
        format!("[{}]", claim.claim_type.label()).cyan(),
        claim.text
    );

    let variables = if claim.variables.is_empty() {
        "-".to_string()
    } else {
        claim.variables.join(", ")
    };
    let mut details = vec![
        format!("variables: {}", variables),
        format!("direction: {}", claim.direction.label()),
    ];
    if claim.negated {
        details.push("negated".to_string());
    }
    if let Some(statistic) = claim.statistic {
        details.push(format!("statistic: {}", statistic.label()));
    }
    if let Some(value) = claim.claimed_value {
        match claim.secondary_value {
            Some(upper) => details.push(format!("values: {} to {}", value, upper)),
            None => details.push(format!("value: {}", value)),
        }
    }
    if let Some(group) = &claim.group {
        let higher = group.higher.as_deref().unwrap_or("?");
        let lower = group.lower.as_deref().unwrap_or("?");
        details.push(format!("{}: {} > {}", group.variable, higher, lower));
    }
    println!("     {}", details.join("  ").dimmed());
}
