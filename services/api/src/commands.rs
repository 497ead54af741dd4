use crate::infra::{load_reference_data, ReferenceData};
use crate::requests::{replay_estimate, EstimateRequest};
use aid_engine::config::AppConfig;
use aid_engine::error::AppError;
use aid_engine::estimation::{simulate, BracketMatch, EstimateResult, EvaluatedAid};
use clap::Args;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct SourceArgs {
    /// Aid catalog JSON file (overrides AID_CATALOG_PATH)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// QF barème CSV file (overrides AID_BAREME_PATH)
    #[arg(long)]
    pub(crate) bareme: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    /// Household quotient familial; omit when unknown
    #[arg(long)]
    pub(crate) qf: Option<i64>,
    /// Activity price in cents
    #[arg(long)]
    pub(crate) price_cents: i64,
    #[command(flatten)]
    pub(crate) sources: SourceArgs,
}

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// JSON file holding the stage and cumulative inputs
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Print the raw JSON result instead of the summary
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) sources: SourceArgs,
}

fn reference_data(sources: SourceArgs) -> Result<ReferenceData, AppError> {
    let mut catalog = AppConfig::load()?.catalog;
    if let Some(path) = sources.catalog {
        catalog.catalog_path = Some(path);
    }
    if let Some(path) = sources.bareme {
        catalog.bareme_path = Some(path);
    }
    load_reference_data(&catalog)
}

pub(crate) fn run_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let SimulateArgs {
        qf,
        price_cents,
        sources,
    } = args;
    let reference = reference_data(sources)?;
    let outcome = simulate(&reference.bareme, qf, price_cents)?;

    println!("Bracket simulation");
    let note = match outcome.matched {
        BracketMatch::InRange => "",
        BracketMatch::DefaultedToLowest => " (QF unknown, lowest bracket applied)",
        BracketMatch::ClampedToTop => " (QF above the table, top bracket applied)",
    };
    println!("- Bracket {}{}", outcome.bracket_label, note);
    println!("- Price: {}", format_cents(outcome.price_cents));
    println!("- Aid: {}", format_cents(outcome.aid_cents));
    println!(
        "- Left to pay: {}",
        format_cents(outcome.reste_a_charge_cents)
    );
    Ok(())
}

pub(crate) fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let EstimateArgs {
        input,
        json,
        sources,
    } = args;
    let reference = reference_data(sources)?;
    let request: EstimateRequest = serde_json::from_reader(BufReader::new(File::open(input)?))?;
    let result = replay_estimate(&reference, request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_estimate(&result));
    }
    Ok(())
}

pub(crate) fn render_estimate(result: &EstimateResult) -> String {
    let totals = &result.totals;
    let mut lines = vec![
        format!(
            "Estimate ({} stage, {} confidence)",
            result.stage.label(),
            result.confidence.label()
        ),
        format!("- Price: {}", format_cents(totals.price_cents)),
        format!(
            "- Left to pay: {} now, {} if potential aids are confirmed",
            format_cents(totals.reste_actuel_cents),
            format_cents(totals.reste_estime_cents)
        ),
    ];

    if result.catalog_degraded {
        lines.push("- Aid catalog unavailable".to_string());
    }

    let sections: [(&str, &[EvaluatedAid]); 4] = [
        ("Confirmed", &result.confirmed),
        ("Potential", &result.potential),
        ("Not eligible", &result.ineligible),
        ("Not combined", &result.superseded),
    ];
    for (title, aids) in sections {
        if aids.is_empty() {
            continue;
        }
        lines.push(format!("{title}:"));
        for aid in aids {
            lines.push(render_aid(aid));
        }
    }

    lines.push(result.guidance.clone());
    lines.join("\n")
}

fn render_aid(aid: &EvaluatedAid) -> String {
    let amount = aid
        .amount_cents
        .or(aid.possible_amount_cents)
        .map(|cents| format!(" {}", format_cents(cents)))
        .unwrap_or_default();
    match aid.reason() {
        Some(reason) => format!("  - {}{} ({})", aid.short_label, amount, reason),
        None => format!("  - {}{}", aid.short_label, amount),
    }
}

pub(crate) fn format_cents(cents: u32) -> String {
    format!("{}.{:02} €", cents / 100, cents % 100)
}
