//! CLI subcommand definitions and handlers.

use chrono::{Datelike, Local};
use clap::Subcommand;

use crate::consts::UNKNOWN_USER;
use crate::error::AppError;
use crate::ledger::UsageLedger;
use crate::output::{
    format_cost, output_price_json, output_report_json, output_resolution_json,
    print_report_table,
};
use crate::report::{GroupBy, grand_total, summarize};
use crate::tracker::CostTracker;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Resolve a model name to its pricing entry
    Resolve {
        /// Raw model name; vendor prefixes and fine-tune suffixes allowed
        model: String,
    },
    /// Price one call and append it to the usage ledger
    Price {
        /// Raw model name; vendor prefixes and fine-tune suffixes allowed
        model: String,
        /// Input (prompt) token count
        #[arg(long, value_name = "N")]
        input_tokens: u64,
        /// Output (completion) token count
        #[arg(long, value_name = "N")]
        output_tokens: u64,
        /// User identity recorded in the ledger
        #[arg(long)]
        user: Option<String>,
        /// Compute the cost without recording it
        #[arg(long)]
        no_record: bool,
    },
    /// Summarize the usage ledger
    Report {
        /// Group by model instead of user
        #[arg(long)]
        by_model: bool,
        /// Ledger year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },
}

pub(crate) fn run_resolve(tracker: &CostTracker, model: &str, json: bool) -> Result<(), AppError> {
    let resolution = tracker.resolve_model(model)?;

    if json {
        output_resolution_json(&resolution);
        return Ok(());
    }

    match &resolution.canonical {
        Some(key) => {
            println!("{} -> {}", resolution.query, key);
            let input = resolution
                .pricing
                .input_cost_per_token
                .map(|d| format!("${d}"))
                .unwrap_or_else(|| "n/a".to_string());
            let output = resolution
                .pricing
                .output_cost_per_token
                .map(|d| format!("${d}"))
                .unwrap_or_else(|| "n/a".to_string());
            println!("  input:  {input}/token");
            println!("  output: {output}/token");
        }
        None => println!("No pricing match for '{}'", resolution.query),
    }
    Ok(())
}

pub(crate) fn run_price(
    tracker: &CostTracker,
    model: &str,
    input_tokens: u64,
    output_tokens: u64,
    user: Option<&str>,
    no_record: bool,
    json: bool,
) -> Result<(), AppError> {
    let user = user.unwrap_or(UNKNOWN_USER);

    let (cost, record) = if no_record {
        tracker.resolve_and_price(model, input_tokens, output_tokens, user)?
    } else {
        tracker.track(model, input_tokens, output_tokens, user)?
    };

    if json {
        output_price_json(cost, &record, !no_record);
    } else {
        println!(
            "{} | {} in + {} out tokens | ${}",
            record.model, record.input_tokens, record.output_tokens, cost
        );
    }
    Ok(())
}

pub(crate) fn run_report(
    ledger: &UsageLedger,
    by_model: bool,
    year: Option<i32>,
    json: bool,
    use_color: bool,
) -> Result<(), AppError> {
    let year = year.unwrap_or_else(|| Local::now().year());
    let group = if by_model {
        GroupBy::Model
    } else {
        GroupBy::User
    };

    let records = ledger.load_year(year)?;
    let rows = summarize(&records, group);

    if json {
        output_report_json(&rows, group, year);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No usage recorded for {year}.");
        return Ok(());
    }

    print_report_table(&rows, group, use_color);
    let total = grand_total(&rows);
    println!(
        "\n  {} records, {} total\n",
        records.len(),
        format_cost(total.total_cost)
    );
    Ok(())
}
