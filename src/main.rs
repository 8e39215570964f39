mod cli;
mod config;
mod consts;
mod cost;
mod error;
mod ledger;
mod output;
mod pricing;
mod report;
mod tracker;
mod utils;

use std::time::Duration;

use clap::Parser;

use cli::{Cli, Commands, run_price, run_report, run_resolve};
use config::Config;
use consts::PRICING_CACHE_TTL_SECS;
use error::AppError;
use ledger::UsageLedger;
use pricing::PricingSource;
use tracker::CostTracker;

fn main() {
    let cli = Cli::parse();
    let config = if cli.json {
        Config::load_quiet()
    } else {
        Config::load()
    };
    let cli = cli.with_config(&config);
    utils::set_debug(cli.debug);

    if let Err(e) = run(&cli, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &Config) -> Result<(), AppError> {
    let compensation = cost::compensation_from_f64(cli.compensation.unwrap_or(1.0))?;

    let source = PricingSource::new(
        &config.pricing_url(),
        &config.cache_dir(),
        Duration::from_secs(PRICING_CACHE_TTL_SECS),
        cli.offline,
    );
    let ledger = UsageLedger::new(&config.data_dir());
    let tracker = CostTracker::new(source, ledger, compensation);

    match &cli.command {
        Commands::Resolve { model } => run_resolve(&tracker, model, cli.json),
        Commands::Price {
            model,
            input_tokens,
            output_tokens,
            user,
            no_record,
        } => run_price(
            &tracker,
            model,
            *input_tokens,
            *output_tokens,
            user.as_deref(),
            *no_record,
            cli.json,
        ),
        Commands::Report { by_model, year } => run_report(
            tracker.ledger(),
            *by_model,
            *year,
            cli.json,
            cli.use_color(),
        ),
    }
}
