use std::{io, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use craft_profit::{
    domain::{evaluate_catalog, Catalog},
    infra::{load_price_file, load_recipe_file, write_report, OutputFormat},
    util::{
        settings::load_settings,
        version::{version_label, APP_NAME},
    },
};

#[derive(Parser)]
#[command(name = "craft-profit", version)]
#[command(about = "Cost, simple profit and cumulative profit for every item of a price table")]
struct Args {
    /// Price table CSV: name, cost, price, (unused), kind
    price_csv: PathBuf,

    /// Recipe table CSV: target, material, quantity, material, quantity, ...
    recipe_csv: PathBuf,

    /// Compute everything but print no report; log at debug level
    #[arg(short = 'd', long)]
    debug: bool,

    /// Output format (overrides the settings file)
    #[arg(short = 'f', long, value_enum)]
    format: Option<OutputFormat>,

    /// Settings file (defaults to settings.json in the user config directory)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Kind whose cost is taken from the price table; repeat for several
    #[arg(long = "primary-kind")]
    primary_kinds: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
    debug!("{APP_NAME} {}", version_label());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = load_settings(args.config.as_deref())?;
    if !args.primary_kinds.is_empty() {
        settings.primary_kinds = args.primary_kinds;
    }
    if let Some(format) = args.format {
        settings.format = format;
    }

    let prices = load_price_file(&args.price_csv)?;
    let recipes = load_recipe_file(&args.recipe_csv)?;
    let (catalog, mut skipped) = Catalog::from_rows(prices.rows, recipes.rows);
    skipped.extend(prices.skipped);
    skipped.extend(recipes.skipped);
    info!(
        items = catalog.len(),
        skipped_rows = skipped.len(),
        "loaded {} and {}",
        args.price_csv.display(),
        args.recipe_csv.display()
    );

    let summary = evaluate_catalog(&catalog, settings.primary_kinds.iter().cloned());
    if args.debug {
        debug!(
            cost_evaluations = summary.cost_evaluations,
            cumulative_evaluations = summary.cumulative_evaluations,
            "debug run, report skipped"
        );
        return Ok(());
    }

    write_report(
        io::stdout().lock(),
        &summary.items,
        settings.format,
        &settings.unset_marker,
    )?;
    debug!("wrote {} report", settings.format.label());
    Ok(())
}
