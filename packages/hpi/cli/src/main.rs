#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for querying the housing price index cache.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use housing_hpi::{DatasetConfig, paths};
use housing_hpi_models::states;

#[derive(Parser)]
#[command(name = "housing_hpi", about = "Housing price index lookup tool")]
struct Cli {
    /// Path to the HPI dataset (overrides `HPI_DATASET_PATH`)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print price-change metrics for a city
    Lookup {
        /// City name (e.g., "Warren" or "detroit-city")
        city: String,
        /// Two-letter state abbreviation (e.g., "MI")
        state: String,
    },
    /// Print load statistics for the dataset
    Stats,
    /// List indexed geography keys
    Keys {
        /// List state-level keys instead of metro areas
        #[arg(long)]
        state_level: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = DatasetConfig::embedded()?;
    let path = cli.dataset.unwrap_or_else(paths::dataset_path);
    let cache = housing_hpi::global().load(&path, &config);

    match cli.command {
        Commands::Lookup { city, state } => {
            if states::state_name(&state).is_none() {
                log::warn!("{state:?} is not a supported state abbreviation");
            }
            match housing_hpi::global().price_changes(&city, &state)? {
                Some(metrics) => println!("{}", serde_json::to_string_pretty(&metrics)?),
                None => println!("No price history available for {city}, {state}"),
            }
        }
        Commands::Stats => {
            println!("{}", serde_json::to_string_pretty(cache.stats())?);
            println!("{:<12} {}", "Metro areas", cache.metro_keys().count());
            println!("{:<12} {}", "States", cache.state_keys().count());
        }
        Commands::Keys { state_level } => {
            if state_level {
                for abbr in cache.state_keys() {
                    println!("{abbr:<4} {}", states::state_name(abbr).unwrap_or(abbr));
                }
            } else {
                for key in cache.metro_keys() {
                    println!("{key}");
                }
            }
        }
    }

    Ok(())
}
