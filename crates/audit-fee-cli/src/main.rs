mod commands;
mod config;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::calculators::{FlatFeeArgs, IndicativeFeeArgs};
use commands::directory::{ClientsArgs, PersonnelArgs};
use commands::fees::{CagrFeeArgs, CompareArgs, MultiplierFeeArgs, RecommendArgs};
use commands::growth::{CagrArgs, ConvertArgs, InrArgs};
use commands::wizard::WizardArgs;
use config::AppConfig;

/// Audit fee estimation for client engagements
#[derive(Parser)]
#[command(
    name = "afe",
    version,
    about = "Audit fee estimation for client engagements",
    long_about = "Estimates statutory audit and allied service fees from historical \
                  financials and fees with decimal precision. Runs the CAGR rule engine, \
                  the multiplier schedule and the flat and indicative calculators, and \
                  drives a five-step engagement wizard whose state persists between runs."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compound annual growth rate between two values
    Cagr(CagrArgs),
    /// Propose fees from revenue, profit and fee growth (CAGR rules)
    CagrFee(CagrFeeArgs),
    /// Fees from the base schedule and client multipliers
    MultiplierFee(MultiplierFeeArgs),
    /// Recommended fee: CAGR rules, falling back to the multiplier schedule
    Recommend(RecommendArgs),
    /// Both engines side by side
    Compare(CompareArgs),
    /// Flat schedule calculator (revenue in millions)
    FlatFee(FlatFeeArgs),
    /// Indicative revenue-slab calculator (figures in lakhs)
    IndicativeFee(IndicativeFeeArgs),
    /// Step through the engagement wizard
    Wizard(WizardArgs),
    /// Search the client directory
    Clients(ClientsArgs),
    /// List engagement personnel
    Personnel(PersonnelArgs),
    /// Convert between lakhs and millions
    Convert(ConvertArgs),
    /// Format an amount in Indian rupees
    Inr(InrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    if let Err(e) = telemetry::init(&config.telemetry) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    let storage = &config.storage;
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Cagr(args) => commands::growth::run_cagr(args),
        Commands::CagrFee(args) => commands::fees::run_cagr_fee(args, storage),
        Commands::MultiplierFee(args) => commands::fees::run_multiplier_fee(args, storage),
        Commands::Recommend(args) => commands::fees::run_recommend(args, storage),
        Commands::Compare(args) => commands::fees::run_compare(args, storage),
        Commands::FlatFee(args) => commands::calculators::run_flat_fee(args),
        Commands::IndicativeFee(args) => commands::calculators::run_indicative_fee(args),
        Commands::Wizard(args) => commands::wizard::run_wizard(args, storage),
        Commands::Clients(args) => commands::directory::run_clients(args),
        Commands::Personnel(args) => commands::directory::run_personnel(args),
        Commands::Convert(args) => commands::growth::run_convert(args),
        Commands::Inr(args) => commands::growth::run_inr(args),
        Commands::Version => {
            println!("afe {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
