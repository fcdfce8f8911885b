mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::acquisition::{AnalyzeArgs, DealArgs};
use commands::calculators::{BusinessLoanArgs, DscrArgs, JsonInputArgs};
use commands::returns::PaybackArgs;
use commands::sensitivity::SensitivityArgs;
use config::DealCalcConfig;

/// Small-business acquisition deal analysis
#[derive(Parser)]
#[command(
    name = "dealcalc",
    version,
    about = "Small-business acquisition deal analysis",
    long_about = "Structure an acquisition, size its debt, check coverage and project \
                  multi-year returns with decimal precision. Also bundles standalone \
                  DSCR, business-loan, commercial-property and CRE loan sizing calculators."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (defaults to the config file setting, then json)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log model steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full acquisition model
    Analyze(AnalyzeArgs),
    /// Purchase price and sources & uses only
    Structure(DealArgs),
    /// Debt sizing and term loan amortization
    Debt(DealArgs),
    /// Projection under each configured scenario
    Scenarios(DealArgs),
    /// Two-way sensitivity grid over model drivers
    Sensitivity(SensitivityArgs),
    /// Quick DSCR check for a single loan
    Dscr(DscrArgs),
    /// Business loan amortization schedule
    BusinessLoan(BusinessLoanArgs),
    /// Commercial property acquisition analysis
    CommercialProperty(JsonInputArgs),
    /// Largest CRE loan passing both DSCR and LTV tests
    CreLoanSizer(JsonInputArgs),
    /// Payback, NPV and IRR for a cash flow series
    Payback(PaybackArgs),
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

/// Logs go to stderr so stdout stays machine readable. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match DealCalcConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_filter_str()
    };
    init_tracing(level);

    let format = cli
        .output
        .or_else(|| config.output.format.clone())
        .unwrap_or(OutputFormat::Json);
    let settings = &config.model;

    let result: commands::CommandResult = match cli.command {
        Commands::Analyze(args) => commands::acquisition::run_analyze(args, settings),
        Commands::Structure(args) => commands::acquisition::run_structure(args),
        Commands::Debt(args) => commands::acquisition::run_debt(args),
        Commands::Scenarios(args) => commands::acquisition::run_scenarios_cmd(args, settings),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity_cmd(args),
        Commands::Dscr(args) => commands::calculators::run_dscr(args),
        Commands::BusinessLoan(args) => commands::calculators::run_business_loan(args),
        Commands::CommercialProperty(args) => commands::calculators::run_commercial_property(args),
        Commands::CreLoanSizer(args) => commands::calculators::run_cre_loan_sizer(args),
        Commands::Payback(args) => commands::returns::run_payback(args),
        Commands::Version => {
            println!("dealcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
