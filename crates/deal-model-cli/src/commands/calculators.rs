use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use deal_model_core::calculators::business_loan::{calculate_business_loan, BusinessLoanInput};
use deal_model_core::calculators::commercial_property::{
    analyze_commercial_property, CommercialPropertyInput,
};
use deal_model_core::calculators::cre_loan_sizer::{size_cre_loan, CreLoanSizerInput};
use deal_model_core::calculators::dscr::{calculate_dscr, DscrInput};

use super::CommandResult;
use crate::input;

/// Flags win over stdin only when no `--input` file is given and every
/// required flag is present.
fn from_flags_or_input<T: DeserializeOwned>(
    path: Option<&str>,
    flags: Option<T>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    match (path, flags) {
        (None, Some(v)) => Ok(v),
        (p, _) => input::load(p, what),
    }
}

/// Arguments for the quick DSCR check
#[derive(Args)]
pub struct DscrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Seller's discretionary earnings
    #[arg(long)]
    pub sde: Option<Decimal>,

    /// Annual capital expenditure
    #[arg(long, default_value = "0")]
    pub capex: Decimal,

    /// Owner salary taken before debt service
    #[arg(long, default_value = "0")]
    pub salary: Decimal,

    /// Loan principal
    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Annual interest rate as a decimal (0.075 = 7.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<Decimal>,
}

pub fn run_dscr(args: DscrArgs) -> CommandResult {
    let flags = match (args.sde, args.loan, args.rate, args.years) {
        (Some(sde), Some(loan), Some(rate), Some(years)) => Some(DscrInput {
            annual_sde: sde,
            annual_capex: args.capex,
            buyer_salary: args.salary,
            loan_amount: loan,
            annual_rate: rate,
            term_years: years,
        }),
        _ => None,
    };
    let dscr_input = from_flags_or_input(args.input.as_deref(), flags, "dscr")?;
    Ok(serde_json::to_value(calculate_dscr(&dscr_input))?)
}

/// Arguments for business loan amortization
#[derive(Args)]
pub struct BusinessLoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Annual interest rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Only the yearly summary, without monthly rows
    #[arg(long)]
    pub yearly: bool,
}

pub fn run_business_loan(args: BusinessLoanArgs) -> CommandResult {
    let flags = match (args.loan, args.rate, args.years) {
        (Some(loan), Some(rate), Some(years)) => Some(BusinessLoanInput {
            loan_amount: loan,
            annual_rate: rate,
            term_years: years,
            yearly_only: args.yearly,
        }),
        _ => None,
    };
    let loan_input = from_flags_or_input(args.input.as_deref(), flags, "business-loan")?;
    Ok(serde_json::to_value(calculate_business_loan(&loan_input))?)
}

/// Arguments for calculators that only take a JSON document
#[derive(Args)]
pub struct JsonInputArgs {
    /// Path to JSON input file (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_commercial_property(args: JsonInputArgs) -> CommandResult {
    let property: CommercialPropertyInput =
        input::load(args.input.as_deref(), "commercial-property")?;
    Ok(serde_json::to_value(analyze_commercial_property(&property))?)
}

pub fn run_cre_loan_sizer(args: JsonInputArgs) -> CommandResult {
    let sizer: CreLoanSizerInput = input::load(args.input.as_deref(), "cre-loan-sizer")?;
    Ok(serde_json::to_value(size_cre_loan(&sizer))?)
}
