use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use deal_model_core::time_value;

use super::CommandResult;

/// Arguments for a standalone payback calculation
#[derive(Args)]
pub struct PaybackArgs {
    /// Cash invested up front
    #[arg(long)]
    pub investment: Decimal,

    /// Yearly cash flows starting in year 1 (comma-separated, e.g. "50000,50000,50000")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,

    /// Discount rate for NPV and discounted payback
    #[arg(long)]
    pub discount_rate: Option<Decimal>,
}

pub fn run_payback(args: PaybackArgs) -> CommandResult {
    let mut warnings: Vec<String> = Vec::new();
    let payback = time_value::payback_period(args.investment, &args.cash_flows);
    if payback.is_none() {
        warnings.push("Investment is not recovered within the cash flows given".into());
    }

    let mut flows = Vec::with_capacity(args.cash_flows.len() + 1);
    flows.push(-args.investment);
    flows.extend_from_slice(&args.cash_flows);

    let (npv, discounted) = match args.discount_rate {
        Some(rate) => (
            Some(time_value::npv(rate, &flows)?),
            time_value::discounted_payback_period(args.investment, &args.cash_flows, rate),
        ),
        None => (None, None),
    };
    let irr = time_value::irr(&flows, dec!(0.10)).ok();

    Ok(json!({
        "result": {
            "payback_period_years": payback,
            "discounted_payback_years": discounted,
            "npv": npv,
            "irr": irr,
        },
        "warnings": warnings,
    }))
}
