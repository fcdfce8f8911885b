use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::acquisition::coverage::{debt_service_coverage, lendable_cash_flow};
use crate::acquisition::debt::amortize;
use crate::rating::{DscrLadder, DscrRating};
use crate::types::*;

use super::non_negative;

/// Input for the quick DSCR check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DscrInput {
    pub annual_sde: Money,
    #[serde(default)]
    pub annual_capex: Money,
    /// Buyer draw taken before debt service
    #[serde(default)]
    pub buyer_salary: Money,
    pub loan_amount: Money,
    pub annual_rate: Rate,
    pub term_years: Years,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DscrOutput {
    pub lendable_cash_flow: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub net_cash_flow: Money,
    pub dscr: Option<Multiple>,
    pub rating: Option<DscrRating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_description: Option<String>,
    /// Headroom above the lender minimum (`good` band floor)
    pub cushion_to_minimum: Option<Multiple>,
}

/// Single-loan DSCR with the canonical rating.
pub fn calculate_dscr(input: &DscrInput) -> ComputationOutput<DscrOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let sde = non_negative(input.annual_sde, "annual_sde", &mut warnings);
    let capex = non_negative(input.annual_capex, "annual_capex", &mut warnings);
    let salary = non_negative(input.buyer_salary, "buyer_salary", &mut warnings);
    let loan = non_negative(input.loan_amount, "loan_amount", &mut warnings);
    let rate = non_negative(input.annual_rate, "annual_rate", &mut warnings);
    let term = non_negative(input.term_years, "term_years", &mut warnings);

    if rate > Decimal::ONE {
        warnings.push(format!(
            "annual_rate {rate} exceeds 100%; rates are decimals (0.075 = 7.5%)"
        ));
    }

    let lendable = lendable_cash_flow(sde, salary, capex, Decimal::ZERO);
    let monthly = amortize(loan, rate, term);
    let annual = monthly * dec!(12);
    let dscr = debt_service_coverage(lendable, annual);
    let ladder = DscrLadder::CANONICAL;
    let rating = ladder.rate_optional(dscr);

    if dscr.is_none() {
        warnings.push("No debt service; DSCR is not applicable".into());
    }

    let output = DscrOutput {
        lendable_cash_flow: lendable,
        monthly_payment: monthly,
        annual_debt_service: annual,
        net_cash_flow: lendable - annual,
        dscr,
        rating,
        rating_description: rating.map(|r| r.description().to_string()),
        cushion_to_minimum: dscr.map(|d| d - ladder.good_from),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Debt Service Coverage Ratio (canonical ladder)",
        input,
        warnings,
        elapsed,
        output,
    )
}
