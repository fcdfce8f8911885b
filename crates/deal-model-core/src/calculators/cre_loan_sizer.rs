use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::acquisition::debt::{amortize, principal_for_payment};
use crate::rating::{DscrLadder, DscrRating};
use crate::types::*;

use super::{fraction, non_negative};

fn default_target_dscr() -> Multiple {
    DscrLadder::CANONICAL.good_from
}

fn default_max_ltv() -> Rate {
    dec!(0.75)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreLoanSizerInput {
    pub property_value: Money,
    pub purchase_price: Money,
    pub gross_potential_rent: Money,
    #[serde(default)]
    pub other_income: Money,
    #[serde(default)]
    pub vacancy_rate: Rate,
    #[serde(default)]
    pub operating_expenses: Money,
    #[serde(default)]
    pub property_taxes: Money,
    #[serde(default)]
    pub insurance: Money,
    #[serde(default)]
    pub management_pct: Rate,
    #[serde(default)]
    pub reserves_pct: Rate,
    pub interest_rate: Rate,
    pub amortization_years: Years,
    #[serde(default = "default_target_dscr")]
    pub target_dscr: Multiple,
    #[serde(default = "default_max_ltv")]
    pub max_ltv: Rate,
}

/// Which lender test caps the loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstrainingFactor {
    Dscr,
    Ltv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreLoanSizerOutput {
    pub effective_gross_income: Money,
    pub total_operating_expenses: Money,
    pub net_operating_income: Money,
    pub cap_rate: Option<Rate>,
    pub max_loan_by_dscr: Money,
    pub max_loan_by_ltv: Money,
    pub max_loan_amount: Money,
    pub constraining_factor: ConstrainingFactor,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub actual_dscr: Option<Multiple>,
    pub dscr_rating: Option<DscrRating>,
    pub actual_ltv: Option<Rate>,
    pub debt_yield: Option<Rate>,
    pub down_payment_required: Money,
    pub cash_flow_after_debt: Money,
    pub cash_on_cash_return: Option<Rate>,
}

/// Size the largest loan that passes both the DSCR and LTV tests.
pub fn size_cre_loan(input: &CreLoanSizerInput) -> ComputationOutput<CreLoanSizerOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let w = &mut warnings;

    let value = non_negative(input.property_value, "property_value", w);
    let price = non_negative(input.purchase_price, "purchase_price", w);
    let gpr = non_negative(input.gross_potential_rent, "gross_potential_rent", w);
    let other = non_negative(input.other_income, "other_income", w);
    let vacancy = fraction(input.vacancy_rate, "vacancy_rate", w);
    let opex = non_negative(input.operating_expenses, "operating_expenses", w);
    let taxes = non_negative(input.property_taxes, "property_taxes", w);
    let insurance = non_negative(input.insurance, "insurance", w);
    let mgmt_pct = fraction(input.management_pct, "management_pct", w);
    let reserves_pct = fraction(input.reserves_pct, "reserves_pct", w);
    let rate = non_negative(input.interest_rate, "interest_rate", w);
    let amort = non_negative(input.amortization_years, "amortization_years", w);
    let max_ltv = fraction(input.max_ltv, "max_ltv", w);
    let target = if input.target_dscr > Decimal::ZERO {
        input.target_dscr
    } else {
        w.push(format!(
            "target_dscr must be positive; using {}",
            default_target_dscr()
        ));
        default_target_dscr()
    };

    let gpi = gpr + other;
    let egi = gpi - gpi * vacancy;
    let total_opex = opex + taxes + insurance + egi * mgmt_pct + egi * reserves_pct;
    let noi = egi - total_opex;

    let max_ads = (noi / target).max(Decimal::ZERO);
    let by_dscr = principal_for_payment(max_ads / dec!(12), rate, amort);
    let by_ltv = value * max_ltv;
    let (max_loan, factor) = if by_dscr < by_ltv {
        (by_dscr, ConstrainingFactor::Dscr)
    } else {
        (by_ltv, ConstrainingFactor::Ltv)
    };

    let monthly = amortize(max_loan, rate, amort);
    let ads = monthly * dec!(12);
    let actual_dscr = if ads > Decimal::ZERO {
        Some(noi / ads)
    } else {
        None
    };
    let down_payment = price - max_loan;
    let cash_flow = noi - ads;

    if down_payment < Decimal::ZERO {
        w.push("Maximum loan exceeds purchase price".into());
    }

    let output = CreLoanSizerOutput {
        effective_gross_income: egi,
        total_operating_expenses: total_opex,
        net_operating_income: noi,
        cap_rate: if value > Decimal::ZERO {
            Some(noi / value)
        } else {
            None
        },
        max_loan_by_dscr: by_dscr,
        max_loan_by_ltv: by_ltv,
        max_loan_amount: max_loan,
        constraining_factor: factor,
        monthly_payment: monthly,
        annual_debt_service: ads,
        actual_dscr,
        dscr_rating: DscrLadder::CANONICAL.rate_optional(actual_dscr),
        actual_ltv: if value > Decimal::ZERO {
            Some(max_loan / value)
        } else {
            None
        },
        debt_yield: if max_loan > Decimal::ZERO {
            Some(noi / max_loan)
        } else {
            None
        },
        down_payment_required: down_payment,
        cash_flow_after_debt: cash_flow,
        cash_on_cash_return: if down_payment > Decimal::ZERO {
            Some(cash_flow / down_payment)
        } else {
            None
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "CRE Loan Sizing: min(DSCR-constrained, LTV-constrained)",
        input,
        warnings,
        elapsed,
        output,
    )
}
