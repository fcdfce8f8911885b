use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::acquisition::debt::{amortization_schedule, AmortizationSchedule};
use crate::types::*;

use super::non_negative;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessLoanInput {
    pub loan_amount: Money,
    pub annual_rate: Rate,
    pub term_years: Years,
    /// Omit the month-by-month rows from the output
    #[serde(default)]
    pub yearly_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessLoanOutput {
    pub monthly_payment: Money,
    pub annual_payment: Money,
    pub total_payments: Money,
    pub total_interest: Money,
    /// Interest as a share of principal
    pub interest_to_principal: Option<Rate>,
    pub schedule: AmortizationSchedule,
}

/// Fixed-rate business loan amortization.
pub fn calculate_business_loan(input: &BusinessLoanInput) -> ComputationOutput<BusinessLoanOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let principal = non_negative(input.loan_amount, "loan_amount", &mut warnings);
    let rate = non_negative(input.annual_rate, "annual_rate", &mut warnings);
    let term = non_negative(input.term_years, "term_years", &mut warnings);

    let mut schedule = amortization_schedule(principal, rate, term);
    if schedule.number_of_payments == 0 && principal > Decimal::ZERO {
        warnings.push("Loan term rounds to zero months; no payments scheduled".into());
    }
    if input.yearly_only {
        schedule.payments.clear();
    }

    let output = BusinessLoanOutput {
        monthly_payment: schedule.monthly_payment,
        annual_payment: schedule.monthly_payment * Decimal::from(12),
        total_payments: schedule.total_payments,
        total_interest: schedule.total_interest,
        interest_to_principal: if principal > Decimal::ZERO {
            Some(schedule.total_interest / principal)
        } else {
            None
        },
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Fixed-Rate Loan Amortization",
        input,
        warnings,
        elapsed,
        output,
    )
}
