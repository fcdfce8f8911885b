use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time_value::compound_factor;
use crate::types::*;

use super::inputs::ValidatedInputs;

/// Longest loan term the amortization helpers will schedule (100 years).
pub const MAX_TERM_MONTHS: u32 = 1200;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Number of monthly payments for a term in years: `round(years × 12)`.
pub fn term_months(term_years: Years) -> u32 {
    if term_years <= Decimal::ZERO {
        return 0;
    }
    (term_years * MONTHS_PER_YEAR)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(MAX_TERM_MONTHS)
        .min(MAX_TERM_MONTHS)
}

/// Fixed monthly payment that fully amortizes `principal`.
///
/// `P·r / (1 − (1+r)^−n)` with `r = annual_rate / 12`. A zero (or negative)
/// rate degrades to straight-line `P / n`. No principal or no term means no
/// payment.
pub fn amortize(principal: Money, annual_rate: Rate, term_years: Years) -> Money {
    let n = term_months(term_years);
    if principal <= Decimal::ZERO || n == 0 {
        return Decimal::ZERO;
    }
    let r = annual_rate / MONTHS_PER_YEAR;
    if r <= Decimal::ZERO {
        return principal / Decimal::from(n);
    }
    let interest_only = principal.saturating_mul(r);
    // (1+r)^n beyond decimal range: the payment converges to interest only.
    compound_factor(r, n as u64)
        .filter(|f| *f > Decimal::ONE)
        .and_then(|f| f.checked_div(f - Decimal::ONE))
        .and_then(|ratio| interest_only.checked_mul(ratio))
        .unwrap_or(interest_only)
}

/// Largest principal a fixed monthly payment retires over the term; the
/// inverse of [`amortize`].
pub fn principal_for_payment(monthly_payment: Money, annual_rate: Rate, term_years: Years) -> Money {
    let n = term_months(term_years);
    if monthly_payment <= Decimal::ZERO || n == 0 {
        return Decimal::ZERO;
    }
    let r = annual_rate / MONTHS_PER_YEAR;
    if r <= Decimal::ZERO {
        return monthly_payment * Decimal::from(n);
    }
    let Some(perpetuity) = monthly_payment.checked_div(r) else {
        return monthly_payment.saturating_mul(Decimal::from(n));
    };
    compound_factor(r, n as u64)
        .and_then(|f| (f - Decimal::ONE).checked_div(f))
        .and_then(|retired| perpetuity.checked_mul(retired))
        .unwrap_or(perpetuity)
}

/// Outstanding balance after `payments_made` scheduled payments.
pub fn remaining_balance(
    principal: Money,
    annual_rate: Rate,
    term_years: Years,
    payments_made: u32,
) -> Money {
    let n = term_months(term_years);
    if principal <= Decimal::ZERO || n == 0 {
        return Decimal::ZERO;
    }
    let k = payments_made.min(n);
    if k == n {
        return Decimal::ZERO;
    }
    if k == 0 {
        return principal;
    }

    let r = annual_rate / MONTHS_PER_YEAR;
    if r <= Decimal::ZERO {
        return principal * Decimal::from(n - k) / Decimal::from(n);
    }

    let pmt = amortize(principal, annual_rate, term_years);
    let balance = compound_factor(r, k as u64).and_then(|fk| {
        let grown = principal.checked_mul(fk)?;
        let paid = pmt.checked_mul(fk - Decimal::ONE)?.checked_div(r)?;
        grown.checked_sub(paid)
    });
    // Growth past decimal range: payments barely cover interest.
    balance.unwrap_or(principal).max(Decimal::ZERO)
}

fn to_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Scheduled payments falling inside loan year `year` (1-based).
pub fn payments_in_year(term_years: Years, year: u32) -> u32 {
    let n = term_months(term_years);
    let before = year.saturating_sub(1).saturating_mul(12);
    n.saturating_sub(before).min(12)
}

// ---------------------------------------------------------------------------
// Debt sizing layer
// ---------------------------------------------------------------------------

/// Blended debt service for the financing stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSizing {
    pub term_loan_monthly_payment: Money,
    /// Zero when the seller note is on standby
    pub seller_note_monthly_payment: Money,
    /// Average drawn balance on the revolving line
    pub loc_assumed_balance: Money,
    pub loc_annual_interest: Money,
    /// Term loan + seller note payments × 12 + LOC interest
    pub annual_debt_service: Money,
}

/// Size monthly payments and the blended annual debt service.
///
/// The revolving line is interest-only on `amount × utilization`. The seller
/// note is serviced only when its rate and term are known.
pub fn size_debt(inputs: &ValidatedInputs) -> DebtSizing {
    let fin = &inputs.financing;
    let terms = &inputs.loan_terms;

    let term_pmt = amortize(
        fin.term_loan_amount,
        terms.term_loan_rate,
        terms.term_loan_years,
    );
    let seller_pmt = fin
        .seller_note
        .as_ref()
        .map(|note| amortize(fin.seller_financing_amount, note.rate, note.term_years))
        .unwrap_or(Decimal::ZERO);

    let utilization = terms.loc_utilization.clamp(Decimal::ZERO, Decimal::ONE);
    let loc_balance = fin.revolving_loc_amount * utilization;
    let loc_interest = loc_balance * terms.loc_rate;

    let annual = (term_pmt + seller_pmt) * MONTHS_PER_YEAR + loc_interest;

    debug!(
        term_loan_payment = %term_pmt,
        seller_note_payment = %seller_pmt,
        loc_interest = %loc_interest,
        annual_debt_service = %annual,
        "debt sized"
    );

    DebtSizing {
        term_loan_monthly_payment: term_pmt,
        seller_note_monthly_payment: seller_pmt,
        loc_assumed_balance: loc_balance,
        loc_annual_interest: loc_interest,
        annual_debt_service: annual,
    }
}

// ---------------------------------------------------------------------------
// Amortization schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub period: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub payments: Money,
    pub interest: Money,
    pub principal: Money,
    pub ending_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub number_of_payments: u32,
    pub payments: Vec<ScheduledPayment>,
    pub yearly: Vec<AmortizationYear>,
    pub total_payments: Money,
    pub total_interest: Money,
}

/// Month-by-month schedule with a yearly roll-up.
///
/// Payments and interest are posted in whole cents so every row, every year
/// and the totals sum exactly. The final payment absorbs the rounding
/// residual so the loan closes at zero.
pub fn amortization_schedule(
    principal: Money,
    annual_rate: Rate,
    term_years: Years,
) -> AmortizationSchedule {
    let n = term_months(term_years);
    let pmt = to_cents(amortize(principal, annual_rate, term_years));
    let r = (annual_rate / MONTHS_PER_YEAR).max(Decimal::ZERO);

    let mut payments = Vec::with_capacity(n as usize);
    let mut yearly: Vec<AmortizationYear> = Vec::new();
    let mut balance = if n == 0 {
        Decimal::ZERO
    } else {
        to_cents(principal.max(Decimal::ZERO))
    };
    let mut total_payments = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;

    for period in 1..=n {
        let interest = to_cents(balance.saturating_mul(r));
        let mut principal_paid = pmt - interest;
        if period == n || principal_paid > balance {
            principal_paid = balance;
        }
        let payment = interest + principal_paid;
        balance -= principal_paid;

        total_payments += payment;
        total_interest += interest;

        let year = (period - 1) / 12 + 1;
        match yearly.last_mut() {
            Some(y) if y.year == year => {
                y.payments += payment;
                y.interest += interest;
                y.principal += principal_paid;
                y.ending_balance = balance;
            }
            _ => yearly.push(AmortizationYear {
                year,
                payments: payment,
                interest,
                principal: principal_paid,
                ending_balance: balance,
            }),
        }

        payments.push(ScheduledPayment {
            period,
            payment,
            interest,
            principal: principal_paid,
            balance,
        });
    }

    AmortizationSchedule {
        monthly_payment: pmt,
        number_of_payments: n,
        payments,
        yearly,
        total_payments,
        total_interest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::inputs::{AcquisitionInputs, SellerNoteTerms};
    use rust_decimal_macros::dec;

    #[test]
    fn test_standard_annuity_payment() {
        let pmt = amortize(dec!(500000), dec!(0.075), dec!(10));
        assert!((pmt - dec!(5935.09)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let pmt = amortize(dec!(120000), Decimal::ZERO, dec!(10));
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_no_principal_or_term_means_no_payment() {
        assert_eq!(amortize(Decimal::ZERO, dec!(0.07), dec!(10)), Decimal::ZERO);
        assert_eq!(amortize(dec!(-10), dec!(0.07), dec!(10)), Decimal::ZERO);
        assert_eq!(amortize(dec!(100000), dec!(0.07), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(amortize(dec!(100000), dec!(0.07), dec!(-3)), Decimal::ZERO);
    }

    #[test]
    fn test_principal_for_payment_inverts_amortize() {
        let pmt = amortize(dec!(500000), dec!(0.075), dec!(10));
        let p = principal_for_payment(pmt, dec!(0.075), dec!(10));
        assert!((p - dec!(500000)).abs() < dec!(0.0001));
        assert_eq!(principal_for_payment(dec!(1000), Decimal::ZERO, dec!(10)), dec!(120000));
    }

    #[test]
    fn test_term_months_rounds() {
        assert_eq!(term_months(dec!(10)), 120);
        assert_eq!(term_months(dec!(2.5)), 30);
        assert_eq!(term_months(dec!(0.04)), 0);
        assert_eq!(term_months(dec!(0.05)), 1);
    }

    #[test]
    fn test_remaining_balance_endpoints() {
        let p = dec!(500000);
        assert_eq!(remaining_balance(p, dec!(0.075), dec!(10), 0), p);
        assert_eq!(remaining_balance(p, dec!(0.075), dec!(10), 120), Decimal::ZERO);
        assert_eq!(remaining_balance(p, dec!(0.075), dec!(10), 500), Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_matches_schedule() {
        let schedule = amortization_schedule(dec!(500000), dec!(0.075), dec!(10));
        let closed_form = remaining_balance(dec!(500000), dec!(0.075), dec!(10), 36);
        let walked = schedule.payments[35].balance;
        assert!((closed_form - walked).abs() < dec!(1), "{closed_form} vs {walked}");
    }

    #[test]
    fn test_remaining_balance_zero_rate() {
        let bal = remaining_balance(dec!(120000), Decimal::ZERO, dec!(10), 60);
        assert_eq!(bal, dec!(60000));
    }

    #[test]
    fn test_schedule_totals() {
        let s = amortization_schedule(dec!(500000), dec!(0.075), dec!(10));
        assert_eq!(s.number_of_payments, 120);
        assert_eq!(s.payments.len(), 120);
        assert_eq!(s.yearly.len(), 10);
        assert_eq!(s.payments.last().unwrap().balance, Decimal::ZERO);
        assert_eq!(s.monthly_payment, dec!(5935.09));
        assert_eq!(s.total_payments - dec!(500000), s.total_interest);
        let exact = amortize(dec!(500000), dec!(0.075), dec!(10)) * dec!(120) - dec!(500000);
        assert!((exact - s.total_interest).abs() < dec!(1));
    }

    #[test]
    fn test_schedule_rows_are_whole_cents() {
        let s = amortization_schedule(dec!(250000), dec!(0.09), dec!(7));
        for row in &s.payments {
            assert_eq!(row.interest, row.interest.round_dp(2));
            assert_eq!(row.principal, row.principal.round_dp(2));
            assert_eq!(row.payment, row.interest + row.principal);
        }
        let principal: Decimal = s.yearly.iter().map(|y| y.principal).sum();
        assert_eq!(principal, dec!(250000));
    }

    #[test]
    fn test_percent_style_rate_does_not_overflow() {
        // 7.5 read as 750% a year: principal × 1.625^120 is past decimal range.
        let pmt = amortize(dec!(500000), dec!(7.5), dec!(10));
        assert!((pmt - dec!(312500)).abs() < dec!(0.01), "got {pmt}");

        let p = principal_for_payment(pmt, dec!(7.5), dec!(10));
        assert!((p - dec!(500000)).abs() < dec!(1));

        let bal = remaining_balance(dec!(500000), dec!(7.5), dec!(10), 60);
        assert!((bal - dec!(500000)).abs() < dec!(1), "got {bal}");

        let s = amortization_schedule(dec!(500000), dec!(7.5), dec!(10));
        assert_eq!(s.payments.len(), 120);
        assert_eq!(s.payments.last().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_payments_in_year() {
        assert_eq!(payments_in_year(dec!(10), 1), 12);
        assert_eq!(payments_in_year(dec!(10), 10), 12);
        assert_eq!(payments_in_year(dec!(10), 11), 0);
        assert_eq!(payments_in_year(dec!(2.5), 3), 6);
    }

    #[test]
    fn test_size_debt_blends_loc_interest() {
        let mut input = AcquisitionInputs::default();
        input.financing.term_loan_amount = dec!(500000);
        input.financing.revolving_loc_amount = dec!(100000);
        input.loan_terms.term_loan_rate = dec!(0.075);
        input.loan_terms.term_loan_years = dec!(10);
        input.loan_terms.loc_rate = dec!(0.09);
        input.loan_terms.loc_utilization = dec!(0.5);

        let d = size_debt(&input.validate());
        assert_eq!(d.loc_assumed_balance, dec!(50000));
        assert_eq!(d.loc_annual_interest, dec!(4500));
        assert_eq!(d.seller_note_monthly_payment, Decimal::ZERO);
        assert_eq!(
            d.annual_debt_service,
            d.term_loan_monthly_payment * dec!(12) + dec!(4500)
        );
    }

    #[test]
    fn test_seller_note_serviced_when_terms_known() {
        let mut input = AcquisitionInputs::default();
        input.financing.seller_financing_amount = dec!(120000);
        input.financing.seller_note = Some(SellerNoteTerms {
            rate: Decimal::ZERO,
            term_years: dec!(5),
        });
        let d = size_debt(&input.validate());
        assert_eq!(d.seller_note_monthly_payment, dec!(2000));
        assert_eq!(d.annual_debt_service, dec!(24000));
    }

    #[test]
    fn test_all_equity_deal_has_no_debt_service() {
        let d = size_debt(&AcquisitionInputs::default().validate());
        assert_eq!(d.annual_debt_service, Decimal::ZERO);
    }
}
