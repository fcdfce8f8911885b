use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::DealModelError;
use crate::types::{Money, Rate, Years};
use crate::DealModelResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// `(1 + rate)^periods`, or `None` when the factor overflows 128-bit decimal range.
pub fn compound_factor(rate: Rate, periods: u64) -> Option<Decimal> {
    (Decimal::ONE + rate).checked_powu(periods)
}

/// Net Present Value of a series of cash flows (index 0 is undiscounted).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> DealModelResult<Money> {
    if rate <= dec!(-1) {
        return Err(DealModelError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                DealModelError::DivisionByZero {
                    context: format!("NPV discount factor out of range at period {t}"),
                }
            })?;
        }
        result += cf
            .checked_div(discount)
            .ok_or_else(|| DealModelError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            })?;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson
pub fn irr(cash_flows: &[Money], guess: Rate) -> DealModelResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(DealModelError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    let has_outflow = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_inflow = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !has_outflow || !has_inflow {
        return Err(DealModelError::InsufficientData(
            "IRR requires at least one negative and one positive cash flow".into(),
        ));
    }

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let one_plus_r = Decimal::ONE + rate;
        let mut npv_val = Decimal::ZERO;
        let mut dnpv = Decimal::ZERO;
        let mut discount = Decimal::ONE;

        for (t, cf) in cash_flows.iter().enumerate() {
            if t > 0 {
                // Flows beyond decimal range contribute nothing measurable.
                match discount.checked_mul(one_plus_r) {
                    Some(d) => discount = d,
                    None => break,
                }
            }
            let term = match cf.checked_div(discount) {
                Some(v) => v,
                None => {
                    return Err(DealModelError::ConvergenceFailure {
                        function: "IRR".into(),
                        iterations: i,
                        last_delta: npv_val,
                    })
                }
            };
            npv_val += term;
            if t > 0 {
                if let Some(d) = (Decimal::from(t as i64) * term).checked_div(one_plus_r) {
                    dnpv -= d;
                }
            }
        }

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(DealModelError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        rate -= npv_val / dnpv;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(10.0) {
            rate = dec!(10.0);
        }
    }

    Err(DealModelError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv(rate, cash_flows).unwrap_or(Decimal::MAX),
    })
}

/// Simple payback: years until cumulative flows recover `investment`,
/// interpolated linearly inside the crossing year.
///
/// `flows[0]` is the year-1 flow. Returns `None` when nothing was invested
/// or when the horizon ends before recovery.
pub fn payback_period(investment: Money, flows: &[Money]) -> Option<Years> {
    if investment <= Decimal::ZERO {
        return None;
    }
    let mut cumulative = Decimal::ZERO;
    for (t, cf) in flows.iter().enumerate() {
        let prior = cumulative;
        cumulative += cf;
        if cumulative >= investment {
            let remaining = investment - prior;
            let fraction = if cf.is_zero() {
                Decimal::ONE
            } else {
                remaining / cf
            };
            return Some(Decimal::from(t as i64) + fraction);
        }
    }
    None
}

/// Discounted payback: same walk as [`payback_period`] on flows discounted
/// at `rate` (year-1 flow discounted one period).
pub fn discounted_payback_period(investment: Money, flows: &[Money], rate: Rate) -> Option<Years> {
    if rate <= dec!(-1) {
        return None;
    }
    let one_plus_r = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    let mut discounted = Vec::with_capacity(flows.len());
    for cf in flows {
        factor = factor.checked_mul(one_plus_r)?;
        discounted.push(cf.checked_div(factor)?);
    }
    payback_period(investment, &discounted)
}
