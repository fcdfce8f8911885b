use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::acquisition::debt::{amortize, remaining_balance};
use crate::acquisition::projection::EquityScheduleEntry;
use crate::rating::{DscrLadder, DscrRating};
use crate::time_value::compound_factor;
use crate::types::*;

use super::{fraction, growth_rate, non_negative};

const MAX_HOLD_YEARS: u32 = 50;

/// Income, operating costs and financing for a commercial property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommercialPropertyInput {
    pub purchase_price: Money,
    pub square_feet: Decimal,
    pub base_rent_per_sf: Money,
    #[serde(default)]
    pub cam_per_sf: Money,
    #[serde(default)]
    pub other_income: Money,
    #[serde(default)]
    pub vacancy_rate: Rate,
    #[serde(default)]
    pub property_taxes: Money,
    #[serde(default)]
    pub insurance: Money,
    /// Taxes reimbursed by tenants (NNN)
    #[serde(default)]
    pub tenant_paid_taxes: Money,
    #[serde(default)]
    pub tenant_paid_insurance: Money,
    #[serde(default)]
    pub maintenance: Money,
    #[serde(default)]
    pub utilities: Money,
    /// Share of EGI
    #[serde(default)]
    pub management_pct: Rate,
    /// Share of EGI
    #[serde(default)]
    pub reserves_pct: Rate,
    pub down_payment_pct: Rate,
    pub interest_rate: Rate,
    pub amortization_years: Years,
    #[serde(default)]
    pub appreciation_rate: Rate,
    pub hold_years: u32,
    #[serde(default)]
    pub selling_costs_pct: Rate,
    #[serde(default)]
    pub rent_escalation: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingStatement {
    pub annual_base_rent: Money,
    pub annual_cam: Money,
    pub gross_potential_income: Money,
    pub vacancy_loss: Money,
    pub effective_gross_income: Money,
    pub management_expense: Money,
    pub reserves_expense: Money,
    /// Expenses the landlord carries after tenant reimbursements
    pub landlord_expenses: Money,
    pub expense_ratio: Option<Rate>,
    pub net_operating_income: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommercialPropertyOutput {
    pub operating: OperatingStatement,
    pub price_per_sf: Option<Money>,
    pub noi_per_sf: Option<Money>,
    pub cap_rate: Option<Rate>,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub dscr: Option<Multiple>,
    pub dscr_rating: Option<DscrRating>,
    pub debt_yield: Option<Rate>,
    pub annual_cash_flow: Money,
    pub monthly_cash_flow: Money,
    pub cash_on_cash_return: Option<Rate>,
    /// Year 0 (closing) through the hold year
    pub equity_schedule: Vec<EquityScheduleEntry>,
    pub selling_costs: Money,
    pub sale_proceeds: Money,
    pub base_rent_year_5: Money,
    pub base_rent_year_10: Money,
}

fn per(numerator: Money, denominator: Decimal) -> Option<Decimal> {
    if denominator > Decimal::ZERO {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// Rent roll to NOI, then financing, coverage and a hold-period equity build.
pub fn analyze_commercial_property(
    input: &CommercialPropertyInput,
) -> ComputationOutput<CommercialPropertyOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let w = &mut warnings;

    let price = non_negative(input.purchase_price, "purchase_price", w);
    let sqft = non_negative(input.square_feet, "square_feet", w);
    let base_rent_sf = non_negative(input.base_rent_per_sf, "base_rent_per_sf", w);
    let cam_sf = non_negative(input.cam_per_sf, "cam_per_sf", w);
    let other = non_negative(input.other_income, "other_income", w);
    let vacancy = fraction(input.vacancy_rate, "vacancy_rate", w);
    let taxes = non_negative(input.property_taxes, "property_taxes", w);
    let insurance = non_negative(input.insurance, "insurance", w);
    let tenant_taxes = non_negative(input.tenant_paid_taxes, "tenant_paid_taxes", w);
    let tenant_ins = non_negative(input.tenant_paid_insurance, "tenant_paid_insurance", w);
    let maintenance = non_negative(input.maintenance, "maintenance", w);
    let utilities = non_negative(input.utilities, "utilities", w);
    let mgmt_pct = fraction(input.management_pct, "management_pct", w);
    let reserves_pct = fraction(input.reserves_pct, "reserves_pct", w);
    let dp_pct = fraction(input.down_payment_pct, "down_payment_pct", w);
    let rate = non_negative(input.interest_rate, "interest_rate", w);
    let amort = non_negative(input.amortization_years, "amortization_years", w);
    let sell_pct = fraction(input.selling_costs_pct, "selling_costs_pct", w);
    let appreciation = growth_rate(input.appreciation_rate, "appreciation_rate", w);
    let escalation = growth_rate(input.rent_escalation, "rent_escalation", w);
    let hold = if input.hold_years > MAX_HOLD_YEARS {
        w.push(format!("hold_years capped at {MAX_HOLD_YEARS}"));
        MAX_HOLD_YEARS
    } else {
        input.hold_years
    };

    // Income
    let base_rent = base_rent_sf * sqft;
    let cam = cam_sf * sqft;
    let gpi = base_rent + cam + other;
    let vacancy_loss = gpi * vacancy;
    let egi = gpi - vacancy_loss;

    // Expenses
    let mgmt = egi * mgmt_pct;
    let reserves = egi * reserves_pct;
    let landlord = (taxes - tenant_taxes).max(Decimal::ZERO)
        + (insurance - tenant_ins).max(Decimal::ZERO)
        + maintenance
        + mgmt
        + utilities
        + reserves;
    let noi = egi - landlord;

    // Financing
    let down_payment = price * dp_pct;
    let loan = price - down_payment;
    let monthly = amortize(loan, rate, amort);
    let ads = monthly * dec!(12);
    let dscr = per(noi, ads);
    let acf = noi - ads;

    // Equity build, year 0 is closing.
    let mut schedule = Vec::with_capacity(hold as usize + 1);
    for year in 0..=hold {
        let value = price.saturating_mul(compound_factor(appreciation, year as u64).unwrap_or(Decimal::MAX));
        let balance = remaining_balance(loan, rate, amort, year * 12);
        let equity = value - balance;
        schedule.push(EquityScheduleEntry {
            year,
            asset_value: value,
            loan_balance: balance,
            owner_equity: equity,
            equity_percent: per(equity, value).unwrap_or(Decimal::ZERO),
        });
    }
    let (exit_value, exit_balance) = schedule
        .last()
        .map(|e| (e.asset_value, e.loan_balance))
        .unwrap_or((price, loan));
    let selling_costs = exit_value * sell_pct;

    let escalate = |years: u64| {
        base_rent.saturating_mul(compound_factor(escalation, years).unwrap_or(Decimal::MAX))
    };

    let output = CommercialPropertyOutput {
        operating: OperatingStatement {
            annual_base_rent: base_rent,
            annual_cam: cam,
            gross_potential_income: gpi,
            vacancy_loss,
            effective_gross_income: egi,
            management_expense: mgmt,
            reserves_expense: reserves,
            landlord_expenses: landlord,
            expense_ratio: per(landlord, egi),
            net_operating_income: noi,
        },
        price_per_sf: per(price, sqft),
        noi_per_sf: per(noi, sqft),
        cap_rate: per(noi, price),
        down_payment,
        loan_amount: loan,
        monthly_payment: monthly,
        annual_debt_service: ads,
        dscr,
        dscr_rating: DscrLadder::CANONICAL.rate_optional(dscr),
        debt_yield: per(noi, loan),
        annual_cash_flow: acf,
        monthly_cash_flow: acf / dec!(12),
        cash_on_cash_return: per(acf, down_payment),
        equity_schedule: schedule,
        selling_costs,
        sale_proceeds: exit_value - exit_balance - selling_costs,
        base_rent_year_5: escalate(5),
        base_rent_year_10: escalate(10),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Commercial Property: NOI, cap rate, DSCR, equity build",
        input,
        warnings,
        elapsed,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn property() -> CommercialPropertyInput {
        CommercialPropertyInput {
            purchase_price: dec!(2000000),
            square_feet: dec!(10000),
            base_rent_per_sf: dec!(20),
            cam_per_sf: dec!(4),
            other_income: Decimal::ZERO,
            vacancy_rate: dec!(0.05),
            property_taxes: dec!(30000),
            insurance: dec!(8000),
            tenant_paid_taxes: dec!(30000),
            tenant_paid_insurance: dec!(5000),
            maintenance: dec!(12000),
            utilities: dec!(6000),
            management_pct: dec!(0.04),
            reserves_pct: dec!(0.02),
            down_payment_pct: dec!(0.30),
            interest_rate: dec!(0.07),
            amortization_years: dec!(25),
            appreciation_rate: dec!(0.02),
            hold_years: 10,
            selling_costs_pct: dec!(0.04),
            rent_escalation: dec!(0.03),
        }
    }

    #[test]
    fn test_noi_waterfall() {
        let out = analyze_commercial_property(&property());
        let op = &out.result.operating;
        assert_eq!(op.gross_potential_income, dec!(240000));
        assert_eq!(op.vacancy_loss, dec!(12000));
        assert_eq!(op.effective_gross_income, dec!(228000));
        // taxes fully reimbursed; insurance 3k net; mgmt 9,120; reserves 4,560
        assert_eq!(op.landlord_expenses, dec!(34680));
        assert_eq!(op.net_operating_income, dec!(193320));
        assert_eq!(out.result.cap_rate, Some(dec!(0.09666)));
    }

    #[test]
    fn test_financing_and_coverage() {
        let out = analyze_commercial_property(&property());
        let r = &out.result;
        assert_eq!(r.down_payment, dec!(600000));
        assert_eq!(r.loan_amount, dec!(1400000));
        assert_eq!(r.annual_debt_service, r.monthly_payment * dec!(12));
        assert_eq!(r.dscr_rating, DscrLadder::CANONICAL.rate_optional(r.dscr));
        assert_eq!(r.debt_yield, Some(dec!(193320) / dec!(1400000)));
        assert_eq!(r.cash_on_cash_return, Some(r.annual_cash_flow / dec!(600000)));
    }

    #[test]
    fn test_equity_schedule_and_sale() {
        let out = analyze_commercial_property(&property());
        let r = &out.result;
        assert_eq!(r.equity_schedule.len(), 11);
        assert_eq!(r.equity_schedule[0].loan_balance, dec!(1400000));
        assert_eq!(r.equity_schedule[0].owner_equity, dec!(600000));
        for pair in r.equity_schedule.windows(2) {
            assert!(pair[1].loan_balance < pair[0].loan_balance);
            assert!(pair[1].owner_equity > pair[0].owner_equity);
        }
        let last = r.equity_schedule.last().unwrap();
        assert_eq!(r.selling_costs, last.asset_value * dec!(0.04));
        assert_eq!(
            r.sale_proceeds,
            last.asset_value - last.loan_balance - r.selling_costs
        );
    }

    #[test]
    fn test_rent_escalation() {
        let out = analyze_commercial_property(&property());
        let expected = dec!(200000) * compound_factor(dec!(0.03), 5).unwrap();
        assert_eq!(out.result.base_rent_year_5, expected);
    }

    #[test]
    fn test_all_cash_purchase_has_no_dscr() {
        let mut p = property();
        p.down_payment_pct = Decimal::ONE;
        let out = analyze_commercial_property(&p);
        assert_eq!(out.result.loan_amount, Decimal::ZERO);
        assert!(out.result.dscr.is_none());
        assert!(out.result.dscr_rating.is_none());
        assert!(out.result.debt_yield.is_none());
    }

    #[test]
    fn test_growth_below_total_loss_is_clamped_with_warning() {
        let mut input = property();
        input.appreciation_rate = dec!(-1.5);
        input.rent_escalation = dec!(-2);
        let out = analyze_commercial_property(&input);
        assert!(out.warnings.iter().any(|w| w.starts_with("appreciation_rate -1.5")));
        assert!(out.warnings.iter().any(|w| w.starts_with("rent_escalation -2")));
        assert_eq!(out.result.base_rent_year_5, Decimal::ZERO);
        assert_eq!(out.result.equity_schedule[0].asset_value, dec!(2000000));
        assert!(out.result.equity_schedule[1..].iter().all(|y| y.asset_value.is_zero()));
    }

    #[test]
    fn test_percentage_inputs_are_clamped() {
        let mut p = property();
        p.vacancy_rate = dec!(5);
        let out = analyze_commercial_property(&p);
        assert_eq!(out.result.operating.effective_gross_income, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("vacancy_rate")));
    }
}
