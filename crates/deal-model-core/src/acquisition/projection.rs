use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time_value::{self, compound_factor};
use crate::types::*;

use super::analysis::SingleYearModel;
use super::coverage::{debt_service_coverage, lendable_cash_flow};
use super::debt::{payments_in_year, remaining_balance};
use super::inputs::{ExitAssumption, ExitMetric, ExitValuation, ValidatedInputs};

const IRR_GUESS: Rate = dec!(0.10);

/// One row of the equity build-up schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityScheduleEntry {
    pub year: u32,
    /// Business (and real estate) value at year end
    pub asset_value: Money,
    /// Term loan + seller note + drawn LOC at year end
    pub loan_balance: Money,
    pub owner_equity: Money,
    pub equity_percent: Rate,
}

/// One projected operating year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedYear {
    pub year: u32,
    pub revenue: Money,
    pub sde: Money,
    pub capex: Money,
    pub lendable_cash_flow: Money,
    pub debt_service: Money,
    pub dscr: Option<Multiple>,
    /// Lendable cash flow after debt service
    pub pre_tax_cash_flow: Money,
    /// Non-zero only in the exit year
    pub exit_proceeds: Money,
    pub net_cash_flow: Money,
    pub cumulative_cash_flow: Money,
}

/// Settlement of the modeled exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitOutcome {
    pub year: u32,
    /// `metric × multiple`; absent for manual proceeds
    pub gross_value: Option<Money>,
    pub transaction_costs: Money,
    pub debt_payoff: Money,
    pub net_proceeds: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsProjection {
    pub equity_schedule: Vec<EquityScheduleEntry>,
    pub years: Vec<ProjectedYear>,
    /// Buyer equity plus closing costs paid in cash
    pub total_cash_invested: Money,
    /// Year-1 pre-tax cash flow
    pub annual_pre_tax_cash_flow: Money,
    pub cash_on_cash_return: Option<Rate>,
    pub payback_period_years: Option<Years>,
    pub discounted_payback_years: Option<Years>,
    pub npv: Option<Money>,
    pub irr: Option<Rate>,
    pub total_roi: Option<Rate>,
    pub annualized_roi: Option<Rate>,
    pub exit: Option<ExitOutcome>,
    pub warnings: Vec<String>,
}

impl ReturnsProjection {
    /// Cash flows with the initial investment at index 0.
    pub fn investor_cash_flows(&self) -> Vec<Money> {
        let mut flows = Vec::with_capacity(self.years.len() + 1);
        flows.push(-self.total_cash_invested);
        flows.extend(self.years.iter().map(|y| y.net_cash_flow));
        flows
    }

    pub fn cumulative_cash_flow(&self) -> Money {
        self.years
            .last()
            .map(|y| y.cumulative_cash_flow)
            .unwrap_or(Decimal::ZERO)
    }
}

fn growth_factor(rate: Rate, periods: u32) -> Decimal {
    compound_factor(rate, periods as u64).unwrap_or(Decimal::MAX)
}

/// Roll the single-year model across the projection horizon.
///
/// Year 1 reproduces the single-year figures. Later years grow revenue and
/// SDE at `growth_rate` and capex at `expense_growth_rate`; salary, owner
/// rents and LOC interest stay flat. Loan balances follow the closed-form
/// amortization identity. Exit proceeds land only in the exit year.
pub fn project_returns(inputs: &ValidatedInputs, single_year: &SingleYearModel) -> ReturnsProjection {
    let proj = &inputs.projection;
    let ops = &inputs.operating;
    let fin = &inputs.financing;
    let terms = &inputs.loan_terms;
    let debt = &single_year.debt;
    let price = single_year.structure.purchase_price;
    let horizon = proj.projection_years;

    let mut warnings: Vec<String> = Vec::new();
    let mut years: Vec<ProjectedYear> = Vec::with_capacity(horizon as usize);
    let mut schedule: Vec<EquityScheduleEntry> = Vec::with_capacity(horizon as usize);
    let mut exit_outcome: Option<ExitOutcome> = None;
    let mut cumulative = Decimal::ZERO;

    for year in 1..=horizon {
        let growth = growth_factor(proj.growth_rate, year - 1);
        let revenue = ops.annual_revenue.saturating_mul(growth);
        let sde = ops.annual_sde.saturating_mul(growth);
        let capex = single_year
            .coverage
            .total_capex
            .saturating_mul(growth_factor(proj.expense_growth_rate, year - 1));
        let lendable = lendable_cash_flow(
            sde,
            ops.buyer_minimum_salary,
            capex,
            inputs.deal.annual_rents_paid_to_owner_re,
        );

        // Debt service counts only payments that fall inside this year.
        let mut debt_service = debt.term_loan_monthly_payment
            * Decimal::from(payments_in_year(terms.term_loan_years, year))
            + debt.loc_annual_interest;
        let term_balance = remaining_balance(
            fin.term_loan_amount,
            terms.term_loan_rate,
            terms.term_loan_years,
            year * 12,
        );
        let seller_balance = match fin.seller_note {
            Some(ref note) => {
                debt_service += debt.seller_note_monthly_payment
                    * Decimal::from(payments_in_year(note.term_years, year));
                remaining_balance(
                    fin.seller_financing_amount,
                    note.rate,
                    note.term_years,
                    year * 12,
                )
            }
            None => fin.seller_financing_amount,
        };
        let loan_balance = term_balance + seller_balance + debt.loc_assumed_balance;

        let asset_value = match proj.asset_appreciation_rate {
            Some(rate) => price.saturating_mul(growth_factor(rate, year)),
            None => price,
        };
        let owner_equity = asset_value - loan_balance;
        let equity_percent = if asset_value.is_zero() {
            Decimal::ZERO
        } else {
            owner_equity / asset_value
        };

        let pre_tax = lendable - debt_service;
        let exit_proceeds = match proj.exit {
            Some(ref exit) if exit.year == year => {
                let outcome = settle_exit(exit, sde, revenue, loan_balance);
                let net = outcome.net_proceeds;
                exit_outcome = Some(outcome);
                net
            }
            _ => Decimal::ZERO,
        };
        let net = pre_tax + exit_proceeds;
        cumulative = cumulative.saturating_add(net);

        schedule.push(EquityScheduleEntry {
            year,
            asset_value,
            loan_balance,
            owner_equity,
            equity_percent,
        });
        years.push(ProjectedYear {
            year,
            revenue,
            sde,
            capex,
            lendable_cash_flow: lendable,
            debt_service,
            dscr: debt_service_coverage(lendable, debt_service),
            pre_tax_cash_flow: pre_tax,
            exit_proceeds,
            net_cash_flow: net,
            cumulative_cash_flow: cumulative,
        });
    }

    let invested = fin.buyer_equity + fin.closing_costs;
    let annual_pre_tax = years
        .first()
        .map(|y| y.pre_tax_cash_flow)
        .unwrap_or(Decimal::ZERO);
    let net_flows: Vec<Money> = years.iter().map(|y| y.net_cash_flow).collect();

    let cash_on_cash = if invested > Decimal::ZERO {
        Some(annual_pre_tax / invested)
    } else {
        None
    };

    let payback = time_value::payback_period(invested, &net_flows);
    if payback.is_none() && invested > Decimal::ZERO {
        warnings.push(format!(
            "Cash invested is not recovered within {horizon} years; payback undefined"
        ));
    }

    let mut investor_flows = Vec::with_capacity(net_flows.len() + 1);
    investor_flows.push(-invested);
    investor_flows.extend_from_slice(&net_flows);

    let (npv, discounted_payback) = match proj.discount_rate {
        Some(rate) => {
            let npv = match time_value::npv(rate, &investor_flows) {
                Ok(v) => Some(v),
                Err(e) => {
                    warnings.push(format!("NPV not computed: {e}"));
                    None
                }
            };
            (
                npv,
                time_value::discounted_payback_period(invested, &net_flows, rate),
            )
        }
        None => (None, None),
    };

    let irr = if invested > Decimal::ZERO {
        match time_value::irr(&investor_flows, IRR_GUESS) {
            Ok(r) => Some(r),
            Err(e) => {
                warnings.push(format!("IRR not computed: {e}"));
                None
            }
        }
    } else {
        None
    };

    let (total_roi, annualized_roi) = roi(invested, cumulative, horizon);

    debug!(
        years = horizon,
        invested = %invested,
        cumulative = %cumulative,
        payback = ?payback,
        irr = ?irr,
        "returns projected"
    );

    ReturnsProjection {
        equity_schedule: schedule,
        years,
        total_cash_invested: invested,
        annual_pre_tax_cash_flow: annual_pre_tax,
        cash_on_cash_return: cash_on_cash,
        payback_period_years: payback,
        discounted_payback_years: discounted_payback,
        npv,
        irr,
        total_roi,
        annualized_roi,
        exit: exit_outcome,
        warnings,
    }
}

/// Net proceeds for the exit year.
fn settle_exit(
    exit: &ExitAssumption,
    sde: Money,
    revenue: Money,
    modeled_balance: Money,
) -> ExitOutcome {
    match exit.valuation {
        ExitValuation::Manual { proceeds } => ExitOutcome {
            year: exit.year,
            gross_value: None,
            transaction_costs: Decimal::ZERO,
            debt_payoff: Decimal::ZERO,
            net_proceeds: proceeds,
        },
        ExitValuation::MultipleBased {
            multiple,
            ref metric,
            debt_payoff,
            transaction_cost_pct,
        } => {
            let base = match metric {
                ExitMetric::ProjectedSde => sde,
                ExitMetric::ProjectedRevenue => revenue,
                ExitMetric::Amount(amount) => *amount,
            };
            let gross = base.saturating_mul(multiple);
            let costs = gross * transaction_cost_pct;
            let payoff = debt_payoff.unwrap_or(modeled_balance);
            ExitOutcome {
                year: exit.year,
                gross_value: Some(gross),
                transaction_costs: costs,
                debt_payoff: payoff,
                net_proceeds: gross - payoff - costs,
            }
        }
    }
}

/// Total ROI `Σcf / invested` and its annualized form
/// `((invested + Σcf) / invested)^(1/T) − 1`.
fn roi(invested: Money, total_cash_flow: Money, horizon: u32) -> (Option<Rate>, Option<Rate>) {
    if invested <= Decimal::ZERO || horizon == 0 {
        return (None, None);
    }
    let total = total_cash_flow / invested;
    let ending = (invested + total_cash_flow) / invested;
    let annualized = if ending.is_zero() {
        Some(-Decimal::ONE)
    } else if ending < Decimal::ZERO {
        None
    } else {
        ending
            .checked_powd(Decimal::ONE / Decimal::from(horizon))
            .map(|g| g - Decimal::ONE)
    };
    (Some(total), annualized)
}
