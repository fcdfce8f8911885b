use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::*;

use super::valuation::Industry;

/// Default projection horizon in years.
pub const DEFAULT_PROJECTION_YEARS: u32 = 10;
/// Longest horizon the model will project.
pub const MAX_PROJECTION_YEARS: u32 = 50;
/// Ceiling for annual growth and appreciation rates.
pub const MAX_GROWTH_RATE: Rate = dec!(1);

// ---------------------------------------------------------------------------
// Input schema
// ---------------------------------------------------------------------------

/// A priced asset class that may or may not already be inside the asking price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceComponent {
    pub value: Money,
    /// When false the value is added on top of the asking price.
    pub included_in_asking: bool,
}

/// Which earnings figure `annual_sde` holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningsBasis {
    #[default]
    Sde,
    Ebitda,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealTerms {
    pub asking_price: Money,
    pub ffe: PriceComponent,
    pub inventory: PriceComponent,
    pub real_estate: PriceComponent,
    pub acquiring_real_estate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price_override: Option<Money>,
    /// Rent the business paid the owner for real estate, added back to cash flow.
    pub annual_rents_paid_to_owner_re: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<Industry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingAssumptions {
    pub annual_revenue: Money,
    /// SDE, or EBITDA when `earnings_basis` says so.
    pub annual_sde: Money,
    pub earnings_basis: EarningsBasis,
    pub buyer_minimum_salary: Money,
    pub working_capital_requirement: Money,
    pub annual_capex_maintenance: Money,
    pub annual_capex_growth: Money,
}

/// Rate and term for an amortizing seller note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerNoteTerms {
    pub rate: Rate,
    pub term_years: Years,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancingSources {
    pub buyer_equity: Money,
    pub seller_financing_amount: Money,
    /// Without terms the seller note is on standby: carried, never serviced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_note: Option<SellerNoteTerms>,
    pub term_loan_amount: Money,
    pub revolving_loc_amount: Money,
    pub closing_costs: Money,
}

impl FinancingSources {
    pub fn total_debt(&self) -> Money {
        self.seller_financing_amount + self.term_loan_amount + self.revolving_loc_amount
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanTerms {
    pub term_loan_rate: Rate,
    pub term_loan_years: Years,
    pub loc_rate: Rate,
    /// Fraction of the revolving line assumed drawn on average (0–1).
    pub loc_utilization: Rate,
}

/// Figure an exit multiple is applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExitMetric {
    /// Projected SDE in the exit year
    ProjectedSde,
    /// Projected revenue in the exit year
    ProjectedRevenue,
    /// A caller-supplied figure
    Amount(Money),
}

/// How net exit proceeds are determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ExitValuation {
    Manual {
        proceeds: Money,
    },
    MultipleBased {
        multiple: Multiple,
        metric: ExitMetric,
        /// Debt repaid from proceeds; defaults to the modeled balance at exit.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        debt_payoff: Option<Money>,
        #[serde(default)]
        transaction_cost_pct: Rate,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAssumption {
    pub year: u32,
    pub valuation: ExitValuation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionAssumptions {
    /// Annual revenue and SDE growth
    pub growth_rate: Rate,
    pub projection_years: u32,
    /// Annual growth applied to capital expenditure
    pub expense_growth_rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_appreciation_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitAssumption>,
}

impl Default for ProjectionAssumptions {
    fn default() -> Self {
        Self {
            growth_rate: Decimal::ZERO,
            projection_years: DEFAULT_PROJECTION_YEARS,
            expense_growth_rate: Decimal::ZERO,
            asset_appreciation_rate: None,
            discount_rate: None,
            exit: None,
        }
    }
}

/// Everything the deal model consumes for one calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionInputs {
    pub deal: DealTerms,
    pub operating: OperatingAssumptions,
    pub financing: FinancingSources,
    pub loan_terms: LoanTerms,
    pub projection: ProjectionAssumptions,
}

// ---------------------------------------------------------------------------
// Boundary validation
// ---------------------------------------------------------------------------

/// Inputs that have been through [`AcquisitionInputs::validate`].
///
/// Every layer takes this type, so sign and range checks happen exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInputs {
    inputs: AcquisitionInputs,
    adjustments: Vec<String>,
}

impl ValidatedInputs {
    /// Human-readable notes for every value that was clamped.
    pub fn adjustments(&self) -> &[String] {
        &self.adjustments
    }

    pub fn into_inner(self) -> AcquisitionInputs {
        self.inputs
    }
}

impl std::ops::Deref for ValidatedInputs {
    type Target = AcquisitionInputs;

    fn deref(&self) -> &Self::Target {
        &self.inputs
    }
}

impl AcquisitionInputs {
    /// Clamp malformed values to safe defaults. Never fails.
    pub fn validate(&self) -> ValidatedInputs {
        let mut clean = self.clone();
        let mut notes: Vec<String> = Vec::new();

        {
            let d = &mut clean.deal;
            non_negative(&mut d.asking_price, "asking_price", &mut notes);
            non_negative(&mut d.ffe.value, "ffe.value", &mut notes);
            non_negative(&mut d.inventory.value, "inventory.value", &mut notes);
            non_negative(&mut d.real_estate.value, "real_estate.value", &mut notes);
            non_negative(
                &mut d.annual_rents_paid_to_owner_re,
                "annual_rents_paid_to_owner_re",
                &mut notes,
            );
            if let Some(ref mut ovr) = d.purchase_price_override {
                non_negative(ovr, "purchase_price_override", &mut notes);
            }
        }

        {
            let o = &mut clean.operating;
            non_negative(&mut o.annual_revenue, "annual_revenue", &mut notes);
            non_negative(&mut o.annual_sde, "annual_sde", &mut notes);
            non_negative(&mut o.buyer_minimum_salary, "buyer_minimum_salary", &mut notes);
            non_negative(
                &mut o.working_capital_requirement,
                "working_capital_requirement",
                &mut notes,
            );
            non_negative(
                &mut o.annual_capex_maintenance,
                "annual_capex_maintenance",
                &mut notes,
            );
            non_negative(&mut o.annual_capex_growth, "annual_capex_growth", &mut notes);
        }

        {
            let f = &mut clean.financing;
            non_negative(&mut f.buyer_equity, "buyer_equity", &mut notes);
            non_negative(
                &mut f.seller_financing_amount,
                "seller_financing_amount",
                &mut notes,
            );
            non_negative(&mut f.term_loan_amount, "term_loan_amount", &mut notes);
            non_negative(&mut f.revolving_loc_amount, "revolving_loc_amount", &mut notes);
            non_negative(&mut f.closing_costs, "closing_costs", &mut notes);
            if let Some(ref mut note) = f.seller_note {
                interest_rate(&mut note.rate, "seller_note.rate", &mut notes);
                non_negative(&mut note.term_years, "seller_note.term_years", &mut notes);
            }
        }

        {
            let l = &mut clean.loan_terms;
            interest_rate(&mut l.term_loan_rate, "term_loan_rate", &mut notes);
            non_negative(&mut l.term_loan_years, "term_loan_years", &mut notes);
            interest_rate(&mut l.loc_rate, "loc_rate", &mut notes);
            unit_interval(&mut l.loc_utilization, "loc_utilization", &mut notes);
        }

        {
            let p = &mut clean.projection;
            growth(&mut p.growth_rate, "growth_rate", &mut notes);
            growth(&mut p.expense_growth_rate, "expense_growth_rate", &mut notes);
            if let Some(ref mut a) = p.asset_appreciation_rate {
                growth(a, "asset_appreciation_rate", &mut notes);
            }
            if let Some(r) = p.discount_rate {
                if r <= dec!(-1) {
                    notes.push(format!(
                        "discount_rate {r} is not above -100%; NPV and discounted payback skipped"
                    ));
                    p.discount_rate = None;
                }
            }
            if p.projection_years == 0 {
                notes.push(format!(
                    "projection_years was 0; using default of {DEFAULT_PROJECTION_YEARS}"
                ));
                p.projection_years = DEFAULT_PROJECTION_YEARS;
            } else if p.projection_years > MAX_PROJECTION_YEARS {
                notes.push(format!(
                    "projection_years {} capped at {MAX_PROJECTION_YEARS}",
                    p.projection_years
                ));
                p.projection_years = MAX_PROJECTION_YEARS;
            }

            let horizon = p.projection_years;
            if let Some(ref mut exit) = p.exit {
                let clamped = exit.year.clamp(1, horizon);
                if clamped != exit.year {
                    notes.push(format!(
                        "exit year {} outside projection horizon; moved to year {clamped}",
                        exit.year
                    ));
                    exit.year = clamped;
                }
                match exit.valuation {
                    ExitValuation::Manual { ref mut proceeds } => {
                        non_negative(proceeds, "exit.proceeds", &mut notes);
                    }
                    ExitValuation::MultipleBased {
                        ref mut multiple,
                        ref mut metric,
                        ref mut debt_payoff,
                        ref mut transaction_cost_pct,
                    } => {
                        non_negative(multiple, "exit.multiple", &mut notes);
                        if let ExitMetric::Amount(ref mut amount) = metric {
                            non_negative(amount, "exit.metric", &mut notes);
                        }
                        if let Some(ref mut payoff) = debt_payoff {
                            non_negative(payoff, "exit.debt_payoff", &mut notes);
                        }
                        unit_interval(
                            transaction_cost_pct,
                            "exit.transaction_cost_pct",
                            &mut notes,
                        );
                    }
                }
            }
        }

        for note in &notes {
            warn!(adjustment = %note, "input clamped");
        }

        ValidatedInputs {
            inputs: clean,
            adjustments: notes,
        }
    }
}

fn non_negative(value: &mut Decimal, field: &str, notes: &mut Vec<String>) {
    if value.is_sign_negative() && !value.is_zero() {
        notes.push(format!("{field} was negative ({value}); clamped to 0"));
        *value = Decimal::ZERO;
    }
}

fn interest_rate(value: &mut Rate, field: &str, notes: &mut Vec<String>) {
    non_negative(value, field, notes);
    if *value > Decimal::ONE {
        notes.push(format!(
            "{field} {value} exceeds 100%; rates are decimals (0.075 = 7.5%)"
        ));
    }
}

fn unit_interval(value: &mut Rate, field: &str, notes: &mut Vec<String>) {
    if *value < Decimal::ZERO || *value > Decimal::ONE {
        let clamped = (*value).clamp(Decimal::ZERO, Decimal::ONE);
        notes.push(format!("{field} {value} outside [0, 1]; clamped to {clamped}"));
        *value = clamped;
    }
}

fn growth(value: &mut Rate, field: &str, notes: &mut Vec<String>) {
    if *value < dec!(-1) {
        notes.push(format!("{field} {value} below -100%; clamped to -1"));
        *value = dec!(-1);
    } else if *value > MAX_GROWTH_RATE {
        notes.push(format!(
            "{field} {value} above {MAX_GROWTH_RATE}; clamped (rates are decimals)"
        ));
        *value = MAX_GROWTH_RATE;
    }
}
