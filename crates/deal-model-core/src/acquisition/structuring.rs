use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::*;

use super::inputs::ValidatedInputs;

/// Relative tolerance for sources/uses reconciliation.
pub const BALANCE_TOLERANCE: Decimal = dec!(0.000001);

/// Reconciliation record for the sources/uses ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesUsesBalance {
    pub balanced: bool,
    /// Sources total minus uses total
    pub delta: Money,
}

impl SourcesUsesBalance {
    pub fn reconcile(sources_total: Money, uses_total: Money) -> Self {
        let delta = sources_total - uses_total;
        let scale = sources_total.abs().max(uses_total.abs());
        let balanced = delta.abs() <= BALANCE_TOLERANCE * scale;
        Self { balanced, delta }
    }
}

/// How the payment due to the seller is split and settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsesBreakdown {
    /// FFE, inventory and goodwill
    pub due_to_seller_business: Money,
    pub due_to_seller_real_estate: Money,
    pub cash_to_seller_at_closing: Money,
    pub seller_financing_deferred: Money,
    pub working_capital: Money,
    pub closing_costs: Money,
}

impl UsesBreakdown {
    pub fn due_to_seller(&self) -> Money {
        self.due_to_seller_business + self.due_to_seller_real_estate
    }
}

/// Output of the deal structuring layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealStructure {
    pub purchase_price: Money,
    pub sde_multiple: Option<Multiple>,
    pub revenue_multiple: Option<Multiple>,
    pub sources: Vec<(String, Money)>,
    pub uses: Vec<(String, Money)>,
    pub uses_breakdown: UsesBreakdown,
    pub sources_total: Money,
    pub uses_total: Money,
    pub balance: SourcesUsesBalance,
}

impl DealStructure {
    /// Warning text for an unreconciled ledger, if any.
    pub fn balance_warning(&self) -> Option<String> {
        if self.balance.balanced {
            None
        } else {
            Some(format!(
                "Sources ({}) do not equal uses ({}); difference {}",
                self.sources_total.round_dp(2),
                self.uses_total.round_dp(2),
                self.balance.delta.round_dp(2)
            ))
        }
    }
}

/// Purchase price from the price components alone.
pub fn purchase_price(inputs: &ValidatedInputs) -> Money {
    let deal = &inputs.deal;
    let mut price = deal.purchase_price_override.unwrap_or(deal.asking_price);

    if !deal.ffe.included_in_asking {
        price += deal.ffe.value;
    }
    if !deal.inventory.included_in_asking {
        price += deal.inventory.value;
    }
    if deal.acquiring_real_estate && !deal.real_estate.included_in_asking {
        price += deal.real_estate.value;
    }

    price.max(Decimal::ZERO)
}

/// Build the purchase price and the sources & uses ledger.
///
/// Sources and uses are totalled independently. An imbalance is reported on
/// [`DealStructure::balance`] and never corrected here.
pub fn compute_purchase_price(inputs: &ValidatedInputs) -> DealStructure {
    let price = purchase_price(inputs);
    let deal = &inputs.deal;
    let fin = &inputs.financing;
    let ops = &inputs.operating;

    let sde_multiple = ratio(price, ops.annual_sde);
    let revenue_multiple = ratio(price, ops.annual_revenue);

    // Real estate is carved out of the price only when it is being bought.
    let due_real_estate = if deal.acquiring_real_estate {
        deal.real_estate.value.min(price)
    } else {
        Decimal::ZERO
    };
    let due_business = price - due_real_estate;

    let seller_deferred = fin.seller_financing_amount;
    let cash_at_closing = (price - seller_deferred).max(Decimal::ZERO);

    let breakdown = UsesBreakdown {
        due_to_seller_business: due_business,
        due_to_seller_real_estate: due_real_estate,
        cash_to_seller_at_closing: cash_at_closing,
        seller_financing_deferred: seller_deferred,
        working_capital: ops.working_capital_requirement,
        closing_costs: fin.closing_costs,
    };

    // Sources
    let mut sources: Vec<(String, Money)> = Vec::new();
    sources.push(("Buyer Equity".into(), fin.buyer_equity));
    if fin.seller_financing_amount > Decimal::ZERO {
        sources.push(("Seller Financing".into(), fin.seller_financing_amount));
    }
    if fin.term_loan_amount > Decimal::ZERO {
        sources.push(("Term Loan".into(), fin.term_loan_amount));
    }
    if fin.revolving_loc_amount > Decimal::ZERO {
        sources.push(("Revolving LOC".into(), fin.revolving_loc_amount));
    }

    // Uses
    let mut uses: Vec<(String, Money)> = Vec::new();
    uses.push(("Due to Seller: Business Assets".into(), due_business));
    if due_real_estate > Decimal::ZERO {
        uses.push(("Due to Seller: Real Estate".into(), due_real_estate));
    }
    if breakdown.working_capital > Decimal::ZERO {
        uses.push(("Working Capital".into(), breakdown.working_capital));
    }
    if breakdown.closing_costs > Decimal::ZERO {
        uses.push(("Closing Costs".into(), breakdown.closing_costs));
    }

    let sources_total = fin.buyer_equity
        + fin.seller_financing_amount
        + fin.term_loan_amount
        + fin.revolving_loc_amount;
    let uses_total = breakdown.due_to_seller() + breakdown.working_capital + breakdown.closing_costs;
    let balance = SourcesUsesBalance::reconcile(sources_total, uses_total);

    debug!(
        purchase_price = %price,
        sources_total = %sources_total,
        uses_total = %uses_total,
        balanced = balance.balanced,
        "deal structured"
    );
    if !balance.balanced {
        warn!(delta = %balance.delta, "sources and uses do not reconcile");
    }

    DealStructure {
        purchase_price: price,
        sde_multiple,
        revenue_multiple,
        sources,
        uses,
        uses_breakdown: breakdown,
        sources_total,
        uses_total,
        balance,
    }
}

fn ratio(numerator: Money, denominator: Money) -> Option<Multiple> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator)
    }
}
