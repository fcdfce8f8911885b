use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rating::{DscrLadder, DscrRating};
use crate::types::*;

use super::inputs::ValidatedInputs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowCoverage {
    pub total_capex: Money,
    pub lendable_cash_flow: Money,
    /// Lendable cash flow after debt service
    pub net_cash_flow: Money,
    /// `None` when there is no debt service
    pub dscr: Option<Multiple>,
    pub dscr_rating: Option<DscrRating>,
}

/// SDE less the buyer's draw and capex, plus rent previously paid to the
/// owner's real estate.
pub fn lendable_cash_flow(
    sde: Money,
    buyer_salary: Money,
    total_capex: Money,
    rents_to_owner: Money,
) -> Money {
    sde - buyer_salary - total_capex + rents_to_owner
}

/// `lendable / debt service`, undefined when nothing is owed.
pub fn debt_service_coverage(lendable: Money, annual_debt_service: Money) -> Option<Multiple> {
    if annual_debt_service > Decimal::ZERO {
        lendable.checked_div(annual_debt_service)
    } else {
        None
    }
}

/// Lendable and net cash flow with DSCR against the canonical ladder.
pub fn compute_cash_flow(inputs: &ValidatedInputs, annual_debt_service: Money) -> CashFlowCoverage {
    let ops = &inputs.operating;
    let total_capex = ops.annual_capex_maintenance + ops.annual_capex_growth;
    let lendable = lendable_cash_flow(
        ops.annual_sde,
        ops.buyer_minimum_salary,
        total_capex,
        inputs.deal.annual_rents_paid_to_owner_re,
    );
    let dscr = debt_service_coverage(lendable, annual_debt_service);
    let dscr_rating = DscrLadder::CANONICAL.rate_optional(dscr);

    debug!(
        lendable = %lendable,
        dscr = ?dscr,
        rating = ?dscr_rating,
        "coverage computed"
    );

    CashFlowCoverage {
        total_capex,
        lendable_cash_flow: lendable,
        net_cash_flow: lendable - annual_debt_service,
        dscr,
        dscr_rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::inputs::AcquisitionInputs;
    use rust_decimal_macros::dec;

    fn inputs() -> AcquisitionInputs {
        let mut input = AcquisitionInputs::default();
        input.operating.annual_sde = dec!(300000);
        input.operating.buyer_minimum_salary = dec!(80000);
        input.operating.annual_capex_maintenance = dec!(15000);
        input.operating.annual_capex_growth = dec!(5000);
        input.deal.annual_rents_paid_to_owner_re = dec!(24000);
        input
    }

    #[test]
    fn test_lendable_cash_flow_waterfall() {
        let c = compute_cash_flow(&inputs().validate(), dec!(100000));
        assert_eq!(c.total_capex, dec!(20000));
        assert_eq!(c.lendable_cash_flow, dec!(224000));
        assert_eq!(c.net_cash_flow, dec!(124000));
        assert_eq!(c.dscr, Some(dec!(2.24)));
        assert_eq!(c.dscr_rating, Some(DscrRating::Excellent));
    }

    #[test]
    fn test_zero_debt_service_has_undefined_dscr() {
        let c = compute_cash_flow(&inputs().validate(), Decimal::ZERO);
        assert_eq!(c.dscr, None);
        assert_eq!(c.dscr_rating, None);
        assert_eq!(c.net_cash_flow, c.lendable_cash_flow);
    }

    #[test]
    fn test_negative_lendable_is_insufficient() {
        let mut input = inputs();
        input.operating.buyer_minimum_salary = dec!(400000);
        let c = compute_cash_flow(&input.validate(), dec!(50000));
        assert!(c.lendable_cash_flow < Decimal::ZERO);
        assert_eq!(c.dscr_rating, Some(DscrRating::Insufficient));
    }
}
