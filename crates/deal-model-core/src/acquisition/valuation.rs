use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::*;

use super::analysis::SingleYearModel;
use super::inputs::{EarningsBasis, ValidatedInputs};

/// Price gap beyond which an estimate is no longer "fair".
const FAIR_VALUE_BAND: Rate = dec!(0.10);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Restaurant,
    Retail,
    Manufacturing,
    Services,
    Healthcare,
    Technology,
    #[serde(alias = "realestate")]
    RealEstate,
    #[default]
    Other,
}

/// Rule-of-thumb market multiples for an industry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndustryMultiples {
    pub sde: Multiple,
    pub ebitda: Multiple,
    pub revenue: Multiple,
}

impl Industry {
    pub fn multiples(&self) -> IndustryMultiples {
        let (sde, ebitda, revenue) = match self {
            Self::Restaurant => (dec!(2.5), dec!(4.0), dec!(0.5)),
            Self::Retail => (dec!(2.0), dec!(3.5), dec!(0.4)),
            Self::Manufacturing => (dec!(3.5), dec!(5.5), dec!(0.7)),
            Self::Services => (dec!(3.0), dec!(5.0), dec!(0.8)),
            Self::Healthcare => (dec!(4.0), dec!(6.0), dec!(0.6)),
            Self::Technology => (dec!(4.5), dec!(7.0), dec!(1.5)),
            Self::RealEstate => (dec!(3.0), dec!(5.0), dec!(0.5)),
            Self::Other => (dec!(2.5), dec!(4.0), dec!(0.5)),
        };
        IndustryMultiples {
            sde,
            ebitda,
            revenue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    SdeMultiple,
    EbitdaMultiple,
    RevenueMultiple,
    AssetBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationAssessment {
    Undervalued,
    Fair,
    Overvalued,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationEstimate {
    pub method: ValuationMethod,
    pub value: Money,
    /// Estimate minus purchase price
    pub vs_price: Money,
    pub vs_price_pct: Option<Rate>,
    /// `None` when the purchase price is zero
    pub assessment: Option<ValuationAssessment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationCrossCheck {
    pub industry: Industry,
    pub multiples: IndustryMultiples,
    pub estimates: Vec<ValuationEstimate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEven {
    /// Debt service + capex + buyer salary
    pub fixed_obligations: Money,
    pub revenue_break_even: Option<Money>,
    pub revenue_safety_margin: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalRatios {
    /// Total debt over buyer equity
    pub leverage_ratio: Option<Multiple>,
    /// Buyer equity over purchase price
    pub equity_capture_rate: Option<Rate>,
}

fn estimate(method: ValuationMethod, value: Money, price: Money) -> ValuationEstimate {
    let vs_price = value - price;
    let vs_price_pct = if price > Decimal::ZERO {
        Some(vs_price / price)
    } else {
        None
    };
    let assessment = vs_price_pct.map(|pct| {
        if pct > FAIR_VALUE_BAND {
            ValuationAssessment::Undervalued
        } else if pct < -FAIR_VALUE_BAND {
            ValuationAssessment::Overvalued
        } else {
            ValuationAssessment::Fair
        }
    });
    ValuationEstimate {
        method,
        value,
        vs_price,
        vs_price_pct,
        assessment,
    }
}

/// Compare the purchase price with industry-multiple and asset-based values.
pub fn cross_check(inputs: &ValidatedInputs, purchase_price: Money) -> ValuationCrossCheck {
    let industry = inputs.deal.industry.unwrap_or_default();
    let multiples = industry.multiples();
    let ops = &inputs.operating;

    let earnings = match ops.earnings_basis {
        EarningsBasis::Sde => estimate(
            ValuationMethod::SdeMultiple,
            ops.annual_sde * multiples.sde,
            purchase_price,
        ),
        EarningsBasis::Ebitda => estimate(
            ValuationMethod::EbitdaMultiple,
            ops.annual_sde * multiples.ebitda,
            purchase_price,
        ),
    };
    let assets = inputs.deal.ffe.value + inputs.deal.inventory.value;

    ValuationCrossCheck {
        industry,
        multiples,
        estimates: vec![
            earnings,
            estimate(
                ValuationMethod::RevenueMultiple,
                ops.annual_revenue * multiples.revenue,
                purchase_price,
            ),
            estimate(ValuationMethod::AssetBased, assets, purchase_price),
        ],
    }
}

/// Revenue needed to cover debt service, capex and the buyer's salary at the
/// current earnings margin.
pub fn break_even(inputs: &ValidatedInputs, single_year: &SingleYearModel) -> BreakEven {
    let ops = &inputs.operating;
    let fixed = single_year.debt.annual_debt_service
        + single_year.coverage.total_capex
        + ops.buyer_minimum_salary;

    let margin = if ops.annual_revenue > Decimal::ZERO {
        ops.annual_sde / ops.annual_revenue
    } else {
        Decimal::ZERO
    };
    let revenue_break_even = if margin > Decimal::ZERO {
        fixed.checked_div(margin)
    } else {
        None
    };
    let revenue_safety_margin = match revenue_break_even {
        Some(be) if ops.annual_revenue > Decimal::ZERO => {
            Some((ops.annual_revenue - be) / ops.annual_revenue)
        }
        _ => None,
    };

    BreakEven {
        fixed_obligations: fixed,
        revenue_break_even,
        revenue_safety_margin,
    }
}

pub fn capital_ratios(inputs: &ValidatedInputs, purchase_price: Money) -> CapitalRatios {
    let fin = &inputs.financing;
    let leverage_ratio = if fin.buyer_equity > Decimal::ZERO {
        Some(fin.total_debt() / fin.buyer_equity)
    } else {
        None
    };
    let equity_capture_rate = if purchase_price > Decimal::ZERO {
        Some(fin.buyer_equity / purchase_price)
    } else {
        None
    };
    CapitalRatios {
        leverage_ratio,
        equity_capture_rate,
    }
}
