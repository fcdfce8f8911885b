use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::types::*;
use crate::DealModelResult;

use super::coverage::{compute_cash_flow, CashFlowCoverage};
use super::debt::{size_debt, DebtSizing};
use super::inputs::{AcquisitionInputs, EarningsBasis, ValidatedInputs};
use super::projection::{project_returns, ReturnsProjection};
use super::scenarios::{run_scenarios, ModelSettings, ScenarioSet};
use super::structuring::{compute_purchase_price, DealStructure};
use super::valuation::{
    break_even, capital_ratios, cross_check, BreakEven, CapitalRatios, ValuationCrossCheck,
};

/// Layers 1–3: the figures a lender looks at for one year of operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleYearModel {
    pub structure: DealStructure,
    pub debt: DebtSizing,
    pub coverage: CashFlowCoverage,
}

/// Everything derived from one set of acquisition inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedMetrics {
    pub earnings_basis: EarningsBasis,
    pub structure: DealStructure,
    pub debt: DebtSizing,
    pub coverage: CashFlowCoverage,
    pub returns: ReturnsProjection,
    pub scenarios: ScenarioSet,
    pub valuation: ValuationCrossCheck,
    pub break_even: BreakEven,
    pub capital: CapitalRatios,
    pub warnings: Vec<String>,
}

impl CalculatedMetrics {
    pub fn purchase_price(&self) -> Money {
        self.structure.purchase_price
    }

    pub fn dscr(&self) -> Option<Multiple> {
        self.coverage.dscr
    }

    pub fn annual_debt_service(&self) -> Money {
        self.debt.annual_debt_service
    }
}

/// Run deal structuring, debt sizing and coverage.
pub fn single_year(inputs: &ValidatedInputs) -> SingleYearModel {
    let structure = compute_purchase_price(inputs);
    let debt = size_debt(inputs);
    let coverage = compute_cash_flow(inputs, debt.annual_debt_service);
    SingleYearModel {
        structure,
        debt,
        coverage,
    }
}

/// Full model with the default scenario set. Never fails: bad inputs are
/// clamped and reported in `warnings`.
pub fn analyze(inputs: &AcquisitionInputs) -> CalculatedMetrics {
    let settings = ModelSettings::default();
    let validated = inputs.validate();
    let sy = single_year(&validated);
    match run_scenarios(&validated, &sy, &settings.scenarios) {
        Ok(scenarios) => assemble(validated, sy, scenarios),
        // The built-in scenario set always validates.
        Err(e) => {
            warn!(error = %e, "default scenario set rejected");
            let empty = ScenarioSet {
                outcomes: Vec::new(),
                probability_weighted_cash_flow: Decimal::ZERO,
                probability_weighted_npv: None,
                warnings: Vec::new(),
            };
            assemble(validated, sy, empty)
        }
    }
}

/// Full model with caller-supplied settings. Fails only when the settings
/// themselves are invalid.
pub fn analyze_with_settings(
    inputs: &AcquisitionInputs,
    settings: &ModelSettings,
) -> DealModelResult<CalculatedMetrics> {
    settings.validate()?;
    let validated = inputs.validate();
    let sy = single_year(&validated);
    let scenarios = run_scenarios(&validated, &sy, &settings.scenarios)?;
    Ok(assemble(validated, sy, scenarios))
}

fn assemble(
    validated: ValidatedInputs,
    sy: SingleYearModel,
    scenarios: ScenarioSet,
) -> CalculatedMetrics {
    let returns = project_returns(&validated, &sy);
    let valuation = cross_check(&validated, sy.structure.purchase_price);
    let break_even = break_even(&validated, &sy);
    let capital = capital_ratios(&validated, sy.structure.purchase_price);

    let mut warnings: Vec<String> = validated.adjustments().to_vec();
    if let Some(w) = sy.structure.balance_warning() {
        warnings.push(w);
    }
    warnings.extend(returns.warnings.iter().cloned());
    warnings.extend(scenarios.warnings.iter().cloned());

    debug!(
        purchase_price = %sy.structure.purchase_price,
        dscr = ?sy.coverage.dscr,
        warnings = warnings.len(),
        "acquisition analyzed"
    );

    CalculatedMetrics {
        earnings_basis: validated.operating.earnings_basis,
        structure: sy.structure,
        debt: sy.debt,
        coverage: sy.coverage,
        returns,
        scenarios,
        valuation,
        break_even,
        capital,
        warnings,
    }
}

const METHODOLOGY: &str = "Acquisition Deal Model: structuring, debt sizing, coverage, projection";

/// [`analyze`] wrapped in the standard computation envelope.
pub fn analyze_acquisition(inputs: &AcquisitionInputs) -> ComputationOutput<CalculatedMetrics> {
    let start = Instant::now();
    let metrics = analyze(inputs);
    let warnings = metrics.warnings.clone();

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(METHODOLOGY, inputs, warnings, elapsed, metrics)
}

/// [`analyze_with_settings`] wrapped in the standard computation envelope.
pub fn analyze_acquisition_with_settings(
    inputs: &AcquisitionInputs,
    settings: &ModelSettings,
) -> DealModelResult<ComputationOutput<CalculatedMetrics>> {
    let start = Instant::now();
    let metrics = analyze_with_settings(inputs, settings)?;
    let warnings = metrics.warnings.clone();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(METHODOLOGY, inputs, warnings, elapsed, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn deal() -> AcquisitionInputs {
        let mut input = AcquisitionInputs::default();
        input.deal.asking_price = dec!(600000);
        input.operating.annual_revenue = dec!(1500000);
        input.operating.annual_sde = dec!(200000);
        input.operating.buyer_minimum_salary = dec!(60000);
        input.financing.buyer_equity = dec!(60000);
        input.financing.seller_financing_amount = dec!(60000);
        input.financing.term_loan_amount = dec!(480000);
        input.loan_terms.term_loan_rate = dec!(0.0725);
        input.loan_terms.term_loan_years = dec!(10);
        input
    }

    #[test]
    fn test_analyze_collects_adjustments() {
        let mut input = deal();
        input.operating.annual_capex_maintenance = dec!(-100);
        let m = analyze(&input);
        assert!(m.warnings.iter().any(|w| w.contains("annual_capex_maintenance")));
    }

    #[test]
    fn test_unbalanced_deal_still_analyzed() {
        let mut input = deal();
        input.financing.buyer_equity = Decimal::ZERO;
        let m = analyze(&input);
        assert!(!m.structure.balance.balanced);
        assert!(m.warnings.iter().any(|w| w.starts_with("Sources")));
        assert!(m.dscr().is_some());
    }

    #[test]
    fn test_scenario_clamps_reach_model_warnings() {
        let mut input = deal();
        input.projection.growth_rate = dec!(0.8);
        let m = analyze(&input);
        assert!(m
            .warnings
            .iter()
            .any(|w| w.starts_with("Optimistic scenario:") && w.contains("growth_rate")));
    }

    #[test]
    fn test_custom_settings_rejected_when_invalid() {
        let mut settings = ModelSettings::default();
        settings.scenarios[1].probability = dec!(0.9);
        assert!(analyze_with_settings(&deal(), &settings).is_err());
    }

    #[test]
    fn test_envelope_carries_warnings_and_assumptions() {
        let mut input = deal();
        input.financing.buyer_equity = Decimal::ZERO;
        let out = analyze_acquisition(&input);
        assert_eq!(out.warnings, out.result.warnings);
        assert!(out.assumptions.get("deal").is_some());
    }
}
