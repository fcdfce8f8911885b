use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DealModelError;
use crate::types::*;
use crate::DealModelResult;

use super::analysis::SingleYearModel;
use super::inputs::{ExitValuation, ValidatedInputs};
use super::projection::project_returns;

const PROBABILITY_TOLERANCE: Decimal = dec!(0.001);

/// Scaling applied to the base projection assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    /// Multiplies `growth_rate`
    pub growth_multiplier: Decimal,
    /// Multiplies `expense_growth_rate`
    pub expense_growth_multiplier: Decimal,
    /// Multiplies the exit multiple when the exit is multiple-based
    pub exit_multiple_multiplier: Decimal,
    pub probability: Rate,
}

impl ScenarioDefinition {
    fn new(name: &str, growth: Decimal, expense: Decimal, exit: Decimal, probability: Rate) -> Self {
        Self {
            name: name.into(),
            growth_multiplier: growth,
            expense_growth_multiplier: expense,
            exit_multiple_multiplier: exit,
            probability,
        }
    }
}

/// Conservative, base and optimistic cases.
pub fn default_scenarios() -> Vec<ScenarioDefinition> {
    vec![
        ScenarioDefinition::new("Conservative", dec!(0.5), dec!(1.2), dec!(0.8), dec!(0.25)),
        ScenarioDefinition::new("Base", dec!(1), dec!(1), dec!(1), dec!(0.5)),
        ScenarioDefinition::new("Optimistic", dec!(1.5), dec!(0.8), dec!(1.2), dec!(0.25)),
    ]
}

/// Model-wide settings that are not part of a single deal's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub scenarios: Vec<ScenarioDefinition>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            scenarios: default_scenarios(),
        }
    }
}

impl ModelSettings {
    pub fn validate(&self) -> DealModelResult<()> {
        validate_scenarios(&self.scenarios)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub probability: Rate,
    pub growth_rate: Rate,
    pub expense_growth_rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_multiple: Option<Multiple>,
    pub annual_pre_tax_cash_flow: Money,
    pub cumulative_cash_flow: Money,
    pub final_owner_equity: Money,
    pub cash_on_cash_return: Option<Rate>,
    pub payback_period_years: Option<Years>,
    pub npv: Option<Money>,
    pub irr: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub outcomes: Vec<ScenarioOutcome>,
    pub probability_weighted_cash_flow: Money,
    /// Present only when every scenario produced an NPV
    pub probability_weighted_npv: Option<Money>,
    /// Clamps applied to scaled assumptions, prefixed with the scenario name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn validate_scenarios(scenarios: &[ScenarioDefinition]) -> DealModelResult<()> {
    if scenarios.is_empty() {
        return Err(DealModelError::InsufficientData(
            "At least one scenario required".into(),
        ));
    }
    for s in scenarios {
        if s.probability < Decimal::ZERO || s.probability > Decimal::ONE {
            return Err(DealModelError::InvalidInput {
                field: format!("scenario:{} probability", s.name),
                reason: "Probability must be between 0 and 1".into(),
            });
        }
    }
    let total: Decimal = scenarios.iter().map(|s| s.probability).sum();
    if (total - Decimal::ONE).abs() > PROBABILITY_TOLERANCE {
        return Err(DealModelError::InvalidInput {
            field: "probabilities".into(),
            reason: format!("Probabilities must sum to 1.0 (got {total})"),
        });
    }
    Ok(())
}

/// Run the projection once per scenario with scaled assumptions.
///
/// Growth, expense growth and exit multiple only affect layer 4, so the
/// single-year model is shared across scenarios.
pub fn run_scenarios(
    inputs: &ValidatedInputs,
    single_year: &SingleYearModel,
    scenarios: &[ScenarioDefinition],
) -> DealModelResult<ScenarioSet> {
    validate_scenarios(scenarios)?;

    let mut outcomes = Vec::with_capacity(scenarios.len());
    let mut weighted_cf = Decimal::ZERO;
    let mut weighted_npv = Some(Decimal::ZERO);
    let mut warnings = Vec::new();

    for s in scenarios {
        let mut scaled = (**inputs).clone();
        scaled.projection.growth_rate *= s.growth_multiplier;
        scaled.projection.expense_growth_rate *= s.expense_growth_multiplier;
        let mut exit_multiple = None;
        if let Some(ref mut exit) = scaled.projection.exit {
            if let ExitValuation::MultipleBased {
                ref mut multiple, ..
            } = exit.valuation
            {
                *multiple *= s.exit_multiple_multiplier;
                exit_multiple = Some(*multiple);
            }
        }
        let scaled = scaled.validate();
        // Notes already raised on the base inputs are not repeated.
        warnings.extend(
            scaled
                .adjustments()
                .iter()
                .filter(|note| !inputs.adjustments().contains(*note))
                .map(|note| format!("{} scenario: {note}", s.name)),
        );
        let returns = project_returns(&scaled, single_year);

        let cumulative = returns.cumulative_cash_flow();
        weighted_cf += s.probability * cumulative;
        weighted_npv = match (weighted_npv, returns.npv) {
            (Some(acc), Some(v)) => Some(acc + s.probability * v),
            _ => None,
        };

        debug!(scenario = %s.name, cumulative = %cumulative, "scenario projected");

        outcomes.push(ScenarioOutcome {
            name: s.name.clone(),
            probability: s.probability,
            growth_rate: scaled.projection.growth_rate,
            expense_growth_rate: scaled.projection.expense_growth_rate,
            exit_multiple,
            annual_pre_tax_cash_flow: returns.annual_pre_tax_cash_flow,
            cumulative_cash_flow: cumulative,
            final_owner_equity: returns
                .equity_schedule
                .last()
                .map(|e| e.owner_equity)
                .unwrap_or(Decimal::ZERO),
            cash_on_cash_return: returns.cash_on_cash_return,
            payback_period_years: returns.payback_period_years,
            npv: returns.npv,
            irr: returns.irr,
        });
    }

    Ok(ScenarioSet {
        outcomes,
        probability_weighted_cash_flow: weighted_cf,
        probability_weighted_npv: weighted_npv,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::analysis::single_year;
    use crate::acquisition::inputs::AcquisitionInputs;
    use rust_decimal_macros::dec;

    fn deal() -> AcquisitionInputs {
        let mut input = AcquisitionInputs::default();
        input.deal.asking_price = dec!(800000);
        input.operating.annual_sde = dec!(250000);
        input.operating.buyer_minimum_salary = dec!(70000);
        input.financing.buyer_equity = dec!(160000);
        input.financing.term_loan_amount = dec!(640000);
        input.loan_terms.term_loan_rate = dec!(0.08);
        input.loan_terms.term_loan_years = dec!(10);
        input.projection.growth_rate = dec!(0.04);
        input.projection.discount_rate = Some(dec!(0.12));
        input
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(ModelSettings::default().validate().is_ok());
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        let mut s = default_scenarios();
        s[0].probability = dec!(0.5);
        assert!(validate_scenarios(&s).is_err());
        assert!(validate_scenarios(&[]).is_err());
    }

    #[test]
    fn test_scenarios_are_ordered_by_growth() {
        let v = deal().validate();
        let sy = single_year(&v);
        let set = run_scenarios(&v, &sy, &default_scenarios()).unwrap();
        assert_eq!(set.outcomes.len(), 3);
        let cons = &set.outcomes[0];
        let base = &set.outcomes[1];
        let opt = &set.outcomes[2];
        assert_eq!(base.growth_rate, dec!(0.04));
        assert_eq!(cons.growth_rate, dec!(0.02));
        assert_eq!(opt.growth_rate, dec!(0.06));
        assert!(cons.cumulative_cash_flow < base.cumulative_cash_flow);
        assert!(base.cumulative_cash_flow < opt.cumulative_cash_flow);
        // Year one does not depend on growth.
        assert_eq!(cons.annual_pre_tax_cash_flow, opt.annual_pre_tax_cash_flow);
    }

    #[test]
    fn test_probability_weighting() {
        let v = deal().validate();
        let sy = single_year(&v);
        let set = run_scenarios(&v, &sy, &default_scenarios()).unwrap();
        let expected: Decimal = set
            .outcomes
            .iter()
            .map(|o| o.probability * o.cumulative_cash_flow)
            .sum();
        assert_eq!(set.probability_weighted_cash_flow, expected);
        assert!(set.probability_weighted_npv.is_some());
    }

    #[test]
    fn test_scaled_growth_cap_is_reported() {
        let mut input = deal();
        input.projection.growth_rate = dec!(0.8);
        let v = input.validate();
        assert!(v.adjustments().is_empty());
        let sy = single_year(&v);
        let set = run_scenarios(&v, &sy, &default_scenarios()).unwrap();
        assert_eq!(set.outcomes[2].growth_rate, dec!(1));
        assert_eq!(set.warnings.len(), 1);
        assert!(set.warnings[0].starts_with("Optimistic scenario: "));
        assert!(set.warnings[0].contains("growth_rate 1.2"));
    }

    #[test]
    fn test_base_flags_not_repeated_per_scenario() {
        let mut input = deal();
        input.loan_terms.term_loan_rate = dec!(8);
        let v = input.validate();
        assert_eq!(v.adjustments().len(), 1);
        let sy = single_year(&v);
        let set = run_scenarios(&v, &sy, &default_scenarios()).unwrap();
        assert!(set.warnings.is_empty());
    }

    #[test]
    fn test_weighted_npv_absent_without_discount_rate() {
        let mut input = deal();
        input.projection.discount_rate = None;
        let v = input.validate();
        let sy = single_year(&v);
        let set = run_scenarios(&v, &sy, &default_scenarios()).unwrap();
        assert!(set.probability_weighted_npv.is_none());
    }
}
