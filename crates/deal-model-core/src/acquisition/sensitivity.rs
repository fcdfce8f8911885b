use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DealModelError;
use crate::types::*;
use crate::DealModelResult;

use super::analysis::single_year;
use super::inputs::{AcquisitionInputs, ExitValuation};
use super::projection::project_returns;

/// Upper bound on sweep points per axis.
pub const MAX_SWEEP_POINTS: usize = 101;

/// Input a sensitivity axis can vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityDriver {
    GrowthRate,
    TermLoanRate,
    TermLoanYears,
    AnnualSde,
    AskingPrice,
    /// Requires a multiple-based exit
    ExitMultiple,
}

impl SensitivityDriver {
    fn current(&self, inputs: &AcquisitionInputs) -> Option<Decimal> {
        match self {
            Self::GrowthRate => Some(inputs.projection.growth_rate),
            Self::TermLoanRate => Some(inputs.loan_terms.term_loan_rate),
            Self::TermLoanYears => Some(inputs.loan_terms.term_loan_years),
            Self::AnnualSde => Some(inputs.operating.annual_sde),
            Self::AskingPrice => Some(inputs.deal.asking_price),
            Self::ExitMultiple => match inputs.projection.exit {
                Some(ref exit) => match exit.valuation {
                    ExitValuation::MultipleBased { multiple, .. } => Some(multiple),
                    ExitValuation::Manual { .. } => None,
                },
                None => None,
            },
        }
    }

    fn apply(&self, inputs: &mut AcquisitionInputs, value: Decimal) {
        match self {
            Self::GrowthRate => inputs.projection.growth_rate = value,
            Self::TermLoanRate => inputs.loan_terms.term_loan_rate = value,
            Self::TermLoanYears => inputs.loan_terms.term_loan_years = value,
            Self::AnnualSde => inputs.operating.annual_sde = value,
            Self::AskingPrice => inputs.deal.asking_price = value,
            Self::ExitMultiple => {
                if let Some(ref mut exit) = inputs.projection.exit {
                    if let ExitValuation::MultipleBased {
                        ref mut multiple, ..
                    } = exit.valuation
                    {
                        *multiple = value;
                    }
                }
            }
        }
    }
}

/// Output a sensitivity grid reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetric {
    Dscr,
    CashOnCash,
    NetCashFlow,
    Npv,
    Irr,
    PaybackYears,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityAxis {
    pub driver: SensitivityDriver,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub inputs: AcquisitionInputs,
    pub rows: SensitivityAxis,
    pub columns: SensitivityAxis,
    pub metric: SensitivityMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub row_driver: SensitivityDriver,
    pub column_driver: SensitivityDriver,
    pub metric: SensitivityMetric,
    pub row_values: Vec<Decimal>,
    pub column_values: Vec<Decimal>,
    /// `matrix[i][j]` is the metric at `row_values[i]`, `column_values[j]`;
    /// `None` where the metric is undefined
    pub matrix: Vec<Vec<Option<Decimal>>>,
    /// Metric for the unmodified inputs
    pub base_case_value: Option<Decimal>,
    /// Grid cell closest to the unmodified inputs
    pub base_case_position: (usize, usize),
}

fn generate_sweep_values(axis: &SensitivityAxis) -> DealModelResult<Vec<Decimal>> {
    let field = format!("axis:{:?}", axis.driver);
    if axis.step <= Decimal::ZERO {
        return Err(DealModelError::InvalidInput {
            field,
            reason: "Step must be positive".into(),
        });
    }
    if axis.min > axis.max {
        return Err(DealModelError::InvalidInput {
            field,
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = axis.min;
    while current <= axis.max && values.len() <= MAX_SWEEP_POINTS {
        values.push(current);
        current += axis.step;
    }
    if let Some(&last) = values.last() {
        if last < axis.max {
            values.push(axis.max);
        }
    }
    if values.len() > MAX_SWEEP_POINTS {
        return Err(DealModelError::InvalidInput {
            field,
            reason: format!("Sweep exceeds {MAX_SWEEP_POINTS} points"),
        });
    }
    Ok(values)
}

fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn evaluate(inputs: &AcquisitionInputs, metric: SensitivityMetric) -> Option<Decimal> {
    let validated = inputs.validate();
    let sy = single_year(&validated);
    match metric {
        SensitivityMetric::Dscr => sy.coverage.dscr,
        SensitivityMetric::NetCashFlow => Some(sy.coverage.net_cash_flow),
        _ => {
            let returns = project_returns(&validated, &sy);
            match metric {
                SensitivityMetric::CashOnCash => returns.cash_on_cash_return,
                SensitivityMetric::Npv => returns.npv,
                SensitivityMetric::Irr => returns.irr,
                SensitivityMetric::PaybackYears => returns.payback_period_years,
                SensitivityMetric::Dscr | SensitivityMetric::NetCashFlow => None,
            }
        }
    }
}

/// Two-way grid: rerun the model for every (row, column) driver pair.
pub fn run_sensitivity(
    input: &SensitivityInput,
) -> DealModelResult<ComputationOutput<SensitivityGrid>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.rows.driver == input.columns.driver {
        return Err(DealModelError::InvalidInput {
            field: "columns.driver".into(),
            reason: "Row and column drivers must differ".into(),
        });
    }
    for axis in [&input.rows, &input.columns] {
        if axis.driver.current(&input.inputs).is_none() {
            return Err(DealModelError::InvalidInput {
                field: format!("axis:{:?}", axis.driver),
                reason: "Exit multiple sensitivity needs a multiple-based exit".into(),
            });
        }
    }
    if input.metric == SensitivityMetric::Npv && input.inputs.projection.discount_rate.is_none() {
        warnings.push("No discount_rate supplied; NPV cells are undefined".into());
    }

    let row_values = generate_sweep_values(&input.rows)?;
    let column_values = generate_sweep_values(&input.columns)?;

    let mut matrix = Vec::with_capacity(row_values.len());
    for r in &row_values {
        let mut row = Vec::with_capacity(column_values.len());
        for c in &column_values {
            let mut scenario = input.inputs.clone();
            input.rows.driver.apply(&mut scenario, *r);
            input.columns.driver.apply(&mut scenario, *c);
            row.push(evaluate(&scenario, input.metric));
        }
        matrix.push(row);
    }

    let base_row = input
        .rows
        .driver
        .current(&input.inputs)
        .map(|v| closest_index(&row_values, v))
        .unwrap_or(0);
    let base_col = input
        .columns
        .driver
        .current(&input.inputs)
        .map(|v| closest_index(&column_values, v))
        .unwrap_or(0);

    let output = SensitivityGrid {
        row_driver: input.rows.driver,
        column_driver: input.columns.driver,
        metric: input.metric,
        row_values,
        column_values,
        matrix,
        base_case_value: evaluate(&input.inputs, input.metric),
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-Way Deal Sensitivity",
        &serde_json::json!({
            "rows": input.rows,
            "columns": input.columns,
            "metric": input.metric,
        }),
        warnings,
        elapsed,
        output,
    ))
}
