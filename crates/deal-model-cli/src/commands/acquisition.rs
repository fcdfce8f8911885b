use clap::Args;
use serde_json::json;

use deal_model_core::acquisition::analysis::single_year;
use deal_model_core::acquisition::debt::{amortization_schedule, size_debt};
use deal_model_core::acquisition::scenarios::{run_scenarios, ModelSettings};
use deal_model_core::acquisition::structuring::compute_purchase_price;
use deal_model_core::acquisition::{
    analyze_acquisition_with_settings, analyze_with_settings, AcquisitionInputs,
};
use deal_model_core::report::ReportSummary;

use super::CommandResult;
use crate::input;

/// Arguments shared by commands that take a full set of acquisition inputs
#[derive(Args)]
pub struct DealArgs {
    /// Path to JSON acquisition inputs (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,
}

impl DealArgs {
    fn load(&self) -> Result<AcquisitionInputs, Box<dyn std::error::Error>> {
        input::load(self.input.as_deref(), "acquisition inputs")
    }
}

/// Arguments for the full acquisition analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub deal: DealArgs,

    /// Emit display-ready strings instead of raw figures
    #[arg(long)]
    pub summary: bool,
}

pub fn run_analyze(args: AnalyzeArgs, settings: &ModelSettings) -> CommandResult {
    let inputs = args.deal.load()?;
    if args.summary {
        let metrics = analyze_with_settings(&inputs, settings)?;
        return Ok(serde_json::to_value(ReportSummary::from_metrics(&metrics))?);
    }
    let output = analyze_acquisition_with_settings(&inputs, settings)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_structure(args: DealArgs) -> CommandResult {
    let validated = args.load()?.validate();
    let structure = compute_purchase_price(&validated);
    let mut warnings = validated.adjustments().to_vec();
    warnings.extend(structure.balance_warning());
    Ok(json!({ "result": structure, "warnings": warnings }))
}

pub fn run_debt(args: DealArgs) -> CommandResult {
    let validated = args.load()?.validate();
    let sizing = size_debt(&validated);
    let schedule = amortization_schedule(
        validated.financing.term_loan_amount,
        validated.loan_terms.term_loan_rate,
        validated.loan_terms.term_loan_years,
    );
    Ok(json!({
        "result": {
            "sizing": sizing,
            "term_loan_total_interest": schedule.total_interest,
            "term_loan_yearly": schedule.yearly,
        },
        "warnings": validated.adjustments(),
    }))
}

pub fn run_scenarios_cmd(args: DealArgs, settings: &ModelSettings) -> CommandResult {
    let validated = args.load()?.validate();
    let sy = single_year(&validated);
    let set = run_scenarios(&validated, &sy, &settings.scenarios)?;
    let mut warnings = validated.adjustments().to_vec();
    warnings.extend(set.warnings.iter().cloned());
    Ok(json!({ "result": set, "warnings": warnings }))
}
