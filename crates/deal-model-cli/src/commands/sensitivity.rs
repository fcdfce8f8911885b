use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use deal_model_core::acquisition::sensitivity::{
    run_sensitivity, SensitivityAxis, SensitivityInput, SensitivityMetric,
};
use deal_model_core::acquisition::AcquisitionInputs;

use super::CommandResult;
use crate::input;

/// Arguments for a two-way sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a complete JSON sensitivity request (overrides the flags below)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to JSON acquisition inputs for the base case
    #[arg(long)]
    pub base_inputs: Option<String>,

    /// Row axis as driver:min:max:step (e.g. "term_loan_rate:0.06:0.09:0.005")
    #[arg(long)]
    pub rows: Option<String>,

    /// Column axis as driver:min:max:step (e.g. "annual_sde:200000:300000:25000")
    #[arg(long)]
    pub columns: Option<String>,

    /// Metric per cell: dscr, cash_on_cash, net_cash_flow, npv, irr, payback_years
    #[arg(long, default_value = "dscr")]
    pub metric: String,
}

/// Parse a snake_case name into one of the core's serde enums.
fn parse_name<T: DeserializeOwned>(name: &str) -> Result<T, Box<dyn std::error::Error>> {
    serde_json::from_value(Value::String(name.trim().to_string()))
        .map_err(|_| format!("Unknown name '{}'", name).into())
}

fn parse_axis(text: &str) -> Result<SensitivityAxis, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 4 {
        return Err(format!("Axis must be driver:min:max:step, got '{}'", text).into());
    }
    Ok(SensitivityAxis {
        driver: parse_name(parts[0])?,
        min: parts[1].parse::<Decimal>()?,
        max: parts[2].parse::<Decimal>()?,
        step: parts[3].parse::<Decimal>()?,
    })
}

pub fn run_sensitivity_cmd(args: SensitivityArgs) -> CommandResult {
    let request: SensitivityInput = match (&args.input, &args.base_inputs) {
        (Some(path), _) => input::load(Some(path.as_str()), "sensitivity")?,
        (None, Some(base)) => {
            let inputs: AcquisitionInputs = input::load(Some(base.as_str()), "acquisition inputs")?;
            let rows = args.rows.as_deref().ok_or("--rows is required with --base-inputs")?;
            let columns = args
                .columns
                .as_deref()
                .ok_or("--columns is required with --base-inputs")?;
            SensitivityInput {
                inputs,
                rows: parse_axis(rows)?,
                columns: parse_axis(columns)?,
                metric: parse_name::<SensitivityMetric>(&args.metric)?,
            }
        }
        (None, None) => input::load(None, "sensitivity")?,
    };
    let grid = run_sensitivity(&request)?;
    Ok(serde_json::to_value(grid)?)
}
