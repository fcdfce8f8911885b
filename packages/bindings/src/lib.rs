use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use deal_model_core::acquisition::AcquisitionInputs;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_inputs(inputs_json: &str) -> NapiResult<AcquisitionInputs> {
    serde_json::from_str(inputs_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Acquisition model
// ---------------------------------------------------------------------------

/// Full model. `settings_json` optionally replaces the default scenario set.
#[napi]
pub fn analyze_acquisition(inputs_json: String, settings_json: Option<String>) -> NapiResult<String> {
    let inputs = parse_inputs(&inputs_json)?;
    let output = match settings_json {
        Some(s) => {
            let settings: deal_model_core::acquisition::scenarios::ModelSettings =
                serde_json::from_str(&s).map_err(to_napi_error)?;
            deal_model_core::acquisition::analyze_acquisition_with_settings(&inputs, &settings)
                .map_err(to_napi_error)?
        }
        None => deal_model_core::acquisition::analyze_acquisition(&inputs),
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_purchase_price(inputs_json: String) -> NapiResult<String> {
    let validated = parse_inputs(&inputs_json)?.validate();
    let output = deal_model_core::acquisition::structuring::compute_purchase_price(&validated);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn size_debt(inputs_json: String) -> NapiResult<String> {
    let validated = parse_inputs(&inputs_json)?.validate();
    let output = deal_model_core::acquisition::debt::size_debt(&validated);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_cash_flow(inputs_json: String) -> NapiResult<String> {
    let validated = parse_inputs(&inputs_json)?.validate();
    let debt = deal_model_core::acquisition::debt::size_debt(&validated);
    let output =
        deal_model_core::acquisition::coverage::compute_cash_flow(&validated, debt.annual_debt_service);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_returns(inputs_json: String) -> NapiResult<String> {
    let validated = parse_inputs(&inputs_json)?.validate();
    let sy = deal_model_core::acquisition::single_year(&validated);
    let output = deal_model_core::acquisition::projection::project_returns(&validated, &sy);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn report_summary(inputs_json: String) -> NapiResult<String> {
    let metrics = deal_model_core::acquisition::analyze(&parse_inputs(&inputs_json)?);
    let output = deal_model_core::report::ReportSummary::from_metrics(&metrics);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_sensitivity(input_json: String) -> NapiResult<String> {
    let input: deal_model_core::acquisition::sensitivity::SensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = deal_model_core::acquisition::sensitivity::run_sensitivity(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loan amortization
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AmortizeArgs {
    principal: Decimal,
    annual_rate: Decimal,
    term_years: Decimal,
}

/// Monthly payment only, as a decimal string.
#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    let args: AmortizeArgs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let payment =
        deal_model_core::acquisition::debt::amortize(args.principal, args.annual_rate, args.term_years);
    Ok(payment.to_string())
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let args: AmortizeArgs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = deal_model_core::acquisition::debt::amortization_schedule(
        args.principal,
        args.annual_rate,
        args.term_years,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Calculators
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_dscr(input_json: String) -> NapiResult<String> {
    let input: deal_model_core::calculators::dscr::DscrInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = deal_model_core::calculators::dscr::calculate_dscr(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Rating for a DSCR given as a decimal string; `null` for "no debt".
#[napi]
pub fn rate_dscr(dscr: Option<String>) -> NapiResult<Option<String>> {
    let value = dscr
        .map(|s| s.parse::<Decimal>())
        .transpose()
        .map_err(to_napi_error)?;
    Ok(deal_model_core::rating::rate_dscr(value).map(|r| r.label().to_string()))
}

#[napi]
pub fn calculate_business_loan(input_json: String) -> NapiResult<String> {
    let input: deal_model_core::calculators::business_loan::BusinessLoanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = deal_model_core::calculators::business_loan::calculate_business_loan(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_commercial_property(input_json: String) -> NapiResult<String> {
    let input: deal_model_core::calculators::commercial_property::CommercialPropertyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        deal_model_core::calculators::commercial_property::analyze_commercial_property(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn size_cre_loan(input_json: String) -> NapiResult<String> {
    let input: deal_model_core::calculators::cre_loan_sizer::CreLoanSizerInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = deal_model_core::calculators::cre_loan_sizer::size_cre_loan(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Time value
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PaybackArgs {
    investment: Decimal,
    cash_flows: Vec<Decimal>,
}

/// Simple payback in years as a decimal string, or `null` if never recovered.
#[napi]
pub fn payback_period(input_json: String) -> NapiResult<Option<String>> {
    let args: PaybackArgs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    Ok(deal_model_core::time_value::payback_period(args.investment, &args.cash_flows)
        .map(|y| y.to_string()))
}
