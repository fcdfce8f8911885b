use deal_model_core::acquisition::inputs::AcquisitionInputs;
use deal_model_core::acquisition::single_year;
use deal_model_core::calculators::business_loan::{calculate_business_loan, BusinessLoanInput};
use deal_model_core::calculators::dscr::{calculate_dscr, DscrInput};
use deal_model_core::rating::DscrRating;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// DSCR calculator vs. acquisition model
// ===========================================================================

fn dscr_input(sde: Decimal) -> DscrInput {
    DscrInput {
        annual_sde: sde,
        annual_capex: Decimal::ZERO,
        buyer_salary: Decimal::ZERO,
        loan_amount: dec!(1_200_000),
        annual_rate: Decimal::ZERO,
        term_years: dec!(10),
    }
}

fn matching_deal(sde: Decimal) -> AcquisitionInputs {
    let mut input = AcquisitionInputs::default();
    input.operating.annual_sde = sde;
    input.financing.term_loan_amount = dec!(1_200_000);
    input.loan_terms.term_loan_years = dec!(10);
    input
}

#[test]
fn test_calculator_and_model_rate_identically() {
    // 120,000 a year of straight-line debt service.
    let cases = [
        (dec!(119_998.80), DscrRating::Insufficient),
        (dec!(120_000), DscrRating::Marginal),
        (dec!(149_998.80), DscrRating::Marginal),
        (dec!(150_000), DscrRating::Good),
        (dec!(161_998.80), DscrRating::Good),
        (dec!(162_000), DscrRating::Excellent),
    ];
    for (sde, expected) in cases {
        let calc = calculate_dscr(&dscr_input(sde)).result;
        let model = single_year(&matching_deal(sde).validate()).coverage;
        assert_eq!(calc.dscr, model.dscr, "sde {sde}");
        assert_eq!(calc.rating, Some(expected), "sde {sde}");
        assert_eq!(model.dscr_rating, Some(expected), "sde {sde}");
    }
}

#[test]
fn test_calculator_without_debt_has_no_rating() {
    let mut input = dscr_input(dec!(100_000));
    input.loan_amount = Decimal::ZERO;
    let out = calculate_dscr(&input);
    assert_eq!(out.result.dscr, None);
    assert_eq!(out.result.rating, None);
    assert!(!out.warnings.is_empty());
}

#[test]
fn test_percent_style_rate_is_flagged_not_fatal() {
    let mut input = dscr_input(dec!(150_000));
    input.annual_rate = dec!(7.5);
    let out = calculate_dscr(&input);
    assert!(out.warnings.iter().any(|w| w.contains("annual_rate 7.5")));
    // Interest only on 1.2M at 62.5% a month.
    assert!((out.result.monthly_payment - dec!(750_000)).abs() < dec!(0.01));
    assert_eq!(out.result.rating, Some(DscrRating::Insufficient));
}

// ===========================================================================
// Business loan
// ===========================================================================

#[test]
fn test_business_loan_schedule_totals() {
    let out = calculate_business_loan(&BusinessLoanInput {
        loan_amount: dec!(500_000),
        annual_rate: dec!(0.075),
        term_years: dec!(10),
        yearly_only: true,
    });
    let r = &out.result;
    assert!((r.monthly_payment - dec!(5935.09)).abs() < dec!(0.005));
    assert_eq!(r.schedule.yearly.len(), 10);
    assert!(r.schedule.payments.is_empty());
    let principal: Decimal = r.schedule.yearly.iter().map(|y| y.principal).sum();
    assert!((principal - dec!(500_000)).abs() < dec!(0.01));
}

// ===========================================================================
// Records
// ===========================================================================

#[cfg(feature = "records")]
mod records {
    use super::*;
    use chrono::{TimeZone, Utc};
    use deal_model_core::acquisition::analyze;
    use deal_model_core::records::{AnalysisRecord, AnalysisStore, AnalysisType, InMemoryAnalysisStore};

    #[test]
    fn test_persist_and_reload_analysis() {
        let inputs = matching_deal(dec!(150_000));
        let outputs = analyze(&inputs);
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let record = AnalysisRecord::new("deal-42", AnalysisType::Acquisition, &inputs, &outputs, at)
            .unwrap()
            .with_name("Main St. Bakery");

        let mut store = InMemoryAnalysisStore::new();
        assert!(store.save(record).unwrap());

        let loaded = store.load("deal-42", AnalysisType::Acquisition).unwrap();
        assert_eq!(loaded.name, "Main St. Bakery");
        let back: AcquisitionInputs = serde_json::from_value(loaded.inputs).unwrap();
        assert_eq!(back, inputs);
        let dscr: Decimal = loaded.outputs["coverage"]["dscr"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(dscr, dec!(1.25));
    }
}

// ===========================================================================
// Sensitivity
// ===========================================================================

#[cfg(feature = "sensitivity")]
mod sensitivity {
    use super::*;
    use deal_model_core::acquisition::sensitivity::{
        run_sensitivity, SensitivityAxis, SensitivityDriver, SensitivityInput, SensitivityMetric,
    };

    #[test]
    fn test_dscr_falls_with_rate_and_rises_with_sde() {
        let mut inputs = matching_deal(dec!(150_000));
        inputs.loan_terms.term_loan_rate = dec!(0.06);
        let out = run_sensitivity(&SensitivityInput {
            inputs,
            rows: SensitivityAxis {
                driver: SensitivityDriver::TermLoanRate,
                min: dec!(0.05),
                max: dec!(0.09),
                step: dec!(0.01),
            },
            columns: SensitivityAxis {
                driver: SensitivityDriver::AnnualSde,
                min: dec!(140_000),
                max: dec!(180_000),
                step: dec!(20_000),
            },
            metric: SensitivityMetric::Dscr,
        })
        .unwrap();
        let grid = &out.result;
        assert_eq!(grid.row_values.len(), 5);
        assert_eq!(grid.column_values.len(), 3);
        assert_eq!(grid.base_case_position, (1, 0));

        let cell = |i: usize, j: usize| grid.matrix[i][j].unwrap();
        assert!(cell(0, 0) > cell(4, 0));
        assert!(cell(2, 2) > cell(2, 0));
        // 6% and 150,000 are not both on the grid; the base case is evaluated directly.
        let base = grid.base_case_value.unwrap();
        assert!(base > cell(1, 0) && base < cell(1, 1));
    }
}
