use deal_model_core::acquisition::inputs::{
    AcquisitionInputs, ExitAssumption, ExitMetric, ExitValuation,
};
use deal_model_core::acquisition::scenarios::{default_scenarios, ModelSettings};
use deal_model_core::acquisition::{analyze, analyze_with_settings};
use deal_model_core::time_value::payback_period;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn leveraged_deal() -> AcquisitionInputs {
    let mut input = AcquisitionInputs::default();
    input.deal.asking_price = dec!(800_000);
    input.operating.annual_revenue = dec!(1_600_000);
    input.operating.annual_sde = dec!(260_000);
    input.operating.buyer_minimum_salary = dec!(75_000);
    input.financing.buyer_equity = dec!(80_000);
    input.financing.seller_financing_amount = dec!(80_000);
    input.financing.term_loan_amount = dec!(640_000);
    input.loan_terms.term_loan_rate = dec!(0.075);
    input.loan_terms.term_loan_years = dec!(10);
    input
}

/// All-cash deal returning a flat 50,000 a year on 120,000 invested.
fn all_cash_deal() -> AcquisitionInputs {
    let mut input = AcquisitionInputs::default();
    input.deal.asking_price = dec!(120_000);
    input.operating.annual_sde = dec!(50_000);
    input.financing.buyer_equity = dec!(120_000);
    input
}

// ===========================================================================
// Equity schedule
// ===========================================================================

#[test]
fn test_equity_grows_as_debt_amortizes() {
    let m = analyze(&leveraged_deal());
    let schedule = &m.returns.equity_schedule;
    assert_eq!(schedule.len(), 10);
    for pair in schedule.windows(2) {
        assert!(pair[1].owner_equity >= pair[0].owner_equity);
        assert!(pair[1].loan_balance <= pair[0].loan_balance);
    }
    // Term loan retired by year 10; the standby seller note remains.
    assert!((schedule[9].loan_balance - dec!(80_000)).abs() < dec!(0.01));
}

#[test]
fn test_equity_percent_is_share_of_asset_value() {
    let m = analyze(&leveraged_deal());
    for e in &m.returns.equity_schedule {
        let expected = e.owner_equity / e.asset_value;
        assert_eq!(e.equity_percent, expected);
    }
}

#[test]
fn test_appreciation_lifts_asset_value() {
    let mut input = leveraged_deal();
    input.projection.asset_appreciation_rate = Some(dec!(0.03));
    let m = analyze(&input);
    assert_eq!(m.returns.equity_schedule[0].asset_value, dec!(824_000));
}

// ===========================================================================
// Payback and returns
// ===========================================================================

#[test]
fn test_payback_matches_hand_calculation() {
    let flows = [dec!(50_000), dec!(50_000), dec!(50_000)];
    assert_eq!(payback_period(dec!(120_000), &flows), Some(dec!(2.4)));

    let m = analyze(&all_cash_deal());
    assert_eq!(m.returns.payback_period_years, Some(dec!(2.4)));
    assert_eq!(m.returns.cash_on_cash_return, Some(dec!(50_000) / dec!(120_000)));
}

#[test]
fn test_unrecovered_investment_has_no_payback() {
    let mut input = all_cash_deal();
    input.operating.annual_sde = dec!(5_000);
    input.projection.projection_years = 5;
    let m = analyze(&input);
    assert_eq!(m.returns.payback_period_years, None);
    assert!(m.warnings.iter().any(|w| w.contains("not recovered")));
}

#[test]
fn test_npv_only_with_discount_rate() {
    let m = analyze(&all_cash_deal());
    assert!(m.returns.npv.is_none());

    let mut input = all_cash_deal();
    input.projection.discount_rate = Some(Decimal::ZERO);
    let m = analyze(&input);
    // Undiscounted: ten years of 50,000 less 120,000.
    assert_eq!(m.returns.npv, Some(dec!(380_000)));
    assert_eq!(m.returns.total_roi, Some(dec!(500_000) / dec!(120_000)));
}

// ===========================================================================
// Growth and exit
// ===========================================================================

#[test]
fn test_zero_growth_projection_is_flat() {
    let m = analyze(&leveraged_deal());
    let years = &m.returns.years;
    assert_eq!(years.len(), 10);
    let first = &years[0];
    assert_eq!(first.pre_tax_cash_flow, m.coverage.net_cash_flow);
    for y in years {
        assert_eq!(y.sde, first.sde);
        assert_eq!(y.debt_service, first.debt_service);
        assert_eq!(y.pre_tax_cash_flow, first.pre_tax_cash_flow);
        assert_eq!(y.exit_proceeds, Decimal::ZERO);
    }
}

#[test]
fn test_debt_service_stops_after_term() {
    let mut input = leveraged_deal();
    input.loan_terms.term_loan_years = dec!(5);
    let m = analyze(&input);
    let years = &m.returns.years;
    assert!(years[4].debt_service > Decimal::ZERO);
    assert_eq!(years[5].debt_service, Decimal::ZERO);
    assert_eq!(years[5].dscr, None);
}

#[test]
fn test_exit_proceeds_land_in_exit_year_only() {
    let mut input = leveraged_deal();
    input.projection.exit = Some(ExitAssumption {
        year: 5,
        valuation: ExitValuation::Manual {
            proceeds: dec!(900_000),
        },
    });
    let m = analyze(&input);
    for y in &m.returns.years {
        if y.year == 5 {
            assert_eq!(y.exit_proceeds, dec!(900_000));
            assert_eq!(y.net_cash_flow, y.pre_tax_cash_flow + dec!(900_000));
        } else {
            assert_eq!(y.exit_proceeds, Decimal::ZERO);
            assert_eq!(y.net_cash_flow, y.pre_tax_cash_flow);
        }
    }
}

#[test]
fn test_multiple_based_exit_nets_debt_and_costs() {
    let mut input = leveraged_deal();
    input.projection.exit = Some(ExitAssumption {
        year: 10,
        valuation: ExitValuation::MultipleBased {
            multiple: dec!(3),
            metric: ExitMetric::ProjectedSde,
            debt_payoff: None,
            transaction_cost_pct: dec!(0.05),
        },
    });
    let m = analyze(&input);
    let exit = m.returns.exit.clone().expect("exit settled");
    assert_eq!(exit.gross_value, Some(dec!(780_000)));
    assert_eq!(exit.transaction_costs, dec!(39_000));
    let balance = m.returns.equity_schedule[9].loan_balance;
    assert_eq!(exit.debt_payoff, balance);
    assert_eq!(exit.net_proceeds, dec!(741_000) - balance);
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn test_default_scenarios_are_probability_weighted() {
    let mut input = leveraged_deal();
    input.projection.growth_rate = dec!(0.04);
    let m = analyze(&input);
    let set = &m.scenarios;
    assert_eq!(set.outcomes.len(), 3);
    let total: Decimal = set.outcomes.iter().map(|o| o.probability).sum();
    assert_eq!(total, Decimal::ONE);
    let weighted: Decimal = set
        .outcomes
        .iter()
        .map(|o| o.probability * o.cumulative_cash_flow)
        .sum();
    assert_eq!(set.probability_weighted_cash_flow, weighted);

    let conservative = &set.outcomes[0];
    let optimistic = &set.outcomes[2];
    assert!(conservative.cumulative_cash_flow < optimistic.cumulative_cash_flow);
}

#[test]
fn test_base_scenario_matches_base_projection() {
    let mut input = leveraged_deal();
    input.projection.growth_rate = dec!(0.04);
    let m = analyze(&input);
    let base = m
        .scenarios
        .outcomes
        .iter()
        .find(|o| o.name == "Base")
        .expect("base scenario");
    assert_eq!(base.cumulative_cash_flow, m.returns.cumulative_cash_flow());
}

#[test]
fn test_custom_scenarios_must_sum_to_one() {
    let mut scenarios = default_scenarios();
    scenarios[0].probability = dec!(0.5);
    let settings = ModelSettings { scenarios };
    assert!(analyze_with_settings(&leveraged_deal(), &settings).is_err());
}
