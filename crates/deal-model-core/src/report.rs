use serde::{Deserialize, Serialize};

use crate::acquisition::CalculatedMetrics;
use crate::display::{format_currency, format_multiple, format_percent, format_years, NOT_APPLICABLE};

/// Display-ready figures for a deal report. Strings only; renderers must
/// not parse these back into numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub purchase_price: String,
    pub sde_multiple: String,
    pub revenue_multiple: String,
    pub sources_total: String,
    pub uses_total: String,
    pub balanced: bool,
    pub term_loan_monthly_payment: String,
    pub annual_debt_service: String,
    pub lendable_cash_flow: String,
    pub net_cash_flow: String,
    pub dscr: String,
    pub dscr_rating: String,
    pub cash_on_cash_return: String,
    pub payback_period: String,
    pub npv: String,
    pub irr: String,
    pub equity_schedule: Vec<EquityRow>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityRow {
    pub year: u32,
    pub asset_value: String,
    pub loan_balance: String,
    pub owner_equity: String,
    pub equity_percent: String,
}

impl ReportSummary {
    pub fn from_metrics(m: &CalculatedMetrics) -> Self {
        Self {
            purchase_price: format_currency(m.structure.purchase_price),
            sde_multiple: format_multiple(m.structure.sde_multiple),
            revenue_multiple: format_multiple(m.structure.revenue_multiple),
            sources_total: format_currency(m.structure.sources_total),
            uses_total: format_currency(m.structure.uses_total),
            balanced: m.structure.balance.balanced,
            term_loan_monthly_payment: format_currency(m.debt.term_loan_monthly_payment),
            annual_debt_service: format_currency(m.debt.annual_debt_service),
            lendable_cash_flow: format_currency(m.coverage.lendable_cash_flow),
            net_cash_flow: format_currency(m.coverage.net_cash_flow),
            dscr: format_multiple(m.coverage.dscr),
            dscr_rating: m
                .coverage
                .dscr_rating
                .map(|r| r.label().to_string())
                .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
            cash_on_cash_return: format_percent(m.returns.cash_on_cash_return, 1),
            payback_period: format_years(m.returns.payback_period_years),
            npv: m
                .returns
                .npv
                .map(format_currency)
                .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
            irr: format_percent(m.returns.irr, 1),
            equity_schedule: m
                .returns
                .equity_schedule
                .iter()
                .map(|e| EquityRow {
                    year: e.year,
                    asset_value: format_currency(e.asset_value),
                    loan_balance: format_currency(e.loan_balance),
                    owner_equity: format_currency(e.owner_equity),
                    equity_percent: format_percent(Some(e.equity_percent), 1),
                })
                .collect(),
            warnings: m.warnings.clone(),
        }
    }
}
