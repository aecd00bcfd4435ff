//! Weighted average cost of capital estimation.
//!
//! WACC = (E/V * Re) + (D/V * Rd * (1 - T)). Every input has a fallback so
//! the estimate degrades toward the 10% convention instead of failing.

const EQUITY_RISK_PREMIUM: f64 = 0.05;
const RISK_FREE_FALLBACK: f64 = 0.04;
const COST_OF_DEBT_FALLBACK: f64 = 0.04;
const TAX_RATE_FALLBACK: f64 = 0.21;

/// Conventional fallback when capital-structure data is missing, percent
pub const DEFAULT_WACC_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct WaccInputs {
    /// 10Y treasury yield, decimal
    pub risk_free_rate: Option<f64>,
    pub beta: Option<f64>,
    /// Annual interest expense (sign ignored; statements report it negative)
    pub interest_expense: Option<f64>,
    pub total_debt: Option<f64>,
    pub tax_provision: Option<f64>,
    pub pretax_income: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Estimate WACC as a percentage.
pub fn estimate_wacc(inputs: &WaccInputs) -> f64 {
    let market_cap = match inputs.market_cap.filter(|m| *m > 0.0) {
        Some(m) => m,
        None => return DEFAULT_WACC_PCT,
    };

    let risk_free = inputs.risk_free_rate.unwrap_or(RISK_FREE_FALLBACK);
    let beta = inputs.beta.unwrap_or(1.0);
    let cost_of_equity = risk_free + beta * EQUITY_RISK_PREMIUM;

    let total_debt = inputs.total_debt.unwrap_or(0.0).max(0.0);
    let cost_of_debt = if total_debt > 0.0 {
        inputs
            .interest_expense
            .map(|ie| ie.abs() / total_debt)
            .unwrap_or(COST_OF_DEBT_FALLBACK)
    } else {
        COST_OF_DEBT_FALLBACK
    };

    let tax_rate = match (inputs.tax_provision, inputs.pretax_income) {
        (Some(provision), Some(pretax)) if pretax != 0.0 => {
            (provision / pretax).clamp(0.0, 0.40)
        }
        _ => TAX_RATE_FALLBACK,
    };

    let total_value = market_cap + total_debt;
    let weight_equity = market_cap / total_value;
    let weight_debt = total_debt / total_value;

    let wacc = weight_equity * cost_of_equity + weight_debt * cost_of_debt * (1.0 - tax_rate);
    wacc * 100.0
}
