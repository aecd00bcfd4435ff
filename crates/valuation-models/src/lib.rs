//! Fair-value calculators.
//!
//! Every model is a pure function over provider fields. Missing or
//! degenerate inputs produce `None`, never an error: a stock without a
//! dividend simply has no DDM value.

use serde::{Deserialize, Serialize};
use valuation_core::{CompanyInfo, EpsForecast, ValuationSummary};

pub mod forecast;
pub mod wacc;

pub use forecast::{forecast_eps, ForecastInputs};
pub use wacc::{estimate_wacc, WaccInputs, DEFAULT_WACC_PCT};

/// Tunable model assumptions with the conventional defaults
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelAssumptions {
    /// DCF discount rate (cost of equity), decimal
    pub discount_rate: f64,
    /// FCFE growth rate for the projection window, decimal
    pub growth_rate: f64,
    /// Terminal growth rate, decimal
    pub terminal_growth: f64,
    /// Target P/E for mean reversion
    pub target_pe: f64,
    /// Required return for the dividend discount model, decimal
    pub required_return: f64,
    /// Dividend growth rate for the dividend discount model, decimal
    pub dividend_growth: f64,
    /// EPS projection horizon in years
    pub forecast_years: usize,
}

impl Default for ModelAssumptions {
    fn default() -> Self {
        Self {
            discount_rate: 0.10,
            growth_rate: 0.05,
            terminal_growth: 0.025,
            target_pe: 15.0,
            required_return: 0.10,
            dividend_growth: 0.05,
            forecast_years: 5,
        }
    }
}

/// Inputs for the FCFE discounted cash flow model
#[derive(Debug, Clone, Default)]
pub struct DcfInputs<'a> {
    /// Latest levered free cash flow (FCFE), total not per-share
    pub free_cash_flow: Option<f64>,
    pub shares_outstanding: Option<f64>,
    /// Cost of equity, decimal
    pub discount_rate: f64,
    /// FCFE growth over the projection window, decimal
    pub growth_rate: f64,
    /// Terminal growth rate, decimal
    pub terminal_growth: f64,
    /// Forecast EPS sequence; when present (with a conversion ratio) it
    /// replaces the growth-projected FCF path
    pub eps_forecast: Option<&'a [f64]>,
    /// Ratio converting EPS to FCFE per share
    pub eps_to_fcf_ratio: Option<f64>,
    /// Fallback conversion ratio when no explicit EPS-to-FCF ratio is known
    pub net_margin: Option<f64>,
}

/// Per-share intrinsic value via discounted FCFE.
///
/// The provider's free cash flow is levered, so the discounted sum is
/// already equity value and no net-debt adjustment is applied.
pub fn dcf_fair_value(inputs: &DcfInputs) -> Option<f64> {
    let shares = inputs.shares_outstanding.filter(|s| *s > 0.0)?;

    let conversion_ratio = inputs.eps_to_fcf_ratio.or(inputs.net_margin);

    let projected: Vec<f64> = match (inputs.eps_forecast, conversion_ratio) {
        (Some(eps_seq), Some(ratio)) if !eps_seq.is_empty() => eps_seq
            .iter()
            .map(|eps| eps * shares * ratio)
            .collect(),
        _ => {
            let fcf = inputs.free_cash_flow?;
            (1..=5)
                .map(|i| fcf * (1.0 + inputs.growth_rate).powi(i))
                .collect()
        }
    };

    if projected.is_empty() {
        return None;
    }

    let discounted: f64 = projected
        .iter()
        .enumerate()
        .map(|(i, fcf)| fcf / (1.0 + inputs.discount_rate).powi(i as i32 + 1))
        .sum();

    // Gordon terminal value off the last projected year
    if inputs.discount_rate <= inputs.terminal_growth {
        return None;
    }
    let last_fcf = *projected.last()?;
    let terminal_value =
        last_fcf * (1.0 + inputs.terminal_growth) / (inputs.discount_rate - inputs.terminal_growth);
    let present_terminal =
        terminal_value / (1.0 + inputs.discount_rate).powi(projected.len() as i32);

    let equity_value = discounted + present_terminal;
    Some(equity_value / shares)
}

/// CAGR implied by a forecast EPS sequence against a trailing-EPS base
pub fn growth_from_forecast(forecast_eps: &[f64], trailing_eps: Option<f64>) -> Option<f64> {
    let base = trailing_eps.filter(|e| *e > 0.0)?;
    let end = *forecast_eps.last()?;
    if end <= 0.0 {
        return None;
    }
    let periods = forecast_eps.len() as f64;
    Some((end / base).powf(1.0 / periods) - 1.0)
}

/// PEG = P/E / (growth in percent); requires positive growth
pub fn peg_ratio(pe_ratio: Option<f64>, earnings_growth: Option<f64>) -> Option<f64> {
    let pe = pe_ratio.filter(|pe| *pe > 0.0)?;
    let growth = earnings_growth.filter(|g| *g > 0.0)?;
    Some(pe / (growth * 100.0))
}

/// Fair value at PEG = 1: EPS times growth-rate-as-fair-P/E
pub fn peg_fair_value(eps: Option<f64>, earnings_growth: Option<f64>) -> Option<f64> {
    let eps = eps.filter(|e| *e != 0.0)?;
    let growth = earnings_growth.filter(|g| *g > 0.0)?;
    Some(eps * growth * 100.0)
}

/// Graham number: sqrt(22.5 * EPS * book value per share)
pub fn graham_number(eps: Option<f64>, book_value: Option<f64>) -> Option<f64> {
    let eps = eps.filter(|e| *e > 0.0)?;
    let bv = book_value.filter(|b| *b > 0.0)?;
    Some((22.5 * eps * bv).sqrt())
}

/// Peter Lynch fair value: EPS times (growth% + dividend yield%)
pub fn peter_lynch_value(
    eps: Option<f64>,
    earnings_growth: Option<f64>,
    dividend_yield: Option<f64>,
) -> Option<f64> {
    let eps = eps.filter(|e| *e != 0.0)?;
    let growth = earnings_growth.filter(|g| *g != 0.0)?;
    let dividend_boost = dividend_yield.map_or(0.0, |dy| dy * 100.0);
    Some(eps * (growth * 100.0 + dividend_boost))
}

/// Fair value from mean reversion to a target P/E
pub fn mean_reversion_value(eps: Option<f64>, target_pe: f64) -> Option<f64> {
    let eps = eps.filter(|e| *e != 0.0)?;
    if target_pe <= 0.0 {
        return None;
    }
    Some(eps * target_pe)
}

/// EV/EBITDA multiple
pub fn ev_ebitda_multiple(enterprise_value: Option<f64>, ebitda: Option<f64>) -> Option<f64> {
    let ev = enterprise_value.filter(|v| *v != 0.0)?;
    let ebitda = ebitda.filter(|e| *e != 0.0)?;
    Some(ev / ebitda)
}

/// Gordon growth dividend discount model: D1 / (r - g)
pub fn ddm_value(
    dividend_rate: Option<f64>,
    required_return: f64,
    dividend_growth: f64,
) -> Option<f64> {
    let d0 = dividend_rate.filter(|d| *d > 0.0)?;
    if required_return <= dividend_growth {
        // Model blows up when growth meets the discount rate
        return None;
    }
    let d1 = d0 * (1.0 + dividend_growth);
    Some(d1 / (required_return - dividend_growth))
}

/// Run every valuation model against a company snapshot.
///
/// `wacc` (decimal) is the DCF discount rate; the forecast, when present,
/// drives the DCF projection path, the PEG growth estimate, and the
/// mean-reversion EPS.
pub fn run_all(
    info: &CompanyInfo,
    assumptions: &ModelAssumptions,
    wacc: f64,
    eps_forecast: Option<EpsForecast>,
    eps_to_fcf_ratio: Option<f64>,
    net_margin: Option<f64>,
) -> ValuationSummary {
    let forecast_values: Vec<f64> = eps_forecast
        .as_ref()
        .map(|f| f.eps_values())
        .unwrap_or_default();
    let first_year_eps = eps_forecast.as_ref().and_then(|f| f.first_year_eps());

    let dcf_value = dcf_fair_value(&DcfInputs {
        free_cash_flow: info.free_cash_flow,
        shares_outstanding: info.shares_outstanding,
        discount_rate: wacc,
        growth_rate: assumptions.growth_rate,
        terminal_growth: assumptions.terminal_growth,
        eps_forecast: (!forecast_values.is_empty()).then_some(forecast_values.as_slice()),
        eps_to_fcf_ratio,
        net_margin,
    });
    if dcf_value.is_none() {
        tracing::debug!(symbol = %info.symbol, "DCF skipped: missing cash flow or share data");
    }

    // Prefer forecast-implied growth over the provider's estimate
    let growth_for_peg =
        growth_from_forecast(&forecast_values, info.trailing_eps).or(info.earnings_growth);
    let pe_for_peg = info.forward_pe.or(info.trailing_pe);
    let peg = peg_ratio(pe_for_peg, growth_for_peg);
    let peg_value = match peg {
        Some(p) if p > 0.0 => {
            peg_fair_value(first_year_eps.or(info.trailing_eps), growth_for_peg)
        }
        _ => None,
    };

    ValuationSummary {
        dcf_value,
        peg_ratio: peg,
        peg_value,
        lynch_value: peter_lynch_value(
            info.trailing_eps,
            info.earnings_growth,
            info.dividend_yield,
        ),
        mean_reversion_value: mean_reversion_value(
            first_year_eps.or(info.trailing_eps),
            assumptions.target_pe,
        ),
        graham_number: graham_number(info.trailing_eps, info.book_value),
        ddm_value: ddm_value(
            info.dividend_rate,
            assumptions.required_return,
            assumptions.dividend_growth,
        ),
        ev_ebitda: ev_ebitda_multiple(info.enterprise_value, info.ebitda),
        eps_forecast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::EpsPoint;

    fn close_to(actual: f64, expected: f64, tol: f64) -> bool {
        (actual - expected).abs() < tol
    }

    #[test]
    fn dcf_projects_from_free_cash_flow() {
        let value = dcf_fair_value(&DcfInputs {
            free_cash_flow: Some(1000.0),
            shares_outstanding: Some(100.0),
            discount_rate: 0.10,
            growth_rate: 0.05,
            terminal_growth: 0.02,
            ..Default::default()
        })
        .unwrap();

        // 5 years of FCF growing 5%, discounted at 10%, plus terminal value
        let mut expected_total = 0.0;
        for i in 1..=5 {
            expected_total += 1000.0 * 1.05_f64.powi(i) / 1.10_f64.powi(i);
        }
        let last = 1000.0 * 1.05_f64.powi(5);
        let terminal = last * 1.02 / (0.10 - 0.02) / 1.10_f64.powi(5);
        let expected = (expected_total + terminal) / 100.0;

        assert!(close_to(value, expected, 1e-9));
    }

    #[test]
    fn dcf_converts_eps_forecast_to_fcf() {
        let eps_forecast = [5.0, 5.25, 5.5125, 5.788125, 6.07753125];
        let value = dcf_fair_value(&DcfInputs {
            free_cash_flow: None,
            shares_outstanding: Some(100.0),
            discount_rate: 0.10,
            growth_rate: 0.05,
            terminal_growth: 0.02,
            eps_forecast: Some(&eps_forecast),
            eps_to_fcf_ratio: Some(0.8),
            ..Default::default()
        });

        let value = value.unwrap();
        assert!(value > 0.0);
        // Per-share value scales with the conversion ratio
        let double_ratio = dcf_fair_value(&DcfInputs {
            free_cash_flow: None,
            shares_outstanding: Some(100.0),
            discount_rate: 0.10,
            growth_rate: 0.05,
            terminal_growth: 0.02,
            eps_forecast: Some(&eps_forecast),
            eps_to_fcf_ratio: Some(1.6),
            ..Default::default()
        })
        .unwrap();
        assert!(close_to(double_ratio, value * 2.0, 1e-9));
    }

    #[test]
    fn dcf_rejects_degenerate_inputs() {
        // No shares outstanding
        assert!(dcf_fair_value(&DcfInputs {
            free_cash_flow: Some(1000.0),
            shares_outstanding: None,
            discount_rate: 0.10,
            growth_rate: 0.05,
            terminal_growth: 0.02,
            ..Default::default()
        })
        .is_none());

        // Terminal growth at or above the discount rate
        assert!(dcf_fair_value(&DcfInputs {
            free_cash_flow: Some(1000.0),
            shares_outstanding: Some(100.0),
            discount_rate: 0.05,
            growth_rate: 0.05,
            terminal_growth: 0.05,
            ..Default::default()
        })
        .is_none());

        // No projection source at all
        assert!(dcf_fair_value(&DcfInputs {
            free_cash_flow: None,
            shares_outstanding: Some(100.0),
            discount_rate: 0.10,
            growth_rate: 0.05,
            terminal_growth: 0.02,
            ..Default::default()
        })
        .is_none());
    }

    #[test]
    fn peg_ratio_and_fair_value() {
        assert!(close_to(peg_ratio(Some(20.0), Some(0.10)).unwrap(), 2.0, 1e-9));
        assert!(close_to(peg_fair_value(Some(5.0), Some(0.10)).unwrap(), 50.0, 1e-9));

        assert!(peg_ratio(Some(20.0), Some(-0.05)).is_none());
        assert!(peg_ratio(None, Some(0.10)).is_none());
        assert!(peg_fair_value(Some(5.0), None).is_none());
    }

    #[test]
    fn growth_from_forecast_is_cagr() {
        // 5.0 trailing growing to 6.07... over 5 periods is ~4% CAGR
        let forecast = [5.2, 5.4, 5.6, 5.85, 6.0833];
        let g = growth_from_forecast(&forecast, Some(5.0)).unwrap();
        let expected = (6.0833_f64 / 5.0).powf(1.0 / 5.0) - 1.0;
        assert!(close_to(g, expected, 1e-9));

        assert!(growth_from_forecast(&forecast, Some(-1.0)).is_none());
        assert!(growth_from_forecast(&[], Some(5.0)).is_none());
        assert!(growth_from_forecast(&[-2.0], Some(5.0)).is_none());
    }

    #[test]
    fn graham_number_formula() {
        let g = graham_number(Some(4.0), Some(20.0)).unwrap();
        assert!(close_to(g, (22.5_f64 * 4.0 * 20.0).sqrt(), 1e-9));
        assert!(graham_number(Some(-1.0), Some(20.0)).is_none());
        assert!(graham_number(Some(4.0), None).is_none());
    }

    #[test]
    fn peter_lynch_includes_dividend_boost() {
        // EPS 5, growth 15%, yield 2% -> 5 * (15 + 2) = 85
        let v = peter_lynch_value(Some(5.0), Some(0.15), Some(0.02)).unwrap();
        assert!(close_to(v, 85.0, 1e-9));

        // Without a dividend the boost is zero
        let v = peter_lynch_value(Some(5.0), Some(0.15), None).unwrap();
        assert!(close_to(v, 75.0, 1e-9));
    }

    #[test]
    fn mean_reversion_uses_target_pe() {
        assert!(close_to(mean_reversion_value(Some(6.0), 15.0).unwrap(), 90.0, 1e-9));
        assert!(mean_reversion_value(None, 15.0).is_none());
        assert!(mean_reversion_value(Some(6.0), 0.0).is_none());
    }

    #[test]
    fn ddm_gordon_growth() {
        // D0=2, g=5%, r=10% -> 2.1 / 0.05 = 42
        let v = ddm_value(Some(2.0), 0.10, 0.05).unwrap();
        assert!(close_to(v, 42.0, 1e-9));

        // Invalid when growth meets the required return
        assert!(ddm_value(Some(2.0), 0.05, 0.05).is_none());
        assert!(ddm_value(None, 0.10, 0.05).is_none());
    }

    #[test]
    fn ev_ebitda_guard() {
        assert!(close_to(
            ev_ebitda_multiple(Some(1_200.0), Some(100.0)).unwrap(),
            12.0,
            1e-9
        ));
        assert!(ev_ebitda_multiple(Some(1_200.0), Some(0.0)).is_none());
    }

    #[test]
    fn run_all_prefers_forecast_inputs() {
        let info = CompanyInfo {
            symbol: "TEST".to_string(),
            trailing_eps: Some(5.0),
            forward_pe: Some(20.0),
            free_cash_flow: Some(1_000_000.0),
            shares_outstanding: Some(100_000.0),
            enterprise_value: Some(10_000_000.0),
            ebitda: Some(1_000_000.0),
            earnings_growth: Some(0.08),
            dividend_yield: Some(0.01),
            book_value: Some(25.0),
            dividend_rate: Some(1.0),
            ..Default::default()
        };
        let forecast = EpsForecast {
            base_eps: Some(5.0),
            growth_rate: 0.10,
            shares_outstanding: Some(100_000.0),
            points: (1..=5)
                .map(|i| EpsPoint {
                    year: 2025 + i,
                    eps: 5.0 * 1.10_f64.powi(i),
                })
                .collect(),
        };

        let summary = run_all(
            &info,
            &ModelAssumptions::default(),
            0.10,
            Some(forecast),
            Some(0.9),
            None,
        );

        assert!(summary.dcf_value.is_some());
        // Forecast CAGR (10%) beats the provider's 8% for the PEG inputs
        let expected_growth = (5.0 * 1.10_f64.powi(5) / 5.0_f64).powf(1.0 / 5.0) - 1.0;
        let expected_peg = 20.0 / (expected_growth * 100.0);
        assert!(close_to(summary.peg_ratio.unwrap(), expected_peg, 1e-9));
        // Mean reversion uses the first forecast year's EPS
        assert!(close_to(
            summary.mean_reversion_value.unwrap(),
            5.0 * 1.10 * 15.0,
            1e-9
        ));
        assert!(summary.lynch_value.is_some());
        assert!(summary.graham_number.is_some());
        assert!(summary.ddm_value.is_some());
        assert!(close_to(summary.ev_ebitda.unwrap(), 10.0, 1e-9));
    }

    #[test]
    fn run_all_with_sparse_info() {
        let info = CompanyInfo {
            symbol: "SPARSE".to_string(),
            ..Default::default()
        };
        let summary = run_all(&info, &ModelAssumptions::default(), 0.10, None, None, None);

        assert!(summary.dcf_value.is_none());
        assert!(summary.peg_ratio.is_none());
        assert!(summary.lynch_value.is_none());
        assert!(summary.mean_reversion_value.is_none());
        assert!(summary.ev_ebitda.is_none());
        assert!(summary.ddm_value.is_none());
    }
}
