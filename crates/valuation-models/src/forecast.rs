//! EPS projection used by the forecast-driven valuation paths.

use valuation_core::{EpsForecast, EpsPoint};

/// Inputs for [`forecast_eps`]
#[derive(Debug, Clone, Default)]
pub struct ForecastInputs<'a> {
    /// Historical EPS per share, oldest first
    pub eps_history: &'a [f64],
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
    /// Analyst earnings-growth estimate, decimal
    pub provider_growth: Option<f64>,
    /// Caller override; wins over every other growth source
    pub custom_growth: Option<f64>,
    pub shares_outstanding: Option<f64>,
    /// First projected calendar year
    pub start_year: i32,
    pub years: usize,
}

/// Project EPS `years` ahead from the best available base.
///
/// Base preference: latest historical (or trailing) EPS, then forward EPS.
/// Growth preference: caller override, then the analyst estimate, then the
/// rate implied by forward vs base EPS, then flat.
pub fn forecast_eps(inputs: &ForecastInputs) -> EpsForecast {
    let mut history: Vec<f64> = inputs.eps_history.to_vec();
    if let Some(trailing) = inputs.trailing_eps {
        if history.is_empty() || !history.iter().any(|e| (*e - trailing).abs() < f64::EPSILON) {
            history.push(trailing);
        }
    }

    let base_eps = history.last().copied().or(inputs.forward_eps);

    let mut growth_rate = inputs.custom_growth.or(inputs.provider_growth);
    if growth_rate.is_none() {
        if let (Some(base), Some(forward)) = (base_eps, inputs.forward_eps) {
            if base != 0.0 {
                growth_rate = Some(forward / base - 1.0);
            }
        }
    }
    let growth_rate = growth_rate.unwrap_or(0.0);

    let points = match base_eps {
        Some(base) => (0..inputs.years)
            .map(|i| EpsPoint {
                year: inputs.start_year + i as i32,
                eps: base * (1.0 + growth_rate).powi(i as i32 + 1),
            })
            .collect(),
        None => Vec::new(),
    };

    EpsForecast {
        base_eps,
        growth_rate,
        shares_outstanding: inputs.shares_outstanding,
        points,
    }
}
