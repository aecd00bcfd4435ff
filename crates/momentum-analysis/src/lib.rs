//! Price momentum and IBD-style relative strength.
//!
//! Works on daily close series: roughly 13 months of history for the full
//! profile, with windows clamped when less is available.

use valuation_core::{MomentumMetrics, RsTrend, ValuationError};

/// Minimum sessions required for a momentum profile
pub const MIN_SESSIONS: usize = 60;

/// Trading-day windows for the trailing returns
const SESSIONS_3M: usize = 63;
const SESSIONS_6M: usize = 126;
const SESSIONS_9M: usize = 189;
const SESSIONS_12M: usize = 252;

/// Simple moving average; empty when the series is shorter than the window
pub fn sma(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Latest SMA value for a window, if the series is long enough
pub fn latest_sma(values: &[f64], window: usize) -> Option<f64> {
    sma(values, window).last().copied()
}

/// Percent return over the trailing `sessions` trading days, window clamped
/// to the available history
pub fn trailing_return(closes: &[f64], sessions: usize) -> Option<f64> {
    if closes.len() < 2 {
        return None;
    }
    let current = *closes.last()?;
    let span = sessions.min(closes.len() - 1);
    let past = closes[closes.len() - 1 - span];
    if past == 0.0 {
        return None;
    }
    Some((current - past) / past * 100.0)
}

/// Map the quarter-weighted composite onto the 0-99 RS rating scale.
///
/// Heuristic percentile bands: >=50% composite lands in the 90s, 20-50% in
/// the 70-80s, 0-20% in the 50-60s, -20-0% in the 30-40s, worse below.
pub fn rs_rating_from_composite(composite: f64) -> u8 {
    let rating = if composite >= 50.0 {
        (90 + ((composite - 50.0) / 10.0) as i32).min(99)
    } else if composite >= 20.0 {
        70 + ((composite - 20.0) / 1.5) as i32
    } else if composite >= 0.0 {
        50 + composite as i32
    } else if composite >= -20.0 {
        30 + (composite + 20.0) as i32
    } else {
        (30.0 + composite + 20.0).max(0.0) as i32
    };
    rating.clamp(0, 99) as u8
}

/// Label the stock-minus-benchmark 6M spread
pub fn rs_trend_from_spread(spread: f64) -> RsTrend {
    if spread > 20.0 {
        RsTrend::VeryStrong
    } else if spread > 10.0 {
        RsTrend::Strong
    } else if spread > -10.0 {
        RsTrend::Neutral
    } else if spread > -20.0 {
        RsTrend::Weak
    } else {
        RsTrend::VeryWeak
    }
}

/// Build the full momentum profile for a close series, optionally relative
/// to a benchmark index series.
pub fn momentum_profile(
    closes: &[f64],
    benchmark: Option<&[f64]>,
) -> Result<MomentumMetrics, ValuationError> {
    if closes.len() < MIN_SESSIONS {
        return Err(ValuationError::InsufficientData(format!(
            "momentum needs at least {} sessions, got {}",
            MIN_SESSIONS,
            closes.len()
        )));
    }

    let len = closes.len();
    let current = closes[len - 1];

    let span_3m = SESSIONS_3M.min(len - 1);
    let span_6m = SESSIONS_6M.min(len - 1);
    let span_9m = SESSIONS_9M.min(len - 1);
    let span_12m = SESSIONS_12M.min(len - 1);

    let price_3m_ago = closes[len - 1 - span_3m];
    let price_6m_ago = closes[len - 1 - span_6m];
    let price_12m_ago = closes[len - 1 - span_12m];
    let price_9m_ago = if span_9m < len - 1 {
        closes[len - 1 - span_9m]
    } else {
        price_12m_ago
    };

    let return_3m = (current - price_3m_ago) / price_3m_ago * 100.0;
    let return_6m = (current - price_6m_ago) / price_6m_ago * 100.0;
    let return_12m = (current - price_12m_ago) / price_12m_ago * 100.0;

    // Quarterly decomposition; quarters beyond the available history count
    // as flat rather than skewing the composite
    let q1 = return_3m;
    let q2 = if span_6m < len - 1 {
        (price_3m_ago - price_6m_ago) / price_6m_ago * 100.0
    } else {
        0.0
    };
    let q3 = if span_9m < len - 1 {
        (price_6m_ago - price_9m_ago) / price_9m_ago * 100.0
    } else {
        0.0
    };
    let q4 = if span_12m < len - 1 {
        (price_9m_ago - price_12m_ago) / price_12m_ago * 100.0
    } else {
        0.0
    };

    // IBD weighting: most recent quarter counts double
    let ibd_composite = 0.4 * q1 + 0.2 * q2 + 0.2 * q3 + 0.2 * q4;
    let rs_rating = rs_rating_from_composite(ibd_composite);

    let (relative_strength, rs_trend) = match benchmark {
        Some(bench) if bench.len() > span_6m => match trailing_return(bench, span_6m) {
            Some(bench_return_6m) => {
                let spread = return_6m - bench_return_6m;
                (Some(spread), rs_trend_from_spread(spread))
            }
            None => (None, RsTrend::Unavailable),
        },
        _ => (None, RsTrend::Unavailable),
    };

    tracing::debug!(
        return_3m,
        return_6m,
        ibd_composite,
        rs_rating,
        "momentum profile computed"
    );

    Ok(MomentumMetrics {
        return_3m,
        return_6m,
        return_12m,
        ibd_composite,
        rs_rating,
        relative_strength,
        rs_trend,
    })
}
