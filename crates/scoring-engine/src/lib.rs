//! Composite 0-100 stock score.
//!
//! Five dimensions with fixed point budgets: valuation 25, financial
//! health 20, growth 20, momentum 20, risk 15. Each dimension is a
//! threshold table over provider fields and model outputs; missing inputs
//! simply contribute no points.

use valuation_core::{
    CompanyInfo, MomentumMetrics, Recommendation, ScoreBreakdown, ScoreCard, ValuationSummary,
};

/// Valuation attractiveness, 0-25
pub fn valuation_score(
    current_price: Option<f64>,
    dcf_value: Option<f64>,
    peg_ratio: Option<f64>,
    ev_ebitda: Option<f64>,
) -> u32 {
    let mut score = 0;

    // DCF discount vs price, up to 10
    if let (Some(dcf), Some(price)) = (dcf_value, current_price.filter(|p| *p > 0.0)) {
        let discount = (dcf - price) / price * 100.0;
        score += if discount > 30.0 {
            10
        } else if discount > 15.0 {
            8
        } else if discount > 0.0 {
            6
        } else if discount > -15.0 {
            4
        } else if discount > -30.0 {
            2
        } else {
            0
        };
    }

    // PEG, up to 8
    if let Some(peg) = peg_ratio {
        score += if peg < 0.5 {
            8
        } else if peg < 1.0 {
            6
        } else if peg < 1.5 {
            4
        } else if peg < 2.0 {
            2
        } else {
            0
        };
    }

    // EV/EBITDA, up to 7
    if let Some(multiple) = ev_ebitda {
        score += if multiple < 8.0 {
            7
        } else if multiple < 12.0 {
            5
        } else if multiple < 15.0 {
            3
        } else if multiple < 20.0 {
            1
        } else {
            0
        };
    }

    score.min(25)
}

/// Financial health, 0-20
pub fn financial_health_score(info: &CompanyInfo) -> u32 {
    let mut score = 0;

    let market_cap = info.market_cap.unwrap_or(1.0);
    if market_cap > 0.0 {
        // Leverage vs market value of equity
        let leverage = info.total_debt.unwrap_or(0.0) / market_cap;
        score += if leverage < 0.3 {
            6
        } else if leverage < 0.5 {
            5
        } else if leverage < 1.0 {
            3
        } else if leverage < 2.0 {
            1
        } else {
            0
        };
    }

    if let Some(fcf) = info.free_cash_flow {
        if fcf > 0.0 {
            score += 6;
            // FCF yield above 5% earns a bonus
            if market_cap > 0.0 && fcf / market_cap > 0.05 {
                score += 2;
            }
        }
    }

    if let Some(roe) = info.return_on_equity {
        score += if roe > 0.20 {
            4
        } else if roe > 0.15 {
            3
        } else if roe > 0.10 {
            2
        } else if roe > 0.0 {
            1
        } else {
            0
        };
    }

    if let Some(margin) = info.profit_margin {
        score += if margin > 0.20 {
            4
        } else if margin > 0.15 {
            3
        } else if margin > 0.10 {
            2
        } else if margin > 0.0 {
            1
        } else {
            0
        };
    }

    score.min(20)
}

/// Growth potential, 0-20
pub fn growth_score(info: &CompanyInfo) -> u32 {
    let mut score = 0;

    if let Some(growth) = info.revenue_growth {
        score += if growth > 0.30 {
            8
        } else if growth > 0.20 {
            6
        } else if growth > 0.10 {
            4
        } else if growth > 0.0 {
            2
        } else {
            0
        };
    }

    if let Some(growth) = info.earnings_growth {
        score += if growth > 0.30 {
            8
        } else if growth > 0.20 {
            6
        } else if growth > 0.10 {
            4
        } else if growth > 0.0 {
            2
        } else {
            0
        };
    }

    if let Some(growth) = info.earnings_quarterly_growth {
        score += if growth > 0.25 {
            4
        } else if growth > 0.15 {
            3
        } else if growth > 0.05 {
            2
        } else if growth > 0.0 {
            1
        } else {
            0
        };
    }

    score.min(20)
}

/// Momentum and market sentiment, 0-20
pub fn momentum_score(momentum: Option<&MomentumMetrics>) -> u32 {
    let Some(m) = momentum else {
        return 0;
    };
    let mut score = 0;

    score += match m.rs_rating {
        r if r >= 90 => 8,
        r if r >= 80 => 7,
        r if r >= 70 => 5,
        r if r >= 60 => 3,
        r if r >= 50 => 1,
        _ => 0,
    };

    score += if m.return_6m > 30.0 {
        6
    } else if m.return_6m > 15.0 {
        5
    } else if m.return_6m > 5.0 {
        3
    } else if m.return_6m > 0.0 {
        2
    } else if m.return_6m > -10.0 {
        1
    } else {
        0
    };

    score += if m.return_3m > 20.0 {
        6
    } else if m.return_3m > 10.0 {
        5
    } else if m.return_3m > 5.0 {
        3
    } else if m.return_3m > 0.0 {
        2
    } else if m.return_3m > -5.0 {
        1
    } else {
        0
    };

    score.min(20)
}

/// Risk assessment, 0-15 (higher score = lower risk).
/// Starts at full points and deducts for volatility, extreme 52-week range
/// position, and bearish analyst consensus.
pub fn risk_score(info: &CompanyInfo, current_price: Option<f64>) -> u32 {
    let mut score: i32 = 15;

    if let Some(beta) = info.beta {
        if beta > 2.0 {
            score -= 5;
        } else if beta > 1.5 {
            score -= 3;
        } else if beta > 1.2 {
            score -= 1;
        }
    }

    if let (Some(high), Some(low), Some(price)) = (
        info.fifty_two_week_high,
        info.fifty_two_week_low,
        current_price,
    ) {
        if high > low {
            let position = (price - low) / (high - low);
            if position > 0.95 {
                score -= 3;
            } else if position < 0.20 {
                score -= 2;
            }
        }
    }

    if let Some(key) = info.recommendation_key.as_deref() {
        match key {
            "strong_sell" | "sell" => score -= 5,
            "hold" => score -= 2,
            _ => {}
        }
    }

    score.clamp(0, 15) as u32
}

/// Run every dimension and assemble the scorecard.
pub fn score(
    info: &CompanyInfo,
    current_price: Option<f64>,
    valuations: &ValuationSummary,
    momentum: Option<&MomentumMetrics>,
) -> ScoreCard {
    let breakdown = ScoreBreakdown {
        valuation: valuation_score(
            current_price,
            valuations.dcf_value,
            valuations.peg_ratio,
            valuations.ev_ebitda,
        ),
        financial_health: financial_health_score(info),
        growth: growth_score(info),
        momentum: momentum_score(momentum),
        risk: risk_score(info, current_price),
    };

    let total = breakdown.valuation
        + breakdown.financial_health
        + breakdown.growth
        + breakdown.momentum
        + breakdown.risk;
    let recommendation = Recommendation::from_total(total);

    let mut insights = Vec::new();
    if breakdown.valuation >= 20 {
        insights.push("Attractive valuation".to_string());
    }
    if breakdown.financial_health >= 16 {
        insights.push("Healthy financials".to_string());
    }
    if breakdown.growth >= 16 {
        insights.push("High growth potential".to_string());
    }
    if breakdown.momentum >= 16 {
        insights.push("Strong price momentum".to_string());
    }
    if breakdown.risk >= 12 {
        insights.push("Risk under control".to_string());
    }

    let mut risk_factors = Vec::new();
    if breakdown.valuation < 10 {
        risk_factors.push("Valuation looks stretched".to_string());
    }
    if breakdown.financial_health < 10 {
        risk_factors.push("Financial health needs attention".to_string());
    }
    if breakdown.growth < 8 {
        risk_factors.push("Limited growth".to_string());
    }
    if breakdown.momentum < 8 {
        risk_factors.push("Weak price momentum".to_string());
    }
    if breakdown.risk < 8 {
        risk_factors.push("Elevated volatility".to_string());
    }
    if risk_factors.is_empty() {
        risk_factors.push("No major risks".to_string());
    }

    tracing::debug!(
        symbol = %info.symbol,
        total,
        valuation = breakdown.valuation,
        financial = breakdown.financial_health,
        growth = breakdown.growth,
        momentum = breakdown.momentum,
        risk = breakdown.risk,
        "composite score computed"
    );

    ScoreCard {
        total,
        breakdown,
        recommendation,
        insights,
        risk_factors,
    }
}
