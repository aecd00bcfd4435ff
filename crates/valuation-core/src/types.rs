use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Company snapshot assembled from the data provider.
///
/// Every numeric field is optional: providers routinely omit fields for
/// foreign listings, pre-revenue companies, or tickers without analyst
/// coverage. Downstream calculators treat `None` as "skip this model".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,

    pub current_price: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub book_value: Option<f64>,
    pub price_to_book: Option<f64>,
    pub price_to_sales: Option<f64>,

    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ebitda: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_cash: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub shares_outstanding: Option<f64>,

    pub beta: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub profit_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub earnings_quarterly_growth: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,

    pub dividend_rate: Option<f64>,
    pub dividend_yield: Option<f64>,

    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,

    pub target_mean_price: Option<f64>,
    pub target_high_price: Option<f64>,
    pub target_low_price: Option<f64>,
    pub analyst_count: Option<i64>,
    pub recommendation_key: Option<String>,
}

/// Annual income-statement lines feeding the WACC estimate and the EPS
/// history base. Providers without statement access return the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialStatements {
    /// Latest annual interest expense (sign as reported)
    pub interest_expense: Option<f64>,
    pub tax_provision: Option<f64>,
    pub pretax_income: Option<f64>,
    /// Annual diluted EPS, oldest first
    pub eps_history: Vec<f64>,
}

/// One projected EPS data point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsPoint {
    pub year: i32,
    pub eps: f64,
}

/// Multi-year EPS projection used by the forecast-driven DCF and PEG models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpsForecast {
    pub base_eps: Option<f64>,
    pub growth_rate: f64,
    pub shares_outstanding: Option<f64>,
    pub points: Vec<EpsPoint>,
}

impl EpsForecast {
    /// EPS projected for the first forecast year, if any
    pub fn first_year_eps(&self) -> Option<f64> {
        self.points.first().map(|p| p.eps)
    }

    pub fn eps_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.eps).collect()
    }
}

/// Relative-strength trend vs the benchmark index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsTrend {
    VeryStrong,
    Strong,
    Neutral,
    Weak,
    VeryWeak,
    Unavailable,
}

impl RsTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsTrend::VeryStrong => "Very Strong",
            RsTrend::Strong => "Strong",
            RsTrend::Neutral => "Neutral",
            RsTrend::Weak => "Weak",
            RsTrend::VeryWeak => "Very Weak",
            RsTrend::Unavailable => "N/A",
        }
    }
}

/// Price momentum profile derived from ~13 months of daily closes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumMetrics {
    /// Trailing 3-month return, percent
    pub return_3m: f64,
    /// Trailing 6-month return, percent
    pub return_6m: f64,
    /// Trailing 12-month return, percent
    pub return_12m: f64,
    /// Quarter-weighted composite (40/20/20/20), percent
    pub ibd_composite: f64,
    /// IBD-style relative strength rating, 0-99
    pub rs_rating: u8,
    /// 6M return minus benchmark 6M return, percentage points
    pub relative_strength: Option<f64>,
    pub rs_trend: RsTrend,
}

/// Fair-value estimates from the independent valuation models.
/// Each model yields `None` when its inputs are missing or degenerate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub dcf_value: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub peg_value: Option<f64>,
    pub lynch_value: Option<f64>,
    pub mean_reversion_value: Option<f64>,
    pub graham_number: Option<f64>,
    pub ddm_value: Option<f64>,
    pub ev_ebitda: Option<f64>,
    pub eps_forecast: Option<EpsForecast>,
}

/// Point totals per scoring dimension
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Valuation attractiveness, 0-25
    pub valuation: u32,
    /// Financial health, 0-20
    pub financial_health: u32,
    /// Growth potential, 0-20
    pub growth: u32,
    /// Momentum and market sentiment, 0-20
    pub momentum: u32,
    /// Risk assessment (higher = lower risk), 0-15
    pub risk: u32,
}

/// Final call derived from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Watch,
    Avoid,
}

impl Recommendation {
    pub fn from_total(total: u32) -> Self {
        match total {
            t if t >= 90 => Recommendation::StrongBuy,
            t if t >= 75 => Recommendation::Buy,
            t if t >= 60 => Recommendation::Hold,
            t if t >= 40 => Recommendation::Watch,
            _ => Recommendation::Avoid,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Watch => "Watch",
            Recommendation::Avoid => "Avoid",
        }
    }

    /// Star count for the text rating (5 = strong buy, 1 = avoid)
    pub fn stars(&self) -> u8 {
        match self {
            Recommendation::StrongBuy => 5,
            Recommendation::Buy => 4,
            Recommendation::Hold => 3,
            Recommendation::Watch => 2,
            Recommendation::Avoid => 1,
        }
    }
}

/// Composite 0-100 score with per-dimension breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCard {
    pub total: u32,
    pub breakdown: ScoreBreakdown,
    pub recommendation: Recommendation,
    /// Dimensions that stand out positively
    pub insights: Vec<String>,
    /// Dimensions that warrant attention
    pub risk_factors: Vec<String>,
}

/// Analyst consensus targets pulled from the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalystTargets {
    pub target_mean: Option<f64>,
    pub target_high: Option<f64>,
    pub target_low: Option<f64>,
    pub analyst_count: Option<i64>,
    pub recommendation_key: Option<String>,
}

/// Full per-ticker analysis assembled by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub current_price: Option<f64>,
    /// WACC estimate used as the DCF discount rate, percent
    pub wacc_pct: f64,
    pub valuations: ValuationSummary,
    pub momentum: Option<MomentumMetrics>,
    pub score: ScoreCard,
    pub targets: AnalystTargets,
}

impl AnalysisReport {
    /// Upside of a fair-value estimate vs the current price, percent
    pub fn upside_pct(&self, fair_value: f64) -> Option<f64> {
        self.current_price
            .filter(|p| *p > 0.0)
            .map(|p| (fair_value - p) / p * 100.0)
    }
}
