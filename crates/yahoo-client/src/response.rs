//! Serde models for the Yahoo quote-summary and chart payloads.
//!
//! Numeric fields arrive as `{"raw": 1.23, "fmt": "1.23"}` objects; `raw`
//! is the only part consumed. Missing modules and fields deserialize to
//! `None` rather than failing the whole payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use valuation_core::{CompanyInfo, FinancialStatements, PriceBar};

/// Formatted numeric wrapper, e.g. `{"raw": 211.45, "fmt": "211.45"}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawNum {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(field: &Option<RawNum>) -> Option<f64> {
    field.as_ref().and_then(|v| v.raw)
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default, rename = "summaryProfile")]
    summary_profile: Option<SummaryProfileModule>,
    #[serde(default, rename = "summaryDetail")]
    summary_detail: Option<SummaryDetailModule>,
    #[serde(default, rename = "financialData")]
    financial_data: Option<FinancialDataModule>,
    #[serde(default, rename = "defaultKeyStatistics")]
    key_statistics: Option<KeyStatisticsModule>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceModule {
    #[serde(default, rename = "shortName")]
    short_name: Option<String>,
    #[serde(default, rename = "longName")]
    long_name: Option<String>,
    #[serde(default, rename = "regularMarketPrice")]
    regular_market_price: Option<RawNum>,
    #[serde(default, rename = "marketCap")]
    market_cap: Option<RawNum>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryProfileModule {
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetailModule {
    #[serde(default, rename = "trailingPE")]
    trailing_pe: Option<RawNum>,
    #[serde(default, rename = "forwardPE")]
    forward_pe: Option<RawNum>,
    #[serde(default)]
    beta: Option<RawNum>,
    #[serde(default, rename = "dividendRate")]
    dividend_rate: Option<RawNum>,
    #[serde(default, rename = "dividendYield")]
    dividend_yield: Option<RawNum>,
    #[serde(default, rename = "fiftyTwoWeekHigh")]
    fifty_two_week_high: Option<RawNum>,
    #[serde(default, rename = "fiftyTwoWeekLow")]
    fifty_two_week_low: Option<RawNum>,
    #[serde(default, rename = "priceToSalesTrailing12Months")]
    price_to_sales: Option<RawNum>,
}

#[derive(Debug, Default, Deserialize)]
struct FinancialDataModule {
    #[serde(default, rename = "currentPrice")]
    current_price: Option<RawNum>,
    #[serde(default, rename = "totalDebt")]
    total_debt: Option<RawNum>,
    #[serde(default, rename = "totalCash")]
    total_cash: Option<RawNum>,
    #[serde(default)]
    ebitda: Option<RawNum>,
    #[serde(default, rename = "freeCashflow")]
    free_cash_flow: Option<RawNum>,
    #[serde(default, rename = "returnOnEquity")]
    return_on_equity: Option<RawNum>,
    #[serde(default, rename = "profitMargins")]
    profit_margins: Option<RawNum>,
    #[serde(default, rename = "revenueGrowth")]
    revenue_growth: Option<RawNum>,
    #[serde(default, rename = "earningsGrowth")]
    earnings_growth: Option<RawNum>,
    #[serde(default, rename = "debtToEquity")]
    debt_to_equity: Option<RawNum>,
    #[serde(default, rename = "currentRatio")]
    current_ratio: Option<RawNum>,
    #[serde(default, rename = "targetMeanPrice")]
    target_mean_price: Option<RawNum>,
    #[serde(default, rename = "targetHighPrice")]
    target_high_price: Option<RawNum>,
    #[serde(default, rename = "targetLowPrice")]
    target_low_price: Option<RawNum>,
    #[serde(default, rename = "numberOfAnalystOpinions")]
    analyst_count: Option<RawNum>,
    #[serde(default, rename = "recommendationKey")]
    recommendation_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyStatisticsModule {
    #[serde(default, rename = "trailingEps")]
    trailing_eps: Option<RawNum>,
    #[serde(default, rename = "forwardEps")]
    forward_eps: Option<RawNum>,
    #[serde(default, rename = "pegRatio")]
    peg_ratio: Option<RawNum>,
    #[serde(default, rename = "enterpriseValue")]
    enterprise_value: Option<RawNum>,
    #[serde(default, rename = "sharesOutstanding")]
    shares_outstanding: Option<RawNum>,
    #[serde(default, rename = "bookValue")]
    book_value: Option<RawNum>,
    #[serde(default, rename = "priceToBook")]
    price_to_book: Option<RawNum>,
    #[serde(default, rename = "earningsQuarterlyGrowth")]
    earnings_quarterly_growth: Option<RawNum>,
}

impl QuoteSummaryResponse {
    pub(crate) fn into_company_info(self, symbol: &str) -> Option<CompanyInfo> {
        let result = self.quote_summary.result?.into_iter().next()?;

        let price = result.price.unwrap_or_default();
        let profile = result.summary_profile.unwrap_or_default();
        let detail = result.summary_detail.unwrap_or_default();
        let financial = result.financial_data.unwrap_or_default();
        let stats = result.key_statistics.unwrap_or_default();

        Some(CompanyInfo {
            symbol: symbol.to_string(),
            name: price.short_name.or(price.long_name),
            sector: profile.sector,
            industry: profile.industry,

            current_price: raw(&financial.current_price).or(raw(&price.regular_market_price)),
            trailing_eps: raw(&stats.trailing_eps),
            forward_eps: raw(&stats.forward_eps),
            trailing_pe: raw(&detail.trailing_pe),
            forward_pe: raw(&detail.forward_pe),
            peg_ratio: raw(&stats.peg_ratio),
            book_value: raw(&stats.book_value),
            price_to_book: raw(&stats.price_to_book),
            price_to_sales: raw(&detail.price_to_sales),

            market_cap: raw(&price.market_cap),
            enterprise_value: raw(&stats.enterprise_value),
            ebitda: raw(&financial.ebitda),
            total_debt: raw(&financial.total_debt),
            total_cash: raw(&financial.total_cash),
            free_cash_flow: raw(&financial.free_cash_flow),
            shares_outstanding: raw(&stats.shares_outstanding),

            beta: raw(&detail.beta),
            return_on_equity: raw(&financial.return_on_equity),
            profit_margin: raw(&financial.profit_margins),
            revenue_growth: raw(&financial.revenue_growth),
            earnings_growth: raw(&financial.earnings_growth),
            earnings_quarterly_growth: raw(&stats.earnings_quarterly_growth),
            debt_to_equity: raw(&financial.debt_to_equity),
            current_ratio: raw(&financial.current_ratio),

            dividend_rate: raw(&detail.dividend_rate),
            dividend_yield: raw(&detail.dividend_yield),

            fifty_two_week_high: raw(&detail.fifty_two_week_high),
            fifty_two_week_low: raw(&detail.fifty_two_week_low),

            target_mean_price: raw(&financial.target_mean_price),
            target_high_price: raw(&financial.target_high_price),
            target_low_price: raw(&financial.target_low_price),
            analyst_count: raw(&financial.analyst_count).map(|n| n as i64),
            recommendation_key: financial.recommendation_key,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Flatten into bars, skipping sessions with a null close (halts,
    /// partial sessions).
    pub(crate) fn into_bars(self) -> Vec<PriceBar> {
        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Vec::new();
        };
        let Some(quote) = result.indicators.quote.into_iter().next() else {
            return Vec::new();
        };

        result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let close = *quote.close.get(i)?;
                let close = close?;
                let timestamp: DateTime<Utc> = DateTime::from_timestamp(ts, 0)?;
                Some(PriceBar {
                    timestamp,
                    open: quote.open.get(i).copied().flatten().unwrap_or(close),
                    high: quote.high.get(i).copied().flatten().unwrap_or(close),
                    low: quote.low.get(i).copied().flatten().unwrap_or(close),
                    close,
                    volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeseriesResponse {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    #[serde(default)]
    result: Option<Vec<TimeseriesResult>>,
}

/// One result per requested line item; the array named after the item type
/// holds one point per fiscal year, null where the year is missing.
#[derive(Debug, Default, Deserialize)]
struct TimeseriesResult {
    #[serde(default, rename = "annualInterestExpense")]
    annual_interest_expense: Option<Vec<Option<TimeseriesPoint>>>,
    #[serde(default, rename = "annualPretaxIncome")]
    annual_pretax_income: Option<Vec<Option<TimeseriesPoint>>>,
    #[serde(default, rename = "annualTaxProvision")]
    annual_tax_provision: Option<Vec<Option<TimeseriesPoint>>>,
    #[serde(default, rename = "annualDilutedEPS")]
    annual_diluted_eps: Option<Vec<Option<TimeseriesPoint>>>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesPoint {
    #[serde(default, rename = "asOfDate")]
    as_of_date: Option<String>,
    #[serde(default, rename = "reportedValue")]
    reported_value: Option<RawNum>,
}

fn dated_values(points: &Option<Vec<Option<TimeseriesPoint>>>) -> Vec<(String, f64)> {
    let Some(points) = points else {
        return Vec::new();
    };
    let mut values: Vec<(String, f64)> = points
        .iter()
        .flatten()
        .filter_map(|p| {
            let value = p.reported_value.as_ref()?.raw?;
            Some((p.as_of_date.clone().unwrap_or_default(), value))
        })
        .collect();
    // ISO dates sort lexicographically, oldest first
    values.sort_by(|a, b| a.0.cmp(&b.0));
    values
}

fn latest_value(points: &Option<Vec<Option<TimeseriesPoint>>>) -> Option<f64> {
    dated_values(points).last().map(|(_, v)| *v)
}

impl TimeseriesResponse {
    pub(crate) fn into_statements(self) -> FinancialStatements {
        let mut statements = FinancialStatements::default();
        let Some(results) = self.timeseries.result else {
            return statements;
        };

        for result in &results {
            if let Some(v) = latest_value(&result.annual_interest_expense) {
                statements.interest_expense = Some(v);
            }
            if let Some(v) = latest_value(&result.annual_pretax_income) {
                statements.pretax_income = Some(v);
            }
            if let Some(v) = latest_value(&result.annual_tax_provision) {
                statements.tax_provision = Some(v);
            }
            let eps = dated_values(&result.annual_diluted_eps);
            if !eps.is_empty() {
                statements.eps_history = eps.into_iter().map(|(_, v)| v).collect();
            }
        }

        statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quote_summary_payload() {
        let json = r#"{
            "quoteSummary": {
                "result": [{
                    "price": {
                        "shortName": "Apple Inc.",
                        "regularMarketPrice": {"raw": 211.45, "fmt": "211.45"},
                        "marketCap": {"raw": 3.2e12, "fmt": "3.2T"}
                    },
                    "summaryProfile": {"sector": "Technology", "industry": "Consumer Electronics"},
                    "summaryDetail": {
                        "trailingPE": {"raw": 32.1},
                        "forwardPE": {"raw": 28.4},
                        "beta": {"raw": 1.25},
                        "dividendRate": {"raw": 1.0},
                        "dividendYield": {"raw": 0.0047},
                        "fiftyTwoWeekHigh": {"raw": 237.23},
                        "fiftyTwoWeekLow": {"raw": 164.08}
                    },
                    "financialData": {
                        "currentPrice": {"raw": 211.5},
                        "totalDebt": {"raw": 1.0e11},
                        "freeCashflow": {"raw": 9.8e10},
                        "returnOnEquity": {"raw": 1.47},
                        "profitMargins": {"raw": 0.26},
                        "revenueGrowth": {"raw": 0.05},
                        "earningsGrowth": {"raw": 0.11},
                        "targetMeanPrice": {"raw": 235.0},
                        "numberOfAnalystOpinions": {"raw": 39},
                        "recommendationKey": "buy"
                    },
                    "defaultKeyStatistics": {
                        "trailingEps": {"raw": 6.59},
                        "forwardEps": {"raw": 7.33},
                        "enterpriseValue": {"raw": 3.28e12},
                        "sharesOutstanding": {"raw": 1.5e10},
                        "bookValue": {"raw": 4.44}
                    }
                }],
                "error": null
            }
        }"#;

        let parsed: QuoteSummaryResponse = serde_json::from_str(json).unwrap();
        let info = parsed.into_company_info("AAPL").unwrap();

        assert_eq!(info.symbol, "AAPL");
        assert_eq!(info.name.as_deref(), Some("Apple Inc."));
        assert_eq!(info.sector.as_deref(), Some("Technology"));
        // financialData.currentPrice wins over price.regularMarketPrice
        assert_eq!(info.current_price, Some(211.5));
        assert_eq!(info.trailing_eps, Some(6.59));
        assert_eq!(info.analyst_count, Some(39));
        assert_eq!(info.recommendation_key.as_deref(), Some("buy"));
        assert_eq!(info.ebitda, None);
    }

    #[test]
    fn missing_modules_do_not_fail() {
        let json = r#"{
            "quoteSummary": {
                "result": [{"price": {"shortName": "Bare Co."}}],
                "error": null
            }
        }"#;

        let parsed: QuoteSummaryResponse = serde_json::from_str(json).unwrap();
        let info = parsed.into_company_info("BARE").unwrap();
        assert_eq!(info.name.as_deref(), Some("Bare Co."));
        assert!(info.current_price.is_none());
    }

    #[test]
    fn empty_result_is_none() {
        let json = r#"{"quoteSummary": {"result": null, "error": {"code": "Not Found"}}}"#;
        let parsed: QuoteSummaryResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.into_company_info("NOPE").is_none());
    }

    #[test]
    fn parses_chart_and_skips_null_closes() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1700000000, 1700086400, 1700172800],
                    "indicators": {
                        "quote": [{
                            "open": [99.0, null, 101.0],
                            "high": [101.0, null, 103.0],
                            "low": [98.0, null, 100.0],
                            "close": [100.0, null, 102.0],
                            "volume": [1000000.0, null, 1200000.0]
                        }]
                    }
                }]
            }
        }"#;

        let parsed: ChartResponse = serde_json::from_str(json).unwrap();
        let bars = parsed.into_bars();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 100.0);
        assert_eq!(bars[1].close, 102.0);
        assert_eq!(bars[1].volume, 1200000.0);
    }

    #[test]
    fn empty_chart_is_empty() {
        let json = r#"{"chart": {"result": null}}"#;
        let parsed: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.into_bars().is_empty());
    }

    #[test]
    fn parses_fundamentals_timeseries() {
        let json = r#"{
            "timeseries": {
                "result": [
                    {
                        "meta": {"symbol": ["AAPL"], "type": ["annualInterestExpense"]},
                        "timestamp": [1632960000, 1664496000],
                        "annualInterestExpense": [
                            {"asOfDate": "2021-09-30", "reportedValue": {"raw": 2.645e9, "fmt": "2.65B"}},
                            {"asOfDate": "2022-09-30", "reportedValue": {"raw": 2.931e9, "fmt": "2.93B"}}
                        ]
                    },
                    {
                        "meta": {"symbol": ["AAPL"], "type": ["annualPretaxIncome"]},
                        "annualPretaxIncome": [
                            {"asOfDate": "2022-09-30", "reportedValue": {"raw": 1.191e11}}
                        ]
                    },
                    {
                        "meta": {"symbol": ["AAPL"], "type": ["annualTaxProvision"]},
                        "annualTaxProvision": [
                            {"asOfDate": "2022-09-30", "reportedValue": {"raw": 1.93e10}}
                        ]
                    },
                    {
                        "meta": {"symbol": ["AAPL"], "type": ["annualDilutedEPS"]},
                        "annualDilutedEPS": [
                            {"asOfDate": "2020-09-30", "reportedValue": {"raw": 3.28}},
                            null,
                            {"asOfDate": "2022-09-30", "reportedValue": {"raw": 6.11}},
                            {"asOfDate": "2021-09-30", "reportedValue": {"raw": 5.61}}
                        ]
                    }
                ],
                "error": null
            }
        }"#;

        let parsed: TimeseriesResponse = serde_json::from_str(json).unwrap();
        let statements = parsed.into_statements();

        // Latest fiscal year wins for the single-value lines
        assert_eq!(statements.interest_expense, Some(2.931e9));
        assert_eq!(statements.pretax_income, Some(1.191e11));
        assert_eq!(statements.tax_provision, Some(1.93e10));
        // EPS history ordered oldest first, nulls dropped
        assert_eq!(statements.eps_history, vec![3.28, 5.61, 6.11]);
    }

    #[test]
    fn empty_timeseries_is_default() {
        let json = r#"{"timeseries": {"result": null, "error": {"code": "Not Found"}}}"#;
        let parsed: TimeseriesResponse = serde_json::from_str(json).unwrap();
        let statements = parsed.into_statements();
        assert!(statements.interest_expense.is_none());
        assert!(statements.eps_history.is_empty());
    }
}
