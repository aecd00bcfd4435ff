//! Yahoo Finance HTTP client: quote summary, daily chart history, annual
//! income-statement lines, and the 10-year treasury yield used as the
//! risk-free rate.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use valuation_core::{
    CompanyInfo, FinancialStatements, MarketDataProvider, PriceBar, ValuationError,
};

mod response;

use response::{ChartResponse, QuoteSummaryResponse, TimeseriesResponse};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const QUOTE_MODULES: &str = "price,summaryProfile,summaryDetail,financialData,defaultKeyStatistics";
const FUNDAMENTALS_TYPES: &str =
    "annualInterestExpense,annualPretaxIncome,annualTaxProvision,annualDilutedEPS";

/// Wait after a 429 when the response carries no usable Retry-After
const DEFAULT_RETRY_WAIT_SECS: u64 = 15;

/// Risk-free fallback when the ^TNX quote is unavailable
pub const RISK_FREE_FALLBACK: f64 = 0.04;

/// Sliding-window rate limiter: at most `max_requests` per `window`.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let wait_until = ts.front().unwrap().checked_add(self.window).unwrap();
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Yahoo API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl YahooClient {
    pub fn new() -> Self {
        // Unofficial endpoints throttle aggressively; stay conservative.
        let rate_limit: usize = std::env::var("YAHOO_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and bounded 429 retry.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ValuationError> {
        let request = builder
            .build()
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| ValuationError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| ValuationError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = retry_after_secs(response.headers());
            tracing::warn!(
                "Yahoo 429 rate limited, waiting {}s before retry {}/3",
                wait_secs,
                attempt + 1
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(ValuationError::ApiError(
            "Rate limited by Yahoo after 3 retries".to_string(),
        ))
    }

    /// Company snapshot from the quote-summary endpoint
    pub async fn quote_summary(&self, symbol: &str) -> Result<CompanyInfo, ValuationError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", BASE_URL, symbol);

        let response = self
            .send_request(self.client.get(&url).query(&[("modules", QUOTE_MODULES)]))
            .await?;

        if !response.status().is_success() {
            return Err(ValuationError::ApiError(format!(
                "Quote summary HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: QuoteSummaryResponse = response
            .json()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        body.into_company_info(symbol).ok_or_else(|| {
            ValuationError::InsufficientData(format!("No quote summary data for {}", symbol))
        })
    }

    /// Daily bars from the chart endpoint
    pub async fn chart(&self, symbol: &str, range: &str) -> Result<Vec<PriceBar>, ValuationError> {
        let url = format!("{}/v8/finance/chart/{}", BASE_URL, symbol);

        let response = self
            .send_request(
                self.client
                    .get(&url)
                    .query(&[("interval", "1d"), ("range", range)]),
            )
            .await?;

        if !response.status().is_success() {
            return Err(ValuationError::ApiError(format!(
                "Chart HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        let bars = body.into_bars();
        if bars.is_empty() {
            return Err(ValuationError::InsufficientData(format!(
                "No price history for {}",
                symbol
            )));
        }
        Ok(bars)
    }

    /// Annual income-statement lines from the fundamentals timeseries,
    /// covering roughly the past five fiscal years. Statement data is
    /// supplementary, so an unavailable endpoint yields the empty default
    /// instead of an error.
    pub async fn fundamentals(&self, symbol: &str) -> Result<FinancialStatements, ValuationError> {
        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            BASE_URL, symbol
        );
        let period2 = Utc::now().timestamp();
        let period1 = period2 - 60 * 60 * 24 * 365 * 5;

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("type", FUNDAMENTALS_TYPES.to_string()),
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
            ]))
            .await?;

        if !response.status().is_success() {
            tracing::warn!(
                "Fundamentals timeseries HTTP {} for {}, proceeding without statements",
                response.status(),
                symbol
            );
            return Ok(FinancialStatements::default());
        }

        let body: TimeseriesResponse = response
            .json()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        Ok(body.into_statements())
    }

    /// Latest 10Y treasury yield (^TNX) as a decimal, with a 4% fallback
    /// when the quote is unavailable.
    pub async fn treasury_yield(&self) -> f64 {
        match self.chart("%5ETNX", "5d").await {
            Ok(bars) => match bars.last() {
                Some(bar) => bar.close / 100.0,
                None => RISK_FREE_FALLBACK,
            },
            Err(e) => {
                tracing::warn!("^TNX quote unavailable ({}), using {}% fallback", e, RISK_FREE_FALLBACK * 100.0);
                RISK_FREE_FALLBACK
            }
        }
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds to wait before retrying a 429, honoring the Retry-After header
/// when it carries a sane delay
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|secs| secs.clamp(1, 120))
        .unwrap_or(DEFAULT_RETRY_WAIT_SECS)
}

/// Pick the chart range covering `days` of history
fn range_for_days(days: i64) -> &'static str {
    match days {
        d if d <= 5 => "5d",
        d if d <= 31 => "1mo",
        d if d <= 93 => "3mo",
        d if d <= 186 => "6mo",
        d if d <= 366 => "1y",
        d if d <= 731 => "2y",
        _ => "5y",
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, ValuationError> {
        self.quote_summary(symbol).await
    }

    async fn daily_history(
        &self,
        symbol: &str,
        days: i64,
    ) -> Result<Vec<PriceBar>, ValuationError> {
        self.chart(symbol, range_for_days(days)).await
    }

    async fn financial_statements(
        &self,
        symbol: &str,
    ) -> Result<FinancialStatements, ValuationError> {
        self.fundamentals(symbol).await
    }

    async fn risk_free_rate(&self) -> Result<f64, ValuationError> {
        Ok(self.treasury_yield().await)
    }
}
