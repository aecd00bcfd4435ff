//! Analysis orchestrator: fetches market data through a provider, runs the
//! valuation models, momentum profile, and scoring, and assembles the
//! per-ticker report. Fetches are cached with a 1-hour TTL so repeated
//! lookups in a session do not hammer the provider.

use chrono::{DateTime, Datelike, Utc};
use dashmap::DashMap;
use finnhub_client::{FinnhubClient, NewsItem, RecommendationTrend};
use peer_comparison::{builtin_peers, compare, PeerComparison, PeerMetrics};
use valuation_core::{
    AnalysisReport, AnalystTargets, CompanyInfo, FinancialStatements, MarketDataProvider,
    PriceBar, ValuationError,
};
use valuation_models::{
    estimate_wacc, forecast_eps, run_all, ForecastInputs, ModelAssumptions, WaccInputs,
};
use watchlist_store::{WatchlistEntry, WatchlistStore};

const CACHE_TTL_SECS: i64 = 3600; // 1 hour
const HISTORY_DAYS: i64 = 730;
const BENCHMARK_SYMBOL: &str = "SPY";
const MAX_PEERS: usize = 10;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn fresh(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_fresh(&self) -> bool {
        (Utc::now() - self.cached_at).num_seconds() < CACHE_TTL_SECS
    }
}

/// Per-run knobs on top of the model assumptions.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub assumptions: ModelAssumptions,
    /// Earnings-growth override for the EPS forecast, decimal
    pub custom_growth: Option<f64>,
    /// Use this discount rate (percent) instead of the estimated WACC
    pub wacc_override_pct: Option<f64>,
}

pub struct ValuationEngine<P: MarketDataProvider> {
    provider: P,
    finnhub: FinnhubClient,
    /// Cache company snapshots per symbol (1-hour TTL)
    info_cache: DashMap<String, CacheEntry<CompanyInfo>>,
    /// Cache daily bars per symbol (1-hour TTL)
    history_cache: DashMap<String, CacheEntry<Vec<PriceBar>>>,
    /// Cache annual statement lines per symbol (1-hour TTL)
    statements_cache: DashMap<String, CacheEntry<FinancialStatements>>,
    /// Cached risk-free rate (1-hour TTL)
    rate_cache: DashMap<(), CacheEntry<f64>>,
}

impl<P: MarketDataProvider> ValuationEngine<P> {
    pub fn new(provider: P, finnhub: FinnhubClient) -> Self {
        Self {
            provider,
            finnhub,
            info_cache: DashMap::new(),
            history_cache: DashMap::new(),
            statements_cache: DashMap::new(),
            rate_cache: DashMap::new(),
        }
    }

    async fn get_info(&self, symbol: &str) -> Result<CompanyInfo, ValuationError> {
        if let Some(entry) = self.info_cache.get(symbol) {
            if entry.is_fresh() {
                return Ok(entry.data.clone());
            }
        }

        let info = self.provider.company_info(symbol).await?;
        self.info_cache
            .insert(symbol.to_string(), CacheEntry::fresh(info.clone()));
        Ok(info)
    }

    async fn get_history(&self, symbol: &str) -> Result<Vec<PriceBar>, ValuationError> {
        if let Some(entry) = self.history_cache.get(symbol) {
            if entry.is_fresh() {
                return Ok(entry.data.clone());
            }
        }

        let bars = self.provider.daily_history(symbol, HISTORY_DAYS).await?;
        self.history_cache
            .insert(symbol.to_string(), CacheEntry::fresh(bars.clone()));
        Ok(bars)
    }

    async fn get_statements(&self, symbol: &str) -> Result<FinancialStatements, ValuationError> {
        if let Some(entry) = self.statements_cache.get(symbol) {
            if entry.is_fresh() {
                return Ok(entry.data.clone());
            }
        }

        let statements = self.provider.financial_statements(symbol).await?;
        self.statements_cache
            .insert(symbol.to_string(), CacheEntry::fresh(statements.clone()));
        Ok(statements)
    }

    async fn get_risk_free_rate(&self) -> Result<f64, ValuationError> {
        if let Some(entry) = self.rate_cache.get(&()) {
            if entry.is_fresh() {
                return Ok(entry.data);
            }
        }

        let rate = self.provider.risk_free_rate().await?;
        self.rate_cache.insert((), CacheEntry::fresh(rate));
        Ok(rate)
    }

    /// Run the full analysis pipeline for one ticker.
    pub async fn analyze(
        &self,
        symbol: &str,
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport, ValuationError> {
        let symbol = symbol.to_uppercase();
        tracing::info!("Analyzing {}", symbol);

        let (info_result, history_result, benchmark_result, statements_result, rate_result) =
            tokio::join!(
                self.get_info(&symbol),
                self.get_history(&symbol),
                self.get_history(BENCHMARK_SYMBOL),
                self.get_statements(&symbol),
                self.get_risk_free_rate(),
            );

        let info = info_result?;

        // Statement lines refine the WACC and EPS base; losing them only
        // means falling back to the conventional estimates
        let statements = match statements_result {
            Ok(statements) => statements,
            Err(e) => {
                tracing::warn!("No statement data for {}: {}", symbol, e);
                FinancialStatements::default()
            }
        };

        // Price preference: provider quote, then last session close
        let last_close = history_result
            .as_ref()
            .ok()
            .and_then(|bars| bars.last())
            .map(|bar| bar.close);
        let current_price = info.current_price.or(last_close);
        if current_price.is_none() {
            tracing::warn!("No current price available for {}", symbol);
        }

        let risk_free_rate = rate_result.ok();
        let wacc_pct = match options.wacc_override_pct {
            Some(pct) => pct,
            None => estimate_wacc(&WaccInputs {
                risk_free_rate,
                beta: info.beta,
                interest_expense: statements.interest_expense,
                total_debt: info.total_debt,
                tax_provision: statements.tax_provision,
                pretax_income: statements.pretax_income,
                market_cap: info.market_cap,
            }),
        };

        let assumptions = &options.assumptions;
        let forecast = forecast_eps(&ForecastInputs {
            eps_history: &statements.eps_history,
            trailing_eps: info.trailing_eps,
            forward_eps: info.forward_eps,
            provider_growth: info.earnings_growth,
            custom_growth: options.custom_growth,
            shares_outstanding: info.shares_outstanding,
            start_year: Utc::now().year() + 1,
            years: assumptions.forecast_years,
        });

        // FCF earned per dollar of net income, used to convert forecast
        // EPS into cash flow per share
        let eps_to_fcf_ratio = match (info.free_cash_flow, info.trailing_eps, info.shares_outstanding) {
            (Some(fcf), Some(eps), Some(shares)) if eps > 0.0 && shares > 0.0 && fcf > 0.0 => {
                Some(fcf / (eps * shares))
            }
            _ => None,
        };

        let valuations = run_all(
            &info,
            assumptions,
            wacc_pct / 100.0,
            Some(forecast),
            eps_to_fcf_ratio,
            info.profit_margin,
        );

        let momentum = match &history_result {
            Ok(bars) => {
                let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
                let benchmark: Option<Vec<f64>> = benchmark_result
                    .as_ref()
                    .ok()
                    .map(|bars| bars.iter().map(|b| b.close).collect());
                match momentum_analysis::momentum_profile(&closes, benchmark.as_deref()) {
                    Ok(metrics) => Some(metrics),
                    Err(e) => {
                        tracing::warn!("Momentum skipped for {}: {}", symbol, e);
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!("No price history for {}: {}", symbol, e);
                None
            }
        };

        let score = scoring_engine::score(&info, current_price, &valuations, momentum.as_ref());

        Ok(AnalysisReport {
            ticker: symbol,
            name: info.name.clone(),
            sector: info.sector.clone(),
            industry: info.industry.clone(),
            generated_at: Utc::now(),
            current_price,
            wacc_pct,
            valuations,
            momentum,
            score,
            targets: AnalystTargets {
                target_mean: info.target_mean_price,
                target_high: info.target_high_price,
                target_low: info.target_low_price,
                analyst_count: info.analyst_count,
                recommendation_key: info.recommendation_key.clone(),
            },
        })
    }

    /// Company news over the trailing `days` calendar days. Empty without
    /// a Finnhub key.
    pub async fn company_news(
        &self,
        symbol: &str,
        days: i64,
    ) -> Result<Vec<NewsItem>, ValuationError> {
        self.finnhub.company_news(&symbol.to_uppercase(), days).await
    }

    /// Monthly analyst recommendation trends, most recent first. Empty
    /// without a Finnhub key.
    pub async fn recommendation_trends(
        &self,
        symbol: &str,
    ) -> Result<Vec<RecommendationTrend>, ValuationError> {
        self.finnhub.recommendation_trends(&symbol.to_uppercase()).await
    }

    /// Compare a ticker against its industry peers. Peer symbols come from
    /// Finnhub when a key is configured, with a builtin table as fallback.
    /// Returns `None` when no peers are known for the ticker.
    pub async fn peer_comparison(
        &self,
        symbol: &str,
    ) -> Result<Option<PeerComparison>, ValuationError> {
        let symbol = symbol.to_uppercase();

        let mut peer_symbols = match self.finnhub.peers(&symbol).await {
            Ok(peers) => peers,
            Err(e) => {
                tracing::warn!("Finnhub peer lookup failed for {}: {}", symbol, e);
                Vec::new()
            }
        };
        if peer_symbols.is_empty() {
            peer_symbols = builtin_peers(&symbol, MAX_PEERS);
        }
        peer_symbols.truncate(MAX_PEERS);

        if peer_symbols.is_empty() {
            tracing::info!("No known peers for {}", symbol);
            return Ok(None);
        }

        let subject = PeerMetrics::from_info(&self.get_info(&symbol).await?);

        let mut peers = Vec::with_capacity(peer_symbols.len());
        for peer in &peer_symbols {
            match self.get_info(peer).await {
                Ok(info) => peers.push(PeerMetrics::from_info(&info)),
                Err(e) => tracing::warn!("Skipping peer {}: {}", peer, e),
            }
        }

        Ok(compare(subject, peers))
    }

    /// Save a report's valuation snapshot to the watchlist. Returns `true`
    /// when the ticker was newly added.
    pub fn save_to_watchlist(
        &self,
        store: &WatchlistStore,
        report: &AnalysisReport,
    ) -> Result<bool, ValuationError> {
        let entry = WatchlistEntry {
            ticker: report.ticker.clone(),
            name: report
                .name
                .clone()
                .unwrap_or_else(|| report.ticker.clone()),
            current_price: report.current_price,
            sector: report.sector.clone(),
            industry: report.industry.clone(),
            wacc: Some(report.wacc_pct),
            dcf_value: report.valuations.dcf_value,
            peg_ratio: report.valuations.peg_ratio,
            lynch_value: report.valuations.lynch_value,
            mean_reversion_value: report.valuations.mean_reversion_value,
            ev_ebitda: report.valuations.ev_ebitda,
            momentum_6m: report.momentum.as_ref().map(|m| m.return_6m),
            added_at: report.generated_at,
            last_updated: report.generated_at,
        };
        store.upsert(entry)
    }
}
