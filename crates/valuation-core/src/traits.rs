use crate::{CompanyInfo, FinancialStatements, PriceBar, ValuationError};
use async_trait::async_trait;

/// Seam for the primary market-data provider.
///
/// The engine is generic over this trait so tests can substitute canned
/// data for the HTTP client.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Company snapshot (price, fundamentals, analyst targets)
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, ValuationError>;

    /// Daily bars covering roughly the past `days` calendar days
    async fn daily_history(&self, symbol: &str, days: i64) -> Result<Vec<PriceBar>, ValuationError>;

    /// Annual income-statement lines for the WACC and EPS-history inputs.
    /// Providers without statement access return the empty default.
    async fn financial_statements(
        &self,
        symbol: &str,
    ) -> Result<FinancialStatements, ValuationError>;

    /// Risk-free rate as a decimal (e.g. 0.045)
    async fn risk_free_rate(&self) -> Result<f64, ValuationError>;
}
