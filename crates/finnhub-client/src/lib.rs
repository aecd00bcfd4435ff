//! Finnhub HTTP client for the supplementary endpoints: industry peers,
//! company news, and analyst recommendation trends.
//!
//! The API key is optional. Without one every call returns empty results
//! so callers can degrade gracefully instead of branching on configuration.

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use valuation_core::ValuationError;

const BASE_URL: &str = "https://finnhub.io/api/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    /// Unix seconds
    #[serde(default)]
    pub datetime: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationTrend {
    #[serde(default)]
    pub period: String,
    #[serde(default, rename = "strongBuy")]
    pub strong_buy: i64,
    #[serde(default)]
    pub buy: i64,
    #[serde(default)]
    pub hold: i64,
    #[serde(default)]
    pub sell: i64,
    #[serde(default, rename = "strongSell")]
    pub strong_sell: i64,
}

#[derive(Clone)]
pub struct FinnhubClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl FinnhubClient {
    /// Reads `FINNHUB_API_KEY` from the environment; a missing key is not
    /// an error.
    pub fn from_env() -> Self {
        Self::new(std::env::var("FINNHUB_API_KEY").ok())
    }

    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::debug!("No Finnhub API key configured, peer/news lookups disabled");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, api_key }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, ValuationError> {
        let Some(key) = &self.api_key else {
            return Ok(None);
        };

        let url = format!("{}/{}", BASE_URL, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("token", key.as_str())])
            .send()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        let status = response.status();
        // Free-tier keys lack access to some endpoints; treat that as
        // "no data" rather than a hard failure.
        if status.as_u16() == 401 || status.as_u16() == 403 {
            tracing::warn!("Finnhub {} returned {}, skipping", path, status);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ValuationError::ApiError(format!(
                "Finnhub {} HTTP {}",
                path, status
            )));
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;
        Ok(Some(body))
    }

    /// Industry peer symbols for `symbol`. The upstream list includes the
    /// queried symbol itself; it is filtered out here.
    pub async fn peers(&self, symbol: &str) -> Result<Vec<String>, ValuationError> {
        let peers: Option<Vec<String>> = self
            .get_json("stock/peers", &[("symbol", symbol)])
            .await?;
        Ok(peers
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.eq_ignore_ascii_case(symbol))
            .collect())
    }

    /// Company news over the trailing `days` calendar days.
    pub async fn company_news(
        &self,
        symbol: &str,
        days: i64,
    ) -> Result<Vec<NewsItem>, ValuationError> {
        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(days);
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();

        let news: Option<Vec<NewsItem>> = self
            .get_json(
                "company-news",
                &[("symbol", symbol), ("from", &from), ("to", &to)],
            )
            .await?;
        Ok(news.unwrap_or_default())
    }

    /// Monthly analyst recommendation trends, most recent first.
    pub async fn recommendation_trends(
        &self,
        symbol: &str,
    ) -> Result<Vec<RecommendationTrend>, ValuationError> {
        let trends: Option<Vec<RecommendationTrend>> = self
            .get_json("stock/recommendation", &[("symbol", symbol)])
            .await?;
        Ok(trends.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyless_client_returns_empty() {
        let client = FinnhubClient::new(None);
        assert!(!client.has_key());
        assert!(client.peers("AAPL").await.unwrap().is_empty());
        assert!(client.company_news("AAPL", 7).await.unwrap().is_empty());
        assert!(client
            .recommendation_trends("AAPL")
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let client = FinnhubClient::new(Some("   ".to_string()));
        assert!(!client.has_key());
    }

    #[test]
    fn parses_recommendation_trend() {
        let json = r#"[{"period": "2025-08-01", "strongBuy": 20, "buy": 15, "hold": 8, "sell": 1, "strongSell": 0, "symbol": "AAPL"}]"#;
        let trends: Vec<RecommendationTrend> = serde_json::from_str(json).unwrap();
        assert_eq!(trends[0].strong_buy, 20);
        assert_eq!(trends[0].period, "2025-08-01");
    }
}
