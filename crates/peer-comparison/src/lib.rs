//! Peer comparison: line a company up against its industry peers on
//! valuation and quality metrics, with industry aggregates and per-metric
//! rankings.

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::HashMap;
use valuation_core::CompanyInfo;

/// Fallback peer lists for widely-held tickers, used when no peer
/// provider is configured or it returns nothing.
const BUILTIN_PEERS: &[(&str, &[&str])] = &[
    ("AAPL", &["MSFT", "GOOGL", "META", "NVDA", "TSLA"]),
    ("MSFT", &["AAPL", "GOOGL", "META", "NVDA", "ORCL"]),
    ("GOOGL", &["AAPL", "MSFT", "META", "AMZN", "NVDA"]),
    ("TSLA", &["F", "GM", "RIVN", "LCID", "NIO"]),
    ("NVDA", &["AMD", "INTC", "QCOM", "AVGO", "TSM"]),
    ("AMD", &["NVDA", "INTC", "QCOM", "AVGO", "MU"]),
    ("JPM", &["BAC", "WFC", "C", "GS", "MS"]),
    ("BAC", &["JPM", "WFC", "C", "USB", "PNC"]),
    ("KO", &["PEP", "MNST", "DPS", "KDP", "CELH"]),
    ("PEP", &["KO", "MNST", "DPS", "KDP", "CELH"]),
    ("WMT", &["TGT", "COST", "HD", "LOW", "AMZN"]),
    ("AMZN", &["WMT", "TGT", "COST", "EBAY", "SHOP"]),
    ("JNJ", &["PFE", "UNH", "ABBV", "MRK", "LLY"]),
    ("PFE", &["JNJ", "MRK", "ABBV", "LLY", "BMY"]),
];

/// Builtin peer symbols for `symbol`, capped at `max_peers`. Empty when
/// the ticker is not in the table.
pub fn builtin_peers(symbol: &str, max_peers: usize) -> Vec<String> {
    let upper = symbol.to_uppercase();
    BUILTIN_PEERS
        .iter()
        .find(|(t, _)| *t == upper)
        .map(|(_, peers)| peers.iter().take(max_peers).map(|p| p.to_string()).collect())
        .unwrap_or_default()
}

/// Comparable metric slice of a company snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerMetrics {
    pub ticker: String,
    pub name: String,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub ev_ebitda: Option<f64>,
    pub price_to_book: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub roe: Option<f64>,
    pub profit_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub beta: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl PeerMetrics {
    pub fn from_info(info: &CompanyInfo) -> Self {
        let ev_ebitda = match (info.enterprise_value, info.ebitda) {
            (Some(ev), Some(ebitda)) if ebitda > 0.0 => Some(ev / ebitda),
            _ => None,
        };
        Self {
            ticker: info.symbol.clone(),
            name: info.name.clone().unwrap_or_else(|| info.symbol.clone()),
            market_cap: info.market_cap,
            pe_ratio: info.trailing_pe,
            forward_pe: info.forward_pe,
            peg_ratio: info.peg_ratio,
            ev_ebitda,
            price_to_book: info.price_to_book,
            price_to_sales: info.price_to_sales,
            roe: info.return_on_equity,
            profit_margin: info.profit_margin,
            revenue_growth: info.revenue_growth,
            earnings_growth: info.earnings_growth,
            debt_to_equity: info.debt_to_equity,
            current_ratio: info.current_ratio,
            beta: info.beta,
            dividend_yield: info.dividend_yield,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

type MetricFn = fn(&PeerMetrics) -> Option<f64>;

const RANKED_METRICS: &[(&str, Direction, MetricFn)] = &[
    ("pe_ratio", Direction::LowerIsBetter, |m| m.pe_ratio),
    ("forward_pe", Direction::LowerIsBetter, |m| m.forward_pe),
    ("peg_ratio", Direction::LowerIsBetter, |m| m.peg_ratio),
    ("ev_ebitda", Direction::LowerIsBetter, |m| m.ev_ebitda),
    ("price_to_book", Direction::LowerIsBetter, |m| m.price_to_book),
    ("price_to_sales", Direction::LowerIsBetter, |m| m.price_to_sales),
    ("debt_to_equity", Direction::LowerIsBetter, |m| m.debt_to_equity),
    ("beta", Direction::LowerIsBetter, |m| m.beta),
    ("roe", Direction::HigherIsBetter, |m| m.roe),
    ("profit_margin", Direction::HigherIsBetter, |m| m.profit_margin),
    ("revenue_growth", Direction::HigherIsBetter, |m| m.revenue_growth),
    ("earnings_growth", Direction::HigherIsBetter, |m| m.earnings_growth),
    ("current_ratio", Direction::HigherIsBetter, |m| m.current_ratio),
    ("dividend_yield", Direction::HigherIsBetter, |m| m.dividend_yield),
];

/// Mean, median, min, and max of one metric across the group, ignoring
/// companies without a value. Market cap is deliberately excluded from
/// aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct MetricStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Where the subject sits on one metric. Position is 1-indexed and ties
/// resolve in favor of the subject.
#[derive(Debug, Clone, Serialize)]
pub struct MetricRank {
    pub position: usize,
    pub total: usize,
    pub percentile: f64,
}

#[derive(Debug, Serialize)]
pub struct PeerComparison {
    /// Subject first, then peers in fetch order.
    pub companies: Vec<PeerMetrics>,
    pub industry_stats: HashMap<String, MetricStats>,
    pub rankings: HashMap<String, MetricRank>,
}

/// Compare the subject (first element) against its peers. Returns `None`
/// when there are no peers to compare against.
pub fn compare(subject: PeerMetrics, peers: Vec<PeerMetrics>) -> Option<PeerComparison> {
    if peers.is_empty() {
        return None;
    }

    let mut companies = Vec::with_capacity(peers.len() + 1);
    companies.push(subject);
    companies.extend(peers);

    let mut industry_stats = HashMap::new();
    let mut rankings = HashMap::new();

    for &(metric, direction, accessor) in RANKED_METRICS {
        let values: Vec<f64> = companies.iter().filter_map(accessor).collect();
        if !values.is_empty() {
            let mean = values.as_slice().mean();
            let min = values.as_slice().min();
            let max = values.as_slice().max();
            let median = Data::new(values).median();
            industry_stats.insert(
                metric.to_string(),
                MetricStats {
                    mean,
                    median,
                    min,
                    max,
                },
            );
        }

        rankings.insert(metric.to_string(), rank_metric(&companies, direction, accessor));
    }

    Some(PeerComparison {
        companies,
        industry_stats,
        rankings,
    })
}

fn rank_metric(companies: &[PeerMetrics], direction: Direction, accessor: MetricFn) -> MetricRank {
    let total = companies.len();
    let subject_value = accessor(&companies[0]);

    // Missing values sort last, so a subject without one ranks behind
    // every peer that has one.
    let position = match subject_value {
        Some(v) => {
            let better = companies[1..]
                .iter()
                .filter_map(accessor)
                .filter(|&p| match direction {
                    Direction::LowerIsBetter => p < v,
                    Direction::HigherIsBetter => p > v,
                })
                .count();
            better + 1
        }
        None => companies[1..].iter().filter_map(accessor).count() + 1,
    };

    MetricRank {
        position,
        total,
        percentile: (total - position + 1) as f64 / total as f64 * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(ticker: &str, pe: Option<f64>, roe: Option<f64>) -> PeerMetrics {
        PeerMetrics {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            market_cap: None,
            pe_ratio: pe,
            forward_pe: None,
            peg_ratio: None,
            ev_ebitda: None,
            price_to_book: None,
            price_to_sales: None,
            roe,
            profit_margin: None,
            revenue_growth: None,
            earnings_growth: None,
            debt_to_equity: None,
            current_ratio: None,
            beta: None,
            dividend_yield: None,
        }
    }

    #[test]
    fn builtin_peers_lookup() {
        let peers = builtin_peers("aapl", 10);
        assert_eq!(peers.len(), 5);
        assert!(peers.contains(&"MSFT".to_string()));
        assert!(builtin_peers("ZZZZ", 10).is_empty());
        assert_eq!(builtin_peers("NVDA", 3).len(), 3);
    }

    #[test]
    fn lower_is_better_ranking() {
        let subject = metrics("A", Some(15.0), None);
        let peers = vec![
            metrics("B", Some(10.0), None),
            metrics("C", Some(20.0), None),
            metrics("D", Some(30.0), None),
        ];
        let cmp = compare(subject, peers).unwrap();
        let rank = &cmp.rankings["pe_ratio"];
        assert_eq!(rank.position, 2);
        assert_eq!(rank.total, 4);
        assert!((rank.percentile - 75.0).abs() < 1e-9);
    }

    #[test]
    fn higher_is_better_ranking() {
        let subject = metrics("A", None, Some(0.30));
        let peers = vec![
            metrics("B", None, Some(0.10)),
            metrics("C", None, Some(0.20)),
        ];
        let cmp = compare(subject, peers).unwrap();
        let rank = &cmp.rankings["roe"];
        assert_eq!(rank.position, 1);
        assert!((rank.percentile - 100.0).abs() < 1e-9);
    }

    #[test]
    fn missing_subject_value_ranks_last() {
        let subject = metrics("A", None, None);
        let peers = vec![
            metrics("B", Some(10.0), None),
            metrics("C", Some(20.0), None),
        ];
        let cmp = compare(subject, peers).unwrap();
        let rank = &cmp.rankings["pe_ratio"];
        assert_eq!(rank.position, 3);
        assert_eq!(rank.total, 3);
    }

    #[test]
    fn industry_stats_skip_missing() {
        let subject = metrics("A", Some(10.0), None);
        let peers = vec![metrics("B", Some(20.0), None), metrics("C", None, None)];
        let cmp = compare(subject, peers).unwrap();
        let stats = &cmp.industry_stats["pe_ratio"];
        assert!((stats.mean - 15.0).abs() < 1e-9);
        assert!((stats.median - 15.0).abs() < 1e-9);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 20.0);
        assert!(!cmp.industry_stats.contains_key("roe"));
    }

    #[test]
    fn no_peers_is_none() {
        assert!(compare(metrics("A", Some(10.0), None), vec![]).is_none());
    }

    #[test]
    fn ev_ebitda_from_info() {
        let info = CompanyInfo {
            symbol: "X".to_string(),
            enterprise_value: Some(1000.0),
            ebitda: Some(100.0),
            ..Default::default()
        };
        assert_eq!(PeerMetrics::from_info(&info).ev_ebitda, Some(10.0));

        let no_ebitda = CompanyInfo {
            symbol: "Y".to_string(),
            enterprise_value: Some(1000.0),
            ebitda: Some(0.0),
            ..Default::default()
        };
        assert_eq!(PeerMetrics::from_info(&no_ebitda).ev_ebitda, None);
    }
}
