//! Plain-text rendering for reports, peer tables, news, and the watchlist.

use chrono::DateTime;
use finnhub_client::{NewsItem, RecommendationTrend};
use peer_comparison::PeerComparison;
use std::fmt::Write;
use valuation_core::AnalysisReport;
use watchlist_store::WatchlistEntry;

const MAX_HEADLINES: usize = 20;

fn money(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${:.2}", v),
        None => "n/a".to_string(),
    }
}

fn ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

fn upside(report: &AnalysisReport, fair_value: Option<f64>) -> String {
    fair_value
        .and_then(|v| report.upside_pct(v))
        .map(|u| format!("  ({:+.1}%)", u))
        .unwrap_or_default()
}

pub fn render(report: &AnalysisReport) -> String {
    let mut out = String::new();

    let name = report.name.as_deref().unwrap_or(&report.ticker);
    let _ = writeln!(out, "{} ({})", name, report.ticker);
    if let (Some(sector), Some(industry)) = (&report.sector, &report.industry) {
        let _ = writeln!(out, "{} / {}", sector, industry);
    }
    let _ = writeln!(out, "Price: {}", money(report.current_price));
    let _ = writeln!(out, "Discount rate (WACC): {:.1}%", report.wacc_pct);

    let _ = writeln!(out, "\nFair value estimates");
    let v = &report.valuations;
    let _ = writeln!(
        out,
        "  DCF                {:>10}{}",
        money(v.dcf_value),
        upside(report, v.dcf_value)
    );
    let _ = writeln!(
        out,
        "  PEG fair value     {:>10}{}   (PEG ratio {})",
        money(v.peg_value),
        upside(report, v.peg_value),
        ratio(v.peg_ratio)
    );
    let _ = writeln!(
        out,
        "  Peter Lynch        {:>10}{}",
        money(v.lynch_value),
        upside(report, v.lynch_value)
    );
    let _ = writeln!(
        out,
        "  Mean reversion     {:>10}{}",
        money(v.mean_reversion_value),
        upside(report, v.mean_reversion_value)
    );
    let _ = writeln!(
        out,
        "  Graham number      {:>10}{}",
        money(v.graham_number),
        upside(report, v.graham_number)
    );
    let _ = writeln!(
        out,
        "  Dividend discount  {:>10}{}",
        money(v.ddm_value),
        upside(report, v.ddm_value)
    );
    let _ = writeln!(out, "  EV/EBITDA          {:>10}", ratio(v.ev_ebitda));

    if let Some(forecast) = &v.eps_forecast {
        if !forecast.points.is_empty() {
            let _ = writeln!(
                out,
                "\nEPS forecast ({:.1}% growth)",
                forecast.growth_rate * 100.0
            );
            for point in &forecast.points {
                let _ = writeln!(out, "  {}  {:.2}", point.year, point.eps);
            }
        }
    }

    if let Some(m) = &report.momentum {
        let _ = writeln!(out, "\nMomentum");
        let _ = writeln!(
            out,
            "  3M {:+.1}%   6M {:+.1}%   12M {:+.1}%",
            m.return_3m, m.return_6m, m.return_12m
        );
        let _ = writeln!(out, "  RS rating {}/99", m.rs_rating);
        if let Some(rs) = m.relative_strength {
            let _ = writeln!(
                out,
                "  vs benchmark (6M): {:+.1} pts, {}",
                rs,
                m.rs_trend.as_str()
            );
        }
    }

    let score = &report.score;
    let _ = writeln!(
        out,
        "\nScore: {}/100  {}  {}",
        score.total,
        "*".repeat(score.recommendation.stars() as usize),
        score.recommendation.label()
    );
    let b = &score.breakdown;
    let _ = writeln!(
        out,
        "  Valuation {}/25  Financials {}/20  Growth {}/20  Momentum {}/20  Risk {}/15",
        b.valuation, b.financial_health, b.growth, b.momentum, b.risk
    );
    for insight in &score.insights {
        let _ = writeln!(out, "  + {}", insight);
    }
    for risk in &score.risk_factors {
        let _ = writeln!(out, "  - {}", risk);
    }

    let t = &report.targets;
    if t.target_mean.is_some() {
        let _ = writeln!(
            out,
            "\nAnalyst targets: mean {}  high {}  low {}{}",
            money(t.target_mean),
            money(t.target_high),
            money(t.target_low),
            t.analyst_count
                .map(|n| format!("  ({} analysts)", n))
                .unwrap_or_default()
        );
    }

    out
}

pub fn render_peers(comparison: &PeerComparison) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Ticker", "P/E", "Fwd P/E", "PEG", "EV/EBITDA", "ROE"
    );
    for company in &comparison.companies {
        let _ = writeln!(
            out,
            "{:<8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            company.ticker,
            ratio(company.pe_ratio),
            ratio(company.forward_pe),
            ratio(company.peg_ratio),
            ratio(company.ev_ebitda),
            ratio(company.roe.map(|r| r * 100.0))
        );
    }

    let subject = &comparison.companies[0].ticker;
    let _ = writeln!(out, "\nRankings for {}", subject);
    let mut metrics: Vec<_> = comparison.rankings.iter().collect();
    metrics.sort_by(|a, b| a.0.cmp(b.0));
    for (metric, rank) in metrics {
        let _ = writeln!(
            out,
            "  {:<16} {:>2} of {:<2}  ({:.0}th percentile)",
            metric, rank.position, rank.total, rank.percentile
        );
    }

    out
}

pub fn render_news(news: &[NewsItem], trends: &[RecommendationTrend], days: i64) -> String {
    let mut out = String::new();

    if !trends.is_empty() {
        let _ = writeln!(out, "Analyst recommendations");
        let _ = writeln!(
            out,
            "  {:<12} {:>10} {:>6} {:>6} {:>6} {:>11}",
            "Period", "Strong buy", "Buy", "Hold", "Sell", "Strong sell"
        );
        for trend in trends.iter().take(4) {
            let _ = writeln!(
                out,
                "  {:<12} {:>10} {:>6} {:>6} {:>6} {:>11}",
                trend.period, trend.strong_buy, trend.buy, trend.hold, trend.sell,
                trend.strong_sell
            );
        }
    }

    if !news.is_empty() {
        if !out.is_empty() {
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "News (last {} days)", days);
        for item in news.iter().take(MAX_HEADLINES) {
            let date = DateTime::from_timestamp(item.datetime, 0)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "????-??-??".to_string());
            let _ = writeln!(out, "  {}  [{}] {}", date, item.source, item.headline);
            if !item.url.is_empty() {
                let _ = writeln!(out, "              {}", item.url);
            }
        }
        if news.len() > MAX_HEADLINES {
            let _ = writeln!(out, "  ... and {} more", news.len() - MAX_HEADLINES);
        }
    }

    out
}

pub fn render_watchlist(entries: &[WatchlistEntry]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<8} {:<24} {:>10} {:>10} {:>8} {:>8}",
        "Ticker", "Name", "Price", "DCF", "PEG", "6M mom"
    );
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<8} {:<24} {:>10} {:>10} {:>8} {:>8}",
            entry.ticker,
            entry.name.chars().take(24).collect::<String>(),
            money(entry.current_price),
            money(entry.dcf_value),
            ratio(entry.peg_ratio),
            entry
                .momentum_6m
                .map(|m| format!("{:+.1}%", m))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use valuation_core::{
        AnalystTargets, Recommendation, ScoreBreakdown, ScoreCard, ValuationSummary,
    };

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            ticker: "TEST".to_string(),
            name: Some("Test Corp".to_string()),
            sector: Some("Technology".to_string()),
            industry: Some("Software".to_string()),
            generated_at: Utc::now(),
            current_price: Some(100.0),
            wacc_pct: 9.5,
            valuations: ValuationSummary {
                dcf_value: Some(125.0),
                peg_ratio: Some(1.2),
                ..Default::default()
            },
            momentum: None,
            score: ScoreCard {
                total: 76,
                breakdown: ScoreBreakdown {
                    valuation: 20,
                    financial_health: 16,
                    growth: 14,
                    momentum: 14,
                    risk: 12,
                },
                recommendation: Recommendation::Buy,
                insights: vec!["Attractive valuation".to_string()],
                risk_factors: vec!["No major risks".to_string()],
            },
            targets: AnalystTargets::default(),
        }
    }

    #[test]
    fn report_text_includes_key_figures() {
        let text = render(&sample_report());
        assert!(text.contains("Test Corp (TEST)"));
        assert!(text.contains("$125.00"));
        assert!(text.contains("(+25.0%)"));
        assert!(text.contains("Score: 76/100"));
        assert!(text.contains("Buy"));
    }

    #[test]
    fn news_text_lists_headlines_and_trends() {
        let news = vec![NewsItem {
            headline: "Quarterly results beat estimates".to_string(),
            summary: String::new(),
            source: "Reuters".to_string(),
            url: "https://example.com/article".to_string(),
            datetime: 1_764_000_000,
        }];
        let trends = vec![RecommendationTrend {
            period: "2026-08-01".to_string(),
            strong_buy: 20,
            buy: 15,
            hold: 8,
            sell: 1,
            strong_sell: 0,
        }];

        let text = render_news(&news, &trends, 7);
        assert!(text.contains("Quarterly results beat estimates"));
        assert!(text.contains("[Reuters]"));
        assert!(text.contains("2025-11-24"));
        assert!(text.contains("2026-08-01"));
        assert!(text.contains("20"));
    }

    #[test]
    fn missing_values_render_as_na() {
        let mut report = sample_report();
        report.valuations = ValuationSummary::default();
        report.current_price = None;
        let text = render(&report);
        assert!(text.contains("n/a"));
        assert!(!text.contains("NaN"));
    }
}
