//! Command-line entry point: analyze a ticker, manage the watchlist, and
//! compare against industry peers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finnhub_client::FinnhubClient;
use valuation_engine::{AnalysisOptions, ValuationEngine};
use valuation_models::ModelAssumptions;
use watchlist_store::WatchlistStore;
use yahoo_client::YahooClient;

mod report;

#[derive(Parser)]
#[command(name = "valuation", about = "Stock valuation workbench", version)]
struct Cli {
    /// Watchlist file location
    #[arg(long, global = true, default_value = "watchlist.json")]
    watchlist: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full valuation and scoring pipeline for a ticker
    Analyze {
        ticker: String,

        /// Discount rate override, percent (skips the WACC estimate)
        #[arg(long)]
        wacc: Option<f64>,

        /// FCF growth rate for the DCF projection window, percent
        #[arg(long)]
        growth: Option<f64>,

        /// Terminal growth rate, percent
        #[arg(long)]
        terminal_growth: Option<f64>,

        /// Earnings growth override for the EPS forecast, percent
        #[arg(long)]
        eps_growth: Option<f64>,

        /// Target P/E for the mean-reversion model
        #[arg(long)]
        target_pe: Option<f64>,

        /// EPS projection horizon in years
        #[arg(long)]
        forecast_years: Option<usize>,

        /// Save the result to the watchlist
        #[arg(long)]
        save: bool,

        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Compare a ticker against its industry peers
    Peers {
        ticker: String,

        #[arg(long)]
        json: bool,
    },

    /// Recent company news and analyst recommendation trends
    /// (requires FINNHUB_API_KEY)
    News {
        ticker: String,

        /// Look-back window in calendar days
        #[arg(long, default_value_t = 7)]
        days: i64,

        #[arg(long)]
        json: bool,
    },

    /// Show or edit the watchlist
    Watchlist {
        #[command(subcommand)]
        command: WatchlistCommands,
    },
}

#[derive(Subcommand)]
enum WatchlistCommands {
    /// List saved tickers
    List,
    /// Remove a ticker
    Remove { ticker: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let store = WatchlistStore::new(&cli.watchlist);

    match cli.command {
        Commands::Analyze {
            ticker,
            wacc,
            growth,
            terminal_growth,
            eps_growth,
            target_pe,
            forecast_years,
            save,
            json,
        } => {
            let mut assumptions = ModelAssumptions::default();
            if let Some(g) = growth {
                assumptions.growth_rate = g / 100.0;
            }
            if let Some(tg) = terminal_growth {
                assumptions.terminal_growth = tg / 100.0;
            }
            if let Some(pe) = target_pe {
                assumptions.target_pe = pe;
            }
            if let Some(years) = forecast_years {
                assumptions.forecast_years = years;
            }

            let options = AnalysisOptions {
                assumptions,
                custom_growth: eps_growth.map(|g| g / 100.0),
                wacc_override_pct: wacc,
            };

            let engine = build_engine();
            let report = engine
                .analyze(&ticker, &options)
                .await
                .with_context(|| format!("analysis failed for {}", ticker))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report::render(&report));
            }

            if save {
                let added = engine.save_to_watchlist(&store, &report)?;
                if added {
                    println!("Added {} to the watchlist", report.ticker);
                } else {
                    println!("Updated {} in the watchlist", report.ticker);
                }
            }
        }

        Commands::Peers { ticker, json } => {
            let engine = build_engine();
            match engine.peer_comparison(&ticker).await? {
                Some(comparison) if json => {
                    println!("{}", serde_json::to_string_pretty(&comparison)?);
                }
                Some(comparison) => {
                    print!("{}", report::render_peers(&comparison));
                }
                None => println!("No known peers for {}", ticker.to_uppercase()),
            }
        }

        Commands::News { ticker, days, json } => {
            let engine = build_engine();
            let (news, trends) = tokio::join!(
                engine.company_news(&ticker, days),
                engine.recommendation_trends(&ticker),
            );
            let news = news?;
            let trends = trends?;

            if json {
                let payload = serde_json::json!({ "news": news, "trends": trends });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if news.is_empty() && trends.is_empty() {
                println!(
                    "No news or recommendation data for {} (is FINNHUB_API_KEY set?)",
                    ticker.to_uppercase()
                );
            } else {
                print!("{}", report::render_news(&news, &trends, days));
            }
        }

        Commands::Watchlist { command } => match command {
            WatchlistCommands::List => {
                let entries = store.entries();
                if entries.is_empty() {
                    println!("Watchlist is empty");
                } else {
                    print!("{}", report::render_watchlist(&entries));
                }
            }
            WatchlistCommands::Remove { ticker } => {
                let ticker = ticker.to_uppercase();
                if store.remove(&ticker)? {
                    println!("Removed {}", ticker);
                } else {
                    println!("{} is not on the watchlist", ticker);
                }
            }
        },
    }

    Ok(())
}

fn build_engine() -> ValuationEngine<YahooClient> {
    ValuationEngine::new(YahooClient::new(), FinnhubClient::from_env())
}
