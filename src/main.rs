use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use portfolio_tracker::api::{CoinGeckoClient, HttpClient, MarketDataProvider};
use portfolio_tracker::cli::{format_change, format_value, Cli, Command};
use portfolio_tracker::config::Config;
use portfolio_tracker::models::{Currency, LinkedWallet, PortfolioSnapshot};
use portfolio_tracker::portfolio::{assess, PortfolioTracker};
use portfolio_tracker::pricing::{MarketService, PriceFetcher};
use portfolio_tracker::{logging, metrics};

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.log_file {
        Some(path) => logging::init_file(path, cli.debug)?,
        None => logging::init_stderr(cli.debug),
    }
    metrics::init()?;

    let mut config = load_config(cli.config.as_deref())?;
    config.apply_env();
    if let Some(currency) = &cli.currency {
        config.portfolio.currency = currency.clone();
    }
    let currency = config.portfolio.currency.clone();

    let http = HttpClient::new(&config.http)?;
    let provider: Arc<dyn MarketDataProvider> = Arc::new(CoinGeckoClient::new(http.clone(), &config.price_api));
    let prices = Arc::new(PriceFetcher::from_config(provider.clone(), &config.price_api));
    let market = MarketService::new(provider, prices.clone());

    match cli.command.clone().unwrap_or(Command::Scan { wallets: Vec::new(), json: false, metrics: false }) {
        Command::Scan { wallets, json, metrics: show_metrics } => {
            let tracker = PortfolioTracker::from_config(&config, &http, prices);
            run_scan(&tracker, wallets, &cli, json, config.portfolio.refresh_interval_secs).await?;
            if show_metrics {
                print!("{}", metrics::render());
            }
        }
        Command::Top { page, limit } => {
            for coin in market.top_coins(page, limit, &currency).await {
                println!(
                    "{:>4}  {:<8} {:<24} {:>16}  {}",
                    coin.market_cap_rank.map(|r| r.to_string()).unwrap_or_default(),
                    coin.symbol.to_uppercase(),
                    coin.name,
                    coin.current_price.map(|p| format_value(p, &currency, false)).unwrap_or_else(|| "-".into()),
                    coin.price_change_percentage_24h.map(format_change).unwrap_or_default()
                );
            }
        }
        Command::Search { query } => {
            let results = market.search(&query, &currency).await;
            if results.is_empty() {
                println!("No coins match '{}'", query);
            }
            for coin in results {
                println!(
                    "{:<32} {:<8} {}",
                    coin.id,
                    coin.symbol.to_uppercase(),
                    coin.current_price.map(|p| format_value(p, &currency, false)).unwrap_or_default()
                );
            }
        }
        Command::History { id, days } => match market.history(&id, days, &currency).await {
            Some(history) => {
                for point in &history.points {
                    println!("{}  {}", point.timestamp.format("%Y-%m-%d %H:%M"), format_value(point.price, &currency, false));
                }
                if let Some(change) = history.change_percent() {
                    println!("{} over {} days: {}", id, days, format_change(change));
                }
            }
            None => println!("No history available for '{}'", id),
        },
        Command::Trending => {
            for coin in market.trending().await {
                println!(
                    "{:>4}  {:<8} {}",
                    coin.market_cap_rank.map(|r| r.to_string()).unwrap_or_default(),
                    coin.symbol.to_uppercase(),
                    coin.name
                );
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if !path.exists() {
        warn!("No configuration at {:?}, using defaults", path);
        return Ok(Config::default());
    }
    let config = Config::load(path).with_context(|| format!("Failed to load configuration from {:?}", path))?;
    info!("Configuration loaded from {:?}", path);
    Ok(config)
}

async fn run_scan(
    tracker: &PortfolioTracker,
    extra_wallets: Vec<LinkedWallet>,
    cli: &Cli,
    json: bool,
    refresh_secs: u64,
) -> Result<()> {
    for wallet in extra_wallets {
        if let Err(e) = tracker.add_wallet(wallet).await {
            eprintln!("{}", e.user_message());
        }
    }
    if tracker.wallets().await.is_empty() {
        println!("No wallets linked. Add [[wallets]] to the config or pass --wallet.");
        return Ok(());
    }

    if !cli.watch {
        tracker.refresh().await;
        return print_snapshot(&tracker.snapshot().await, cli.ghost, json);
    }

    let mut ticker = interval(Duration::from_secs(refresh_secs.max(1)));
    info!("Refreshing every {}s, Ctrl-C to stop", refresh_secs);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if tracker.refresh().await {
                    print_snapshot(&tracker.snapshot().await, cli.ghost, json)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                return Ok(());
            }
        }
    }
}

fn print_snapshot(snapshot: &PortfolioSnapshot, ghost: bool, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    let currency: &Currency = &snapshot.currency;
    let summary = &snapshot.summary;
    println!(
        "Total {}  24h {} ({})",
        format_value(summary.total_value, currency, ghost),
        format_value(summary.change_24h, currency, ghost),
        format_change(summary.change_24h_percent)
    );
    println!();

    for asset in &snapshot.assets {
        let balance = if ghost { "*****".to_string() } else { format!("{:.6}", asset.asset.balance) };
        let price = asset.price.map(|p| format_value(p, currency, false)).unwrap_or_else(|| "-".into());
        let value = asset.value.map(|v| format_value(v, currency, ghost)).unwrap_or_else(|| "-".into());
        println!(
            "{:<10} {:<20} {:>18} {:>16} {:>16} {:>8}",
            asset.asset.symbol,
            asset.asset.chain,
            balance,
            price,
            value,
            format_change(asset.change_24h)
        );
    }

    let health = assess(&snapshot.assets);
    println!();
    println!("Health {} / 100 ({})", health.score, health.status);
    for rec in &health.recommendations {
        println!("  [{:?}] {}", rec.kind, rec.text);
    }
    Ok(())
}
