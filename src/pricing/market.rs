use super::PriceFetcher;
use crate::api::MarketDataProvider;
use crate::models::Currency;
use crate::models::market::{MarketCoin, PriceHistory, PriceQuote, TrendingCoin};
use crate::utils::Cache;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

const MARKET_TTL: Duration = Duration::from_secs(60);
const SEARCH_TTL: Duration = Duration::from_secs(300);
const HISTORY_TTL: Duration = Duration::from_secs(600);
const TRENDING_TTL: Duration = Duration::from_secs(12 * 60 * 60);
const SEARCH_RESULT_LIMIT: usize = 10;

/// Market browsing on top of the price API: top coins, search, history and
/// trending, each behind its own cache.
pub struct MarketService {
    provider: Arc<dyn MarketDataProvider>,
    prices: Arc<PriceFetcher>,
    markets: Cache<Vec<MarketCoin>>,
    searches: Cache<Vec<MarketCoin>>,
    histories: Cache<PriceHistory>,
    trending: Cache<Vec<TrendingCoin>>,
}

impl MarketService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, prices: Arc<PriceFetcher>) -> Self {
        Self {
            provider,
            prices,
            markets: Cache::new(MARKET_TTL),
            searches: Cache::new(SEARCH_TTL),
            histories: Cache::new(HISTORY_TTL),
            trending: Cache::new(TRENDING_TTL),
        }
    }

    pub async fn price(&self, id: &str, currency: &Currency) -> PriceQuote {
        self.prices.get_price(id, currency).await
    }

    /// Coins ordered by market cap. On failure the last cached page is
    /// returned whatever its age, or nothing.
    pub async fn top_coins(&self, page: u32, per_page: u32, currency: &Currency) -> Vec<MarketCoin> {
        let key = format!("top_p{}_l{}_{}", page, per_page, currency);
        if let Some(cached) = self.markets.get(&key).await {
            return cached;
        }

        match self.provider.markets(currency, None, page, per_page).await {
            Ok(coins) => {
                self.markets.set(key, coins.clone()).await;
                coins
            }
            Err(e) => {
                warn!("Failed to load top coins: {}", e);
                self.markets.get_stale(&key).await.unwrap_or_default()
            }
        }
    }

    /// Search by name or symbol, enriched with market data. When the market
    /// data call fails the bare search hits are returned.
    pub async fn search(&self, query: &str, currency: &Currency) -> Vec<MarketCoin> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let key = format!("search_{}_{}", query.to_lowercase(), currency);
        if let Some(cached) = self.searches.get(&key).await {
            return cached;
        }

        let hits = match self.provider.search(query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                return Vec::new();
            }
        };
        if hits.is_empty() {
            return Vec::new();
        }

        let top: Vec<_> = hits.into_iter().take(SEARCH_RESULT_LIMIT).collect();
        let ids = top.iter().map(|h| h.id.clone()).collect();
        match self.provider.markets(currency, Some(ids), 1, SEARCH_RESULT_LIMIT as u32).await {
            Ok(coins) => {
                self.searches.set(key, coins.clone()).await;
                coins
            }
            Err(e) => {
                info!("Market data unavailable for search results ({}), returning basic results", e);
                top.into_iter().map(MarketCoin::from).collect()
            }
        }
    }

    pub async fn history(&self, id: &str, days: u32, currency: &Currency) -> Option<PriceHistory> {
        let key = format!("chart_{}_{}_{}", id, days, currency);
        if let Some(cached) = self.histories.get(&key).await {
            return Some(cached);
        }

        match self.provider.market_chart(id, days, currency).await {
            Ok(history) => {
                self.histories.set(key, history.clone()).await;
                Some(history)
            }
            Err(e) => {
                warn!("Failed to load {} day history of {}: {}", days, id, e);
                None
            }
        }
    }

    pub async fn trending(&self) -> Vec<TrendingCoin> {
        const KEY: &str = "trending";
        if let Some(cached) = self.trending.get(KEY).await {
            return cached;
        }

        match self.provider.trending().await {
            Ok(coins) => {
                self.trending.set(KEY.to_string(), coins.clone()).await;
                coins
            }
            Err(e) => {
                warn!("Failed to load trending coins: {}", e);
                self.trending.get_stale(KEY).await.unwrap_or_default()
            }
        }
    }

    pub async fn clear_cache(&self) {
        self.prices.cache().clear().await;
        self.markets.clear().await;
        self.searches.clear().await;
        self.histories.clear().await;
        self.trending.clear().await;
    }
}
