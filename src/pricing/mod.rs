use crate::api::MarketDataProvider;
use crate::config::PriceApiConfig;
use crate::metrics;
use crate::models::Currency;
use crate::models::market::PriceQuote;
use crate::utils::Cache;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

pub mod market;
pub mod symbols;

pub use market::MarketService;

pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(120);
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Cache of resolved quotes keyed by price id and currency.
pub type PriceCache = Cache<PriceQuote>;

pub fn cache_key(id: &str, currency: &Currency) -> String {
    format!("price_{}_{}", id, currency)
}

/// Resolves quotes for batches of price-feed ids.
///
/// Fresh cache entries are served without a request. The rest is fetched in
/// chunks; a rate-limited chunk falls back to the last cached quote of each
/// id whatever its age, any other failure leaves the chunk unresolved.
pub struct PriceFetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: PriceCache,
    chunk_size: usize,
}

impl PriceFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: PriceCache, chunk_size: usize) -> Self {
        Self {
            provider,
            cache,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn with_defaults(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::new(provider, PriceCache::new(DEFAULT_PRICE_TTL), DEFAULT_CHUNK_SIZE)
    }

    pub fn from_config(provider: Arc<dyn MarketDataProvider>, config: &PriceApiConfig) -> Self {
        let cache = PriceCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self::new(provider, cache, config.chunk_size)
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub async fn get_prices(&self, ids: &[String], currency: &Currency) -> HashMap<String, PriceQuote> {
        let mut seen = HashSet::new();
        let mut results = HashMap::new();
        let mut missing = Vec::new();

        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match self.cache.get(&cache_key(id, currency)).await {
                Some(quote) => {
                    metrics::PRICE_CACHE_HITS.inc();
                    results.insert(id.clone(), quote);
                }
                None => missing.push(id.clone()),
            }
        }

        if missing.is_empty() {
            return results;
        }
        debug!("{} price ids cached, {} to fetch", results.len(), missing.len());

        for chunk in missing.chunks(self.chunk_size) {
            metrics::PRICE_REQUESTS.inc();
            match self.provider.simple_price(chunk, currency).await {
                Ok(prices) => {
                    for id in chunk {
                        if let Some(quote) = prices.get(id) {
                            self.cache.set(cache_key(id, currency), *quote).await;
                            results.insert(id.clone(), *quote);
                        }
                    }
                }
                Err(e) if e.is_rate_limited() => {
                    metrics::PRICE_RATE_LIMITED.inc();
                    warn!("Price API rate limited, using cached prices for {} ids", chunk.len());
                    for id in chunk {
                        if let Some(quote) = self.cache.get_stale(&cache_key(id, currency)).await {
                            results.insert(id.clone(), quote);
                        }
                    }
                }
                Err(e) => {
                    warn!("Price request for {} ids failed: {}", chunk.len(), e);
                }
            }
        }

        results
    }

    /// Single-id lookup; an unresolved id yields a zero quote.
    pub async fn get_price(&self, id: &str, currency: &Currency) -> PriceQuote {
        let prices = self.get_prices(&[id.to_string()], currency).await;
        prices.get(id).copied().unwrap_or(PriceQuote { price: 0.0, change_24h: 0.0 })
    }
}
