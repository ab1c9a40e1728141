use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::models::Currency;
use crate::models::market::{MarketCoin, PriceHistory, PriceQuote, SearchHit, TrendingCoin};
use async_trait::async_trait;
use log::warn;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

pub mod coingecko;
pub mod rpc;

pub use coingecko::CoinGeckoClient;
pub use rpc::JsonRpcClient;

/// Upstream price and market data. Implemented by the CoinGecko client and
/// by test doubles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Prices for `ids` in `currency`. Ids the upstream does not know are
    /// absent from the map.
    async fn simple_price(&self, ids: &[String], currency: &Currency) -> Result<HashMap<String, PriceQuote>>;

    async fn markets(&self, currency: &Currency, ids: Option<Vec<String>>, page: u32, per_page: u32) -> Result<Vec<MarketCoin>>;

    async fn market_chart(&self, id: &str, days: u32, currency: &Currency) -> Result<PriceHistory>;

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    async fn trending(&self) -> Result<Vec<TrendingCoin>>;
}

/// reqwest client with a per-request timeout and a bounded retry on
/// transport errors and 5xx responses. 429 is never retried here.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retries: u32,
    backoff: Duration,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("portfolio-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            retries: config.retries,
            backoff: config.retry_backoff(),
        })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::ApiInvalidFormat(format!("Failed to parse response: {}", e)))
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let mut pending = Some(request);
        let mut attempt = 0;

        loop {
            let current = pending
                .take()
                .ok_or_else(|| Error::InternalError("Request could not be retried".to_string()))?;
            let retry = if attempt < self.retries { current.try_clone() } else { None };

            match current.send().await {
                Ok(response) if response.status().is_server_error() && retry.is_some() => {
                    warn!(
                        "Server error {} from {}, retrying in {}ms",
                        response.status(),
                        response.url(),
                        (self.backoff * (attempt + 1)).as_millis()
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if retry.is_some() && (e.is_timeout() || e.is_connect() || e.is_request()) => {
                    warn!("Request failed ({}), retrying in {}ms", e, (self.backoff * (attempt + 1)).as_millis());
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(Error::NetworkError(format!("Request timed out: {}", e)));
                    }
                    return Err(e.into());
                }
            }

            attempt += 1;
            tokio::time::sleep(self.backoff * attempt).await;
            pending = retry;
        }
    }
}

/// Map non-success statuses onto the crate error type.
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let error = match status {
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimitExceeded(format!("{} returned 429", url)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::ApiAuthFailed(format!("{} returned {}", url, status))
        }
        StatusCode::SERVICE_UNAVAILABLE => Error::ApiMaintenance(format!("{} is unavailable", url)),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Error::ApiError(format!("{} returned {}: {}", url, status, body.chars().take(200).collect::<String>()))
        }
    };
    Err(error)
}
