use super::{HttpClient, MarketDataProvider};
use crate::config::PriceApiConfig;
use crate::error::{Error, Result};
use crate::models::Currency;
use crate::models::market::{MarketChart, MarketCoin, PriceHistory, PriceQuote, SearchHit, TrendingCoin};
use async_trait::async_trait;
use log::debug;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

const PRO_API_KEY_HEADER: &str = "x-cg-pro-api-key";
const DEMO_API_KEY_HEADER: &str = "x-cg-demo-api-key";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    coins: Vec<TrendingItem>,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    item: TrendingCoin,
}

/// Client for CoinGecko's public API, or any proxy that mirrors its routes.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(http: HttpClient, config: &PriceApiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self.http.inner().get(&url);
        if let Some(key) = &self.api_key {
            let header = if self.base_url.contains("pro-api") {
                PRO_API_KEY_HEADER
            } else {
                DEMO_API_KEY_HEADER
            };
            request = request.header(header, key);
        }
        request
    }
}

/// Read `{ id: { <cur>: price, <cur>_24h_change: pct } }`.
fn parse_simple_price(data: &HashMap<String, Value>, currency: &Currency) -> HashMap<String, PriceQuote> {
    let price_key = currency.as_str();
    let change_key = format!("{}_24h_change", price_key);

    data.iter()
        .filter_map(|(id, entry)| {
            let price = entry.get(price_key)?.as_f64()?;
            let change_24h = entry.get(&change_key).and_then(Value::as_f64).unwrap_or(0.0);
            Some((id.clone(), PriceQuote { price, change_24h }))
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    async fn simple_price(&self, ids: &[String], currency: &Currency) -> Result<HashMap<String, PriceQuote>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        debug!("Requesting {} prices in {}", ids.len(), currency);

        let request = self.request("simple/price").query(&[
            ("ids", ids.join(",")),
            ("vs_currencies", currency.to_string()),
            ("include_24hr_change", "true".to_string()),
        ]);
        let data: HashMap<String, Value> = self.http.get_json(request).await?;
        Ok(parse_simple_price(&data, currency))
    }

    async fn markets(&self, currency: &Currency, ids: Option<Vec<String>>, page: u32, per_page: u32) -> Result<Vec<MarketCoin>> {
        let mut params = vec![
            ("vs_currency", currency.to_string()),
            ("order", "market_cap_desc".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];
        match ids {
            Some(ids) => params.push(("ids", ids.join(","))),
            None => {
                params.push(("per_page", per_page.to_string()));
                params.push(("page", page.to_string()));
            }
        }

        let request = self.request("coins/markets").query(&params);
        self.http.get_json(request).await
    }

    async fn market_chart(&self, id: &str, days: u32, currency: &Currency) -> Result<PriceHistory> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput("Empty coin id".to_string()));
        }
        let request = self
            .request(&format!("coins/{}/market_chart", id))
            .query(&[("vs_currency", currency.to_string()), ("days", days.to_string())]);
        let chart: MarketChart = self.http.get_json(request).await?;
        PriceHistory::from_chart(id, chart)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let request = self.request("search").query(&[("query", query)]);
        let response: SearchResponse = self.http.get_json(request).await?;
        Ok(response.coins)
    }

    async fn trending(&self) -> Result<Vec<TrendingCoin>> {
        let response: TrendingResponse = self.http.get_json(self.request("search/trending")).await?;
        Ok(response.coins.into_iter().map(|c| c.item).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> CoinGeckoClient {
        let http = HttpClient::new(&HttpConfig { timeout_secs: 5, retries: 0, retry_backoff_ms: 1 }).unwrap();
        CoinGeckoClient::new(
            http,
            &PriceApiConfig {
                base_url: server.url(),
                ..PriceApiConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_simple_price_in_eur() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/simple/price")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ids".into(), "ethereum,tether,nothing".into()),
                Matcher::UrlEncoded("vs_currencies".into(), "eur".into()),
                Matcher::UrlEncoded("include_24hr_change".into(), "true".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ethereum":{"eur":1850.5,"eur_24h_change":-2.5},"tether":{"eur":0.92}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let ids = vec!["ethereum".to_string(), "tether".to_string(), "nothing".to_string()];
        let prices = client.simple_price(&ids, &"eur".parse().unwrap()).await.unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices["ethereum"], PriceQuote { price: 1850.5, change_24h: -2.5 });
        assert_eq!(prices["tether"].change_24h, 0.0);
        assert!(!prices.contains_key("nothing"));
    }

    #[tokio::test]
    async fn test_simple_price_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/simple/price")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error":"CoinGecko Rate Limit exceeded"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.simple_price(&["bitcoin".to_string()], &Currency::usd()).await;
        assert!(matches!(result, Err(Error::RateLimitExceeded(_))));
    }

    #[tokio::test]
    async fn test_trending_unwraps_items() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/search/trending")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"coins":[{"item":{"id":"pepe","name":"Pepe","symbol":"PEPE","market_cap_rank":40,"score":0}}]}"#)
            .create_async()
            .await;

        let trending = client_for(&server).trending().await.unwrap();
        assert_eq!(trending.len(), 1);
        assert_eq!(trending[0].id, "pepe");
        assert_eq!(trending[0].score, Some(0));
    }

    #[test]
    fn test_parse_simple_price_skips_entries_without_price() {
        let data: HashMap<String, Value> =
            serde_json::from_str(r#"{"a":{"usd":null},"b":{"usd":2,"usd_24h_change":1.5},"c":{}}"#).unwrap();
        let prices = parse_simple_price(&data, &Currency::usd());
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["b"].change_24h, 1.5);
    }
}
