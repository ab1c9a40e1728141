use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::error::{Error, Result};

/// Price and 24h change of one price-feed id in one currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub change_24h: f64,
}

/// Row of the `coins/markets` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

impl From<SearchHit> for MarketCoin {
    fn from(hit: SearchHit) -> Self {
        MarketCoin {
            id: hit.id,
            symbol: hit.symbol,
            name: hit.name,
            image: hit.large.or(hit.thumb),
            current_price: None,
            market_cap: None,
            market_cap_rank: hit.market_cap_rank,
            total_volume: None,
            price_change_percentage_24h: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub score: Option<u32>,
}

/// Raw `market_chart` payload: `[timestamp_ms, value]` pairs.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChart {
    pub prices: Vec<[f64; 2]>,
    #[serde(default)]
    pub total_volumes: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub id: String,
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn from_chart(id: &str, chart: MarketChart) -> Result<Self> {
        let mut points = Vec::with_capacity(chart.prices.len());
        for [ts, price] in chart.prices {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::ApiInvalidData(format!(
                    "Invalid price value {} in history of {}", price, id
                )));
            }
            let timestamp = DateTime::from_timestamp_millis(ts as i64)
                .ok_or_else(|| Error::ApiInvalidData(format!("Invalid timestamp {} in history of {}", ts, id)))?;
            points.push(PricePoint { timestamp, price });
        }

        let history = PriceHistory { id: id.to_string(), points };
        history.validate()?;
        Ok(history)
    }

    pub fn validate(&self) -> Result<()> {
        if self.points.is_empty() {
            return Err(Error::ApiInvalidData("Empty price history data".into()));
        }
        for pair in self.points.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(Error::ApiInvalidData("Timestamps not in ascending order".into()));
            }
        }
        Ok(())
    }

    /// Percentage change between the first and last point.
    pub fn change_percent(&self) -> Option<f64> {
        let first = self.points.first()?.price;
        let last = self.points.last()?.price;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}
