use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use crate::error::{Error, Result};

pub mod market;

pub const CHAIN_ETHEREUM: &str = "Ethereum";
pub const CHAIN_SOLANA: &str = "Solana";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    Metamask,
    Phantom,
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletType::Metamask => write!(f, "metamask"),
            WalletType::Phantom => write!(f, "phantom"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedWallet {
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub connected_at: DateTime<Utc>,
}

impl LinkedWallet {
    pub fn new(wallet_type: WalletType, address: impl Into<String>) -> Self {
        Self {
            wallet_type,
            address: address.into(),
            chain_id: None,
            connected_at: Utc::now(),
        }
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }
}

/// A balance as reported by one chain scanner, before pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAsset {
    pub id: Option<String>,
    pub name: String,
    pub symbol: String,
    pub balance: f64,
    pub chain: String,
    pub contract_address: Option<String>,
}

impl RawAsset {
    pub fn native(id: &str, name: &str, symbol: &str, balance: f64, chain: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: name.to_string(),
            symbol: symbol.to_string(),
            balance,
            chain: chain.to_string(),
            contract_address: None,
        }
    }

    /// Native assets of the primary chains are shown even when unpriced.
    pub fn is_primary_chain(&self) -> bool {
        self.chain == CHAIN_ETHEREUM || self.chain == CHAIN_SOLANA
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedAsset {
    #[serde(flatten)]
    pub asset: RawAsset,
    pub price: Option<f64>,
    pub change_24h: f64,
    /// `balance * price`; unset until a price has been resolved.
    pub value: Option<f64>,
}

impl PricedAsset {
    pub fn unpriced(asset: RawAsset) -> Self {
        Self {
            asset,
            price: None,
            change_24h: 0.0,
            value: None,
        }
    }

    pub fn apply_quote(&mut self, quote: &market::PriceQuote) {
        self.price = Some(quote.price);
        self.change_24h = quote.change_24h;
        self.value = Some(self.asset.balance * quote.price);
    }

    pub fn needs_price(&self) -> bool {
        self.price.map_or(true, |p| p == 0.0)
    }

    pub fn value_or_zero(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    /// Absolute 24h change in the display currency.
    pub change_24h: f64,
    /// Value-weighted 24h change, in percent.
    pub change_24h_percent: f64,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub summary: PortfolioSummary,
    pub assets: Vec<PricedAsset>,
    pub currency: Currency,
    pub generated_at: DateTime<Utc>,
}

impl PortfolioSnapshot {
    pub fn empty(currency: Currency) -> Self {
        Self {
            summary: PortfolioSummary::default(),
            assets: Vec::new(),
            currency,
            generated_at: Utc::now(),
        }
    }
}

/// Lowercase fiat code used as the price API's `vs_currency`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn usd() -> Self {
        Currency("usd".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_lowercase();
        if !(2..=5).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(Error::InvalidInput(format!("Unsupported currency code '{}'", s)));
        }
        Ok(Currency(code))
    }
}

impl TryFrom<String> for Currency {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> String {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
