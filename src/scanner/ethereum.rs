use super::{lenient_f64, ChainScanner};
use crate::api::HttpClient;
use crate::config::EthereumExplorerConfig;
use crate::error::{Error, Result};
use crate::models::{RawAsset, CHAIN_ETHEREUM};
use crate::utils::{scale_amount, token_decimals};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Deserialize)]
struct AddressInfo {
    address: Option<String>,
    #[serde(rename = "ETH")]
    eth: Option<EthBalance>,
    #[serde(default)]
    tokens: Vec<TokenHolding>,
}

#[derive(Debug, Deserialize)]
struct EthBalance {
    /// Already in ETH, not wei.
    #[serde(default, deserialize_with = "lenient_f64")]
    balance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TokenHolding {
    #[serde(rename = "tokenInfo")]
    token_info: TokenInfo,
    /// Raw amount in base units.
    #[serde(default, deserialize_with = "lenient_f64")]
    balance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    address: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    decimals: Option<f64>,
    /// Price-feed id when the explorer knows it; `false` or absent otherwise.
    coingecko: Option<Value>,
}

/// Ethereum mainnet through an Ethplorer-style `getAddressInfo` endpoint,
/// which returns the native balance and every token in a single call.
pub struct EthereumExplorerScanner {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl EthereumExplorerScanner {
    pub fn new(http: HttpClient, config: &EthereumExplorerConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

fn parse_address_info(info: AddressInfo) -> Result<Vec<RawAsset>> {
    if info.address.is_none() {
        return Err(Error::ApiInvalidData("Explorer response has no address".to_string()));
    }

    let mut assets = Vec::new();
    if let Some(balance) = info.eth.and_then(|e| e.balance).filter(|b| b.is_finite() && *b > 0.0) {
        assets.push(RawAsset::native("ethereum", "Ethereum", "ETH", balance, CHAIN_ETHEREUM));
    }

    for token in info.tokens {
        let TokenInfo { address, name, symbol, decimals, coingecko } = token.token_info;
        let Some(symbol) = symbol.filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        let Some(balance) = token_decimals(decimals, DEFAULT_DECIMALS)
            .and_then(|decimals| scale_amount(token.balance.unwrap_or(0.0), decimals))
        else {
            debug!("Skipping {} ({:?}): malformed amount or decimals", symbol, address);
            continue;
        };
        if balance <= 0.0 {
            continue;
        }

        assets.push(RawAsset {
            id: coingecko.as_ref().and_then(Value::as_str).map(str::to_string),
            name: name.unwrap_or_else(|| symbol.clone()),
            symbol,
            balance,
            chain: CHAIN_ETHEREUM.to_string(),
            contract_address: address,
        });
    }
    Ok(assets)
}

#[async_trait]
impl ChainScanner for EthereumExplorerScanner {
    fn name(&self) -> &str {
        "ethereum"
    }

    async fn try_scan(&self, address: &str) -> Result<Vec<RawAsset>> {
        let url = format!("{}/getAddressInfo/{}", self.base_url, address);
        let request = self.http.inner().get(&url).query(&[("apiKey", self.api_key.as_str())]);
        let info: AddressInfo = self.http.get_json(request).await?;
        parse_address_info(info)
    }
}
