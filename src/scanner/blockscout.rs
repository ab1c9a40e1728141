use super::{lenient_f64, ChainScanner};
use crate::api::HttpClient;
use crate::config::BlockscoutChainConfig;
use crate::error::{Error, Result};
use crate::models::RawAsset;
use crate::utils::{scale_amount, token_decimals};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Deserialize)]
struct TokenListResponse {
    message: Option<String>,
    /// An array on success, a string or null on error.
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct TokenEntry {
    #[serde(default, deserialize_with = "lenient_f64")]
    balance: Option<f64>,
    #[serde(rename = "contractAddress")]
    contract_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    decimals: Option<f64>,
    name: Option<String>,
    symbol: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Etherscan-compatible `tokenlist` endpoint of a Blockscout instance.
pub struct BlockscoutScanner {
    http: HttpClient,
    base_url: String,
    chain: String,
    label: String,
}

impl BlockscoutScanner {
    pub fn new(http: HttpClient, config: &BlockscoutChainConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chain: chain_label(&config.key),
            label: format!("blockscout:{}", config.key),
        }
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }
}

/// `base` becomes `Base`.
pub fn chain_label(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_token_list(response: TokenListResponse, chain: &str) -> Result<Vec<RawAsset>> {
    if !response.result.is_array() {
        return Err(Error::ApiInvalidData(format!(
            "tokenlist returned no result ({})",
            response.message.unwrap_or_default()
        )));
    }
    let entries: Vec<TokenEntry> = serde_json::from_value(response.result)?;

    let mut assets = Vec::new();
    for entry in entries {
        if !matches!(entry.kind.as_deref(), Some("ERC-20") | Some("coin")) {
            continue;
        }
        let Some(symbol) = entry.symbol.filter(|s| !s.trim().is_empty()) else {
            debug!("Skipping unnamed token {:?} on {}", entry.contract_address, chain);
            continue;
        };
        let Some(balance) = token_decimals(entry.decimals, DEFAULT_DECIMALS)
            .and_then(|decimals| scale_amount(entry.balance.unwrap_or(0.0), decimals))
        else {
            debug!("Skipping {} on {}: malformed amount or decimals", symbol, chain);
            continue;
        };
        if balance <= 0.0 {
            continue;
        }

        assets.push(RawAsset {
            id: None,
            name: entry.name.filter(|n| !n.is_empty()).unwrap_or_else(|| symbol.clone()),
            symbol,
            balance,
            chain: chain.to_string(),
            contract_address: entry.contract_address,
        });
    }
    Ok(assets)
}

#[async_trait]
impl ChainScanner for BlockscoutScanner {
    fn name(&self) -> &str {
        &self.label
    }

    async fn try_scan(&self, address: &str) -> Result<Vec<RawAsset>> {
        let request = self.http.inner().get(format!("{}/api", self.base_url)).query(&[
            ("module", "account"),
            ("action", "tokenlist"),
            ("address", address),
        ]);
        let response: TokenListResponse = self.http.get_json(request).await?;
        parse_token_list(response, &self.chain)
    }
}
