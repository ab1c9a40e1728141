use super::ChainScanner;
use crate::api::JsonRpcClient;
use crate::error::Result;
use crate::models::{RawAsset, CHAIN_SOLANA};
use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use serde_json::json;

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;
const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// SPL mints that are reported, as (mint, symbol, price id). Balances of
/// any other mint are ignored.
const KNOWN_MINTS: &[(&str, &str, &str)] = &[
    ("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "USDC", "usd-coin"),
    ("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", "USDT", "tether"),
    ("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263", "BONK", "bonk"),
    ("EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm", "WIF", "dogwifhat"),
    ("JUPyiwrYJFskUPiHa7hkeR8VUtkMwNSIKG5534c905F2", "JUP", "jupiter-exchange-solana"),
    ("4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R", "RAY", "raydium"),
];

#[derive(Debug, Deserialize)]
struct RpcValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct TokenAccount {
    account: AccountData,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    data: ParsedData,
}

#[derive(Debug, Deserialize)]
struct ParsedData {
    parsed: ParsedAccount,
}

#[derive(Debug, Deserialize)]
struct ParsedAccount {
    info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    mint: String,
    token_amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAmount {
    ui_amount: Option<f64>,
}

pub fn known_mint(mint: &str) -> Option<(&'static str, &'static str)> {
    KNOWN_MINTS
        .iter()
        .find(|(m, _, _)| *m == mint)
        .map(|(_, symbol, id)| (*symbol, *id))
}

pub struct SolanaScanner {
    rpc: JsonRpcClient,
}

impl SolanaScanner {
    pub fn new(rpc: JsonRpcClient) -> Self {
        Self { rpc }
    }

    async fn native_balance(&self, address: &str) -> Result<Option<RawAsset>> {
        let response: RpcValue<u64> = self.rpc.call("getBalance", json!([address])).await?;
        if response.value == 0 {
            return Ok(None);
        }
        let balance = response.value as f64 / LAMPORTS_PER_SOL;
        Ok(Some(RawAsset::native("solana", "Solana", "SOL", balance, CHAIN_SOLANA)))
    }

    async fn token_balances(&self, address: &str) -> Result<Vec<RawAsset>> {
        let params = json!([
            address,
            { "programId": TOKEN_PROGRAM_ID },
            { "encoding": "jsonParsed" }
        ]);
        let response: RpcValue<Vec<TokenAccount>> = self.rpc.call("getTokenAccountsByOwner", params).await?;

        let assets = response
            .value
            .into_iter()
            .filter_map(|account| {
                let info = account.account.data.parsed.info;
                let amount = info.token_amount.ui_amount.filter(|a| *a > 0.0)?;
                let (symbol, id) = known_mint(&info.mint)?;
                Some(RawAsset {
                    id: Some(id.to_string()),
                    name: symbol.to_string(),
                    symbol: symbol.to_string(),
                    balance: amount,
                    chain: CHAIN_SOLANA.to_string(),
                    contract_address: Some(info.mint),
                })
            })
            .collect();
        Ok(assets)
    }
}

#[async_trait]
impl ChainScanner for SolanaScanner {
    fn name(&self) -> &str {
        "solana"
    }

    /// Either half may fail on its own and only drops its part of the
    /// result. The scan fails when both do.
    async fn try_scan(&self, address: &str) -> Result<Vec<RawAsset>> {
        let (native, tokens) = tokio::join!(self.native_balance(address), self.token_balances(address));

        match (native, tokens) {
            (Err(e), Err(_)) => Err(e),
            (Ok(native), Ok(tokens)) => Ok(native.into_iter().chain(tokens).collect()),
            (Ok(native), Err(e)) => {
                warn!("solana: token accounts of {} unavailable: {}", address, e);
                Ok(native.into_iter().collect())
            }
            (Err(e), Ok(tokens)) => {
                warn!("solana: SOL balance of {} unavailable: {}", address, e);
                Ok(tokens)
            }
        }
    }
}
