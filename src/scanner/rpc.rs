use super::ChainScanner;
use crate::api::rpc::parse_hex_quantity;
use crate::api::JsonRpcClient;
use crate::config::{RpcChainConfig, TokenConfig};
use crate::error::{Error, Result};
use crate::models::RawAsset;
use crate::utils::scale_amount;
use crate::wallet::is_evm_address;
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use serde_json::json;

/// `balanceOf(address)`
const BALANCE_OF_SELECTOR: &str = "0x70a08231";
const NATIVE_DECIMALS: u8 = 18;

/// EVM chains without a usable explorer: the native balance through
/// `eth_getBalance` plus a fixed list of ERC-20 contracts probed with
/// `balanceOf`.
pub struct RpcFallbackScanner {
    chain: RpcChainConfig,
    rpc: JsonRpcClient,
    label: String,
}

impl RpcFallbackScanner {
    pub fn new(chain: RpcChainConfig, rpc: JsonRpcClient) -> Self {
        let label = format!("rpc:{}", chain.name);
        Self { chain, rpc, label }
    }

    async fn native_balance(&self, address: &str) -> Result<Option<RawAsset>> {
        let hex: String = self.rpc.call("eth_getBalance", json!([address, "latest"])).await?;
        let Some(balance) = scale_amount(parse_hex_quantity(&hex)?, NATIVE_DECIMALS).filter(|b| *b > 0.0) else {
            return Ok(None);
        };
        Ok(Some(RawAsset::native(
            native_price_id(&self.chain.symbol, &self.chain.id),
            &format!("{} Native", self.chain.name),
            &self.chain.symbol,
            balance,
            &self.chain.name,
        )))
    }

    async fn token_balance(&self, token: &TokenConfig, address: &str) -> Result<Option<RawAsset>> {
        let call = json!({ "to": token.address, "data": balance_of_calldata(address)? });
        let hex: String = self.rpc.call("eth_call", json!([call, "latest"])).await?;
        let Some(balance) = scale_amount(parse_hex_quantity(&hex)?, token.decimals).filter(|b| *b > 0.0) else {
            return Ok(None);
        };
        Ok(Some(RawAsset {
            id: Some(token.id.clone()),
            name: token.symbol.clone(),
            symbol: token.symbol.clone(),
            balance,
            chain: self.chain.name.clone(),
            contract_address: Some(token.address.clone()),
        }))
    }
}

/// Well-known native symbols use their canonical id, anything else the
/// chain's configured one.
pub fn native_price_id<'a>(symbol: &str, chain_id: &'a str) -> &'a str {
    match symbol {
        "ETH" => "ethereum",
        "BNB" => "binancecoin",
        "MATIC" => "matic-network",
        "AVAX" => "avalanche-2",
        _ => chain_id,
    }
}

/// Selector followed by the owner address left-padded to 32 bytes.
pub fn balance_of_calldata(address: &str) -> Result<String> {
    if !is_evm_address(address) {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    Ok(format!("{}{:0>64}", BALANCE_OF_SELECTOR, address[2..].to_lowercase()))
}

#[async_trait]
impl ChainScanner for RpcFallbackScanner {
    fn name(&self) -> &str {
        &self.label
    }

    async fn try_scan(&self, address: &str) -> Result<Vec<RawAsset>> {
        let mut assets = Vec::new();
        match self.native_balance(address).await {
            Ok(Some(native)) => assets.push(native),
            Ok(None) => {}
            Err(e) => warn!("{}: native balance of {} unavailable: {}", self.label, address, e),
        }

        let probes = self.chain.tokens.iter().map(|token| async move {
            match self.token_balance(token, address).await {
                Ok(asset) => asset,
                Err(e) => {
                    debug!("{}: balanceOf {} failed: {}", self.label, token.symbol, e);
                    None
                }
            }
        });
        assets.extend(join_all(probes).await.into_iter().flatten());

        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpClient;
    use crate::config::HttpConfig;
    use mockito::Matcher;

    const OWNER: &str = "0x1111111111111111111111111111111111111111";

    fn token(address: &str, symbol: &str, decimals: u8, id: &str) -> TokenConfig {
        TokenConfig {
            address: address.to_string(),
            symbol: symbol.to_string(),
            decimals,
            id: id.to_string(),
        }
    }

    fn chain(rpc_url: String) -> RpcChainConfig {
        RpcChainConfig {
            name: "Avalanche".to_string(),
            id: "avalanche-2".to_string(),
            symbol: "AVAX".to_string(),
            rpc_url,
            tokens: vec![
                token("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "USDt", 6, "tether"),
                token("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "USDC", 6, "usd-coin"),
                token("0xcccccccccccccccccccccccccccccccccccccccc", "BTC.b", 8, "bitcoin"),
                token("0xdddddddddddddddddddddddddddddddddddddddd", "WETH.e", 18, "ethereum"),
                token("0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee", "JOE", 18, "joe"),
            ],
        }
    }

    fn scanner_for(server: &mockito::ServerGuard) -> RpcFallbackScanner {
        let http = HttpClient::new(&HttpConfig { timeout_secs: 5, retries: 0, retry_backoff_ms: 1 }).unwrap();
        RpcFallbackScanner::new(chain(server.url()), JsonRpcClient::new(http, server.url()))
    }

    async fn mock_result(server: &mut mockito::ServerGuard, pattern: &str, result: &str) -> mockito::Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::Regex(pattern.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"jsonrpc":"2.0","id":1,"result":"{}"}}"#, result))
            .create_async()
            .await
    }

    #[test]
    fn test_native_price_id() {
        assert_eq!(native_price_id("BNB", "binance-smart-chain"), "binancecoin");
        assert_eq!(native_price_id("ETH", "base"), "ethereum");
        assert_eq!(native_price_id("FTM", "fantom"), "fantom");
    }

    #[test]
    fn test_balance_of_calldata() {
        let data = balance_of_calldata("0xAbCdEf0000000000000000000000000000000001").unwrap();
        assert_eq!(data.len(), 10 + 64);
        assert!(data.starts_with("0x70a08231000000000000000000000000abcdef"));
        assert!(data.ends_with("01"));
        assert!(balance_of_calldata("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM").is_err());
    }

    #[tokio::test]
    async fn test_failing_probe_does_not_drop_siblings() {
        let mut server = mockito::Server::new_async().await;
        // 2 AVAX, 15 USDt, 0.5 BTC.b, zero WETH.e, JOE reverts
        let _native = mock_result(&mut server, "eth_getBalance", "0x1bc16d674ec80000").await;
        let _usdt = mock_result(&mut server, "0xaaaaaaaa", "0xe4e1c0").await;
        let _usdc = mock_result(&mut server, "0xbbbbbbbb", "0x0").await;
        let _btc = mock_result(&mut server, "0xcccccccc", "0x2faf080").await;
        let _weth = mock_result(&mut server, "0xdddddddd", "0x").await;
        let _joe = server
            .mock("POST", "/")
            .match_body(Matcher::Regex("0xeeeeeeee".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#)
            .create_async()
            .await;

        let assets = scanner_for(&server).try_scan(OWNER).await.unwrap();

        let symbols: Vec<&str> = assets.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AVAX", "USDt", "BTC.b"]);
        assert_eq!(assets[0].name, "Avalanche Native");
        assert_eq!(assets[0].id.as_deref(), Some("avalanche-2"));
        assert_eq!(assets[0].balance, 2.0);
        assert_eq!(assets[1].balance, 15.0);
        assert_eq!(assets[2].balance, 0.5);
        assert!(assets.iter().all(|a| a.chain == "Avalanche"));
    }

    #[tokio::test]
    async fn test_native_failure_keeps_token_probes() {
        let mut server = mockito::Server::new_async().await;
        let _native = server
            .mock("POST", "/")
            .match_body(Matcher::Regex("eth_getBalance".to_string()))
            .with_status(500)
            .create_async()
            .await;
        let _tokens = mock_result(&mut server, "eth_call", "0xf4240").await;

        let assets = scanner_for(&server).try_scan(OWNER).await.unwrap();

        assert_eq!(assets.len(), 5);
        assert!(assets.iter().all(|a| a.contract_address.is_some()));
    }
}
