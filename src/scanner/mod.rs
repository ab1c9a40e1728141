//! Per-chain balance scanners.
//!
//! Every scanner turns one wallet address into the non-zero balances it can
//! find on its chain. Scanner failures never reach the caller: `scan` logs
//! them and reports an empty list, so one unreachable explorer cannot hide
//! the rest of the portfolio.

use crate::api::{HttpClient, JsonRpcClient};
use crate::config::ChainsConfig;
use crate::error::Result;
use crate::metrics;
use crate::models::{RawAsset, WalletType};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

pub mod blockscout;
pub mod ethereum;
pub mod rpc;
pub mod solana;

pub use blockscout::BlockscoutScanner;
pub use ethereum::EthereumExplorerScanner;
pub use rpc::RpcFallbackScanner;
pub use solana::SolanaScanner;

#[async_trait]
pub trait ChainScanner: Send + Sync {
    /// Label used in logs and metrics.
    fn name(&self) -> &str;

    async fn try_scan(&self, address: &str) -> Result<Vec<RawAsset>>;

    async fn scan(&self, address: &str) -> Vec<RawAsset> {
        metrics::CHAIN_SCANS.with_label_values(&[self.name()]).inc();
        match self.try_scan(address).await {
            Ok(assets) => {
                debug!("{}: {} assets for {}", self.name(), assets.len(), address);
                assets
            }
            Err(e) => {
                metrics::CHAIN_SCAN_FAILURES.with_label_values(&[self.name()]).inc();
                warn!("{} scan of {} failed: {}", self.name(), address, e);
                Vec::new()
            }
        }
    }
}

/// The scanners run for each wallet type.
#[derive(Clone, Default)]
pub struct ScannerRegistry {
    evm: Vec<Arc<dyn ChainScanner>>,
    solana: Vec<Arc<dyn ChainScanner>>,
}

impl ScannerRegistry {
    pub fn new(evm: Vec<Arc<dyn ChainScanner>>, solana: Vec<Arc<dyn ChainScanner>>) -> Self {
        Self { evm, solana }
    }

    /// MetaMask wallets get the Ethereum explorer, every Blockscout chain and
    /// every RPC chain; Phantom wallets get Solana.
    pub fn from_config(chains: &ChainsConfig, http: &HttpClient) -> Self {
        let mut evm: Vec<Arc<dyn ChainScanner>> = Vec::new();
        evm.push(Arc::new(EthereumExplorerScanner::new(http.clone(), &chains.ethereum)));
        for chain in &chains.blockscout {
            evm.push(Arc::new(BlockscoutScanner::new(http.clone(), chain)));
        }
        for chain in &chains.rpc {
            let client = JsonRpcClient::new(http.clone(), chain.rpc_url.clone());
            evm.push(Arc::new(RpcFallbackScanner::new(chain.clone(), client)));
        }

        let solana_rpc = JsonRpcClient::new(http.clone(), chains.solana.rpc_url.clone());
        let solana: Vec<Arc<dyn ChainScanner>> = vec![Arc::new(SolanaScanner::new(solana_rpc))];

        Self { evm, solana }
    }

    pub fn for_wallet(&self, wallet_type: WalletType) -> &[Arc<dyn ChainScanner>] {
        match wallet_type {
            WalletType::Metamask => &self.evm,
            WalletType::Phantom => &self.solana,
        }
    }
}

/// Explorers send amounts and decimals as JSON numbers or as strings,
/// sometimes both within one response.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::error::Error;
    use crate::tests::common::FakeScanner;

    #[derive(Deserialize)]
    struct Amount {
        #[serde(default, deserialize_with = "lenient_f64")]
        value: Option<f64>,
    }

    fn amount(json: &str) -> Option<f64> {
        serde_json::from_str::<Amount>(json).unwrap().value
    }

    #[test]
    fn test_lenient_f64() {
        assert_eq!(amount(r#"{"value": 18}"#), Some(18.0));
        assert_eq!(amount(r#"{"value": "6"}"#), Some(6.0));
        assert_eq!(amount(r#"{"value": "1.5e21"}"#), Some(1.5e21));
        assert_eq!(amount(r#"{"value": null}"#), None);
        assert_eq!(amount(r#"{"value": "n/a"}"#), None);
        assert_eq!(amount(r#"{}"#), None);
    }

    #[tokio::test]
    async fn test_scan_swallows_errors() {
        let scanner = FakeScanner::failing("broken", Error::NetworkError("connection reset".into()));
        assert!(scanner.scan("0xabc").await.is_empty());
    }

    #[test]
    fn test_registry_from_default_config() {
        let http = HttpClient::new(&HttpConfig::default()).unwrap();
        let registry = ScannerRegistry::from_config(&ChainsConfig::default(), &http);

        let evm: Vec<&str> = registry.for_wallet(WalletType::Metamask).iter().map(|s| s.name()).collect();
        assert_eq!(evm.len(), 1 + 5 + 2);
        assert_eq!(evm[0], "ethereum");
        assert!(evm.contains(&"blockscout:base"));
        assert!(evm.contains(&"rpc:Avalanche"));

        let solana = registry.for_wallet(WalletType::Phantom);
        assert_eq!(solana.len(), 1);
        assert_eq!(solana[0].name(), "solana");
    }
}
