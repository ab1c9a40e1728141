use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fs;
use std::time::Duration;
use crate::error::Result;
use crate::models::{Currency, LinkedWallet};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub price_api: PriceApiConfig,
    pub http: HttpConfig,
    pub portfolio: PortfolioConfig,
    pub chains: ChainsConfig,
    pub wallets: Vec<LinkedWallet>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PriceApiConfig {
    /// CoinGecko-compatible API root, or the caching proxy in front of it.
    pub base_url: String,
    pub api_key: Option<String>,
    pub cache_ttl_secs: u64,
    pub chunk_size: usize,
}

impl Default for PriceApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: None,
            cache_ttl_secs: 120,
            chunk_size: 50,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Extra attempts after a transport error or 5xx response.
    pub retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PortfolioConfig {
    pub currency: Currency,
    pub dust_threshold: f64,
    pub refresh_interval_secs: u64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            currency: Currency::usd(),
            dust_threshold: 0.01,
            refresh_interval_secs: 60,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ChainsConfig {
    pub ethereum: EthereumExplorerConfig,
    pub blockscout: Vec<BlockscoutChainConfig>,
    pub rpc: Vec<RpcChainConfig>,
    pub solana: SolanaConfig,
}

impl Default for ChainsConfig {
    fn default() -> Self {
        let blockscout = [
            ("base", "https://base.blockscout.com"),
            ("optimism", "https://optimism.blockscout.com"),
            ("arbitrum", "https://arbitrum.blockscout.com"),
            ("polygon", "https://polygon.blockscout.com"),
            ("zksync", "https://zksync.blockscout.com"),
        ]
        .into_iter()
        .map(|(key, url)| BlockscoutChainConfig {
            key: key.to_string(),
            base_url: url.to_string(),
        })
        .collect();

        Self {
            ethereum: EthereumExplorerConfig::default(),
            blockscout,
            rpc: vec![binance_smart_chain(), avalanche()],
            solana: SolanaConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EthereumExplorerConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Default for EthereumExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.ethplorer.io".to_string(),
            api_key: "freekey".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BlockscoutChainConfig {
    pub key: String,
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RpcChainConfig {
    pub name: String,
    /// Price-feed id of the native coin when its symbol is not a well-known one.
    pub id: String,
    pub symbol: String,
    pub rpc_url: String,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TokenConfig {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    pub id: String,
}

impl TokenConfig {
    fn new(address: &str, symbol: &str, decimals: u8, id: &str) -> Self {
        Self {
            address: address.to_string(),
            symbol: symbol.to_string(),
            decimals,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SolanaConfig {
    pub rpc_url: String,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
        }
    }
}

fn binance_smart_chain() -> RpcChainConfig {
    RpcChainConfig {
        name: "Binance Smart Chain".to_string(),
        id: "binancecoin".to_string(),
        symbol: "BNB".to_string(),
        rpc_url: "https://binance.llamarpc.com".to_string(),
        tokens: vec![
            TokenConfig::new("0x55d398326f99059ff775485246999027b3197955", "USDT", 18, "tether"),
            TokenConfig::new("0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d", "USDC", 18, "usd-coin"),
            TokenConfig::new("0xe9e7cea3dedca5984780bafc599bd69add087d56", "BUSD", 18, "binance-usd"),
            TokenConfig::new("0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82", "CAKE", 18, "pancakeswap-token"),
            TokenConfig::new("0x7130d2a12b9bcbfae4f2634d864a1ee1ce3ead9c", "BTCB", 18, "bitcoin"),
            TokenConfig::new("0x2170ed0880ac9a755fd29b2688956bd959f933f8", "ETH", 18, "ethereum"),
        ],
    }
}

fn avalanche() -> RpcChainConfig {
    RpcChainConfig {
        name: "Avalanche".to_string(),
        id: "avalanche-2".to_string(),
        symbol: "AVAX".to_string(),
        rpc_url: "https://avalanche.llamarpc.com".to_string(),
        tokens: vec![
            TokenConfig::new("0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7", "USDt", 6, "tether"),
            TokenConfig::new("0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e", "USDC", 6, "usd-coin"),
            TokenConfig::new("0x152b9d0fdc40c096757f570a51e494bd4b943e50", "BTC.b", 8, "bitcoin"),
            TokenConfig::new("0x49d5c2bdffac6ce2bfdb6640f4f80f226bc10bab", "WETH.e", 18, "ethereum"),
        ],
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        fs::write(path, config_str)?;
        Ok(())
    }

    /// Fill secrets that are usually kept out of the config file.
    pub fn apply_env(&mut self) {
        dotenv::dotenv().ok();
        if self.price_api.api_key.is_none() {
            if let Ok(key) = std::env::var("COINGECKO_API_KEY") {
                if !key.trim().is_empty() {
                    self.price_api.api_key = Some(key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletType;

    #[test]
    fn test_partial_file_keeps_chain_defaults() {
        let config: Config = toml::from_str(
            r#"
            [portfolio]
            currency = "EUR"

            [[wallets]]
            type = "metamask"
            address = "0x00000000219ab540356cbb839cbe05303d7705fa"
            "#,
        )
        .unwrap();

        assert_eq!(config.portfolio.currency.as_str(), "eur");
        assert_eq!(config.portfolio.dust_threshold, 0.01);
        assert_eq!(config.wallets.len(), 1);
        assert_eq!(config.wallets[0].wallet_type, WalletType::Metamask);
        assert_eq!(config.chains.blockscout.len(), 5);
        assert_eq!(config.chains.blockscout[0].key, "base");
        assert_eq!(config.chains.rpc.len(), 2);
        assert_eq!(config.chains.rpc[1].tokens[2].decimals, 8);
        assert_eq!(config.price_api.chunk_size, 50);
    }

    #[test]
    fn test_invalid_currency_is_a_config_error() {
        let result: std::result::Result<Config, _> = toml::from_str("[portfolio]\ncurrency = \"not-a-code\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("portfolio-tracker-config-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.http.timeout_secs = 3;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.http.timeout_secs, 3);
        assert_eq!(loaded.chains.solana.rpc_url, "https://api.mainnet-beta.solana.com");
        let _ = fs::remove_file(&path);
    }
}
