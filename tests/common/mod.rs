use portfolio_tracker::config::{Config, HttpConfig, PriceApiConfig};

pub const EVM_ADDRESS: &str = "0x00000000219ab540356cbb839cbe05303d7705fa";
pub const SOLANA_ADDRESS: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

// Helper to create a config pointing every upstream at one mock server
pub fn create_test_config(server_url: &str) -> Config {
    let mut config = Config::default();
    config.price_api = PriceApiConfig {
        base_url: server_url.to_string(),
        api_key: None,
        cache_ttl_secs: 120,
        chunk_size: 50,
    };
    config.http = HttpConfig {
        timeout_secs: 5,
        retries: 0,
        retry_backoff_ms: 1,
    };
    config.chains.ethereum.base_url = server_url.to_string();
    for chain in &mut config.chains.blockscout {
        chain.base_url = format!("{}/{}", server_url, chain.key);
    }
    for chain in &mut config.chains.rpc {
        chain.rpc_url = format!("{}/rpc/{}", server_url, chain.id);
    }
    config.chains.solana.rpc_url = format!("{}/solana", server_url);
    config
}
