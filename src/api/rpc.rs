use super::HttpClient;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal JSON-RPC 2.0 client shared by the EVM and Solana scanners.
#[derive(Debug)]
pub struct JsonRpcClient {
    http: HttpClient,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let payload = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let request = self.http.inner().post(&self.url).json(&payload);
        let response: JsonRpcResponse<T> = self.http.get_json(request).await?;

        if let Some(err) = response.error {
            return Err(Error::RpcError(format!(
                "{} failed with code {}: {}",
                method, err.code, err.message
            )));
        }
        response
            .result
            .ok_or_else(|| Error::RpcError(format!("{} returned no result", method)))
    }
}

/// Parse a `0x`-prefixed hex quantity. Values beyond `u128` lose precision
/// but keep their magnitude.
pub fn parse_hex_quantity(hex: &str) -> Result<f64> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| Error::ParseError(format!("Missing 0x prefix in quantity '{}'", hex)))?;
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0.0);
    }
    if digits.len() <= 32 {
        return u128::from_str_radix(digits, 16)
            .map(|v| v as f64)
            .map_err(|e| Error::ParseError(format!("Invalid hex quantity '{}': {}", hex, e)));
    }

    let mut value = 0f64;
    for c in digits.chars() {
        let nibble = c
            .to_digit(16)
            .ok_or_else(|| Error::ParseError(format!("Invalid hex quantity '{}'", hex)))?;
        value = value * 16.0 + nibble as f64;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x0").unwrap(), 0.0);
        assert_eq!(parse_hex_quantity("0x").unwrap(), 0.0);
        assert_eq!(parse_hex_quantity("0xde0b6b3a7640000").unwrap(), 1e18);
        assert_eq!(
            parse_hex_quantity("0x00000000000000000000000000000000000000000000000000000000000f4240").unwrap(),
            1_000_000.0
        );
        assert!(parse_hex_quantity("1234").is_err());
        assert!(parse_hex_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn test_call_surfaces_rpc_error_object() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_call"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#)
            .create_async()
            .await;

        let http = HttpClient::new(&HttpConfig::default()).unwrap();
        let client = JsonRpcClient::new(http, server.url());
        let result: Result<String> = client.call("eth_call", json!([])).await;

        match result {
            Err(Error::RpcError(msg)) => assert!(msg.contains("execution reverted")),
            other => panic!("expected RpcError, got {:?}", other),
        }
    }
}
