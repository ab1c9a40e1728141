use crate::error::{Error, Result};
use crate::models::{PricedAsset, RawAsset};
use crate::models::market::PriceQuote;
use crate::scanner::ChainScanner;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const EVM_ADDRESS: &str = "0x00000000219ab540356cBB839Cbe05303d7705Fa";
pub const EVM_ADDRESS_2: &str = "0xbe0eb53f46cd790cd13851d5eff43d12404d33e8";
pub const SOLANA_ADDRESS: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

pub fn raw_token(symbol: &str, chain: &str, balance: f64, id: Option<&str>) -> RawAsset {
    RawAsset {
        id: id.map(str::to_string),
        name: symbol.to_string(),
        symbol: symbol.to_string(),
        balance,
        chain: chain.to_string(),
        contract_address: Some(format!("0x{}", symbol.to_lowercase())),
    }
}

pub fn priced(symbol: &str, chain: &str, balance: f64, price: f64, change_24h: f64) -> PricedAsset {
    let mut asset = PricedAsset::unpriced(raw_token(symbol, chain, balance, Some(&symbol.to_lowercase())));
    asset.apply_quote(&PriceQuote { price, change_24h });
    asset
}

enum Behavior {
    Always(Vec<RawAsset>),
    ForAddress(String, Vec<RawAsset>),
    Sequence(Mutex<VecDeque<(Duration, Vec<RawAsset>)>>),
    Failing(Mutex<Option<Error>>),
    PanicAfter(usize, Vec<RawAsset>),
}

/// Scripted scanner for aggregation and tracker tests.
pub struct FakeScanner {
    name: String,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl FakeScanner {
    fn with(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn returning(name: &str, assets: Vec<RawAsset>) -> Self {
        Self::with(name, Behavior::Always(assets))
    }

    /// Reports `assets` for `address` and nothing for any other wallet.
    pub fn for_address(name: &str, address: &str, assets: Vec<RawAsset>) -> Self {
        Self::with(name, Behavior::ForAddress(address.to_lowercase(), assets))
    }

    /// One scripted (delay, result) per call, then empty results.
    pub fn sequence(name: &str, steps: Vec<(Duration, Vec<RawAsset>)>) -> Self {
        Self::with(name, Behavior::Sequence(Mutex::new(steps.into())))
    }

    /// Fails the first scan with `error`, later scans with a generic one.
    pub fn failing(name: &str, error: Error) -> Self {
        Self::with(name, Behavior::Failing(Mutex::new(Some(error))))
    }

    /// Succeeds `ok_calls` times, then panics inside the scan task.
    pub fn panicking_after(name: &str, ok_calls: usize, assets: Vec<RawAsset>) -> Self {
        Self::with(name, Behavior::PanicAfter(ok_calls, assets))
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl ChainScanner for FakeScanner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn try_scan(&self, address: &str) -> Result<Vec<RawAsset>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.behavior {
            Behavior::Always(assets) => Ok(assets.clone()),
            Behavior::ForAddress(wanted, assets) => {
                if address.to_lowercase() == *wanted {
                    Ok(assets.clone())
                } else {
                    Ok(Vec::new())
                }
            }
            Behavior::Sequence(steps) => {
                let step = steps.lock().unwrap().pop_front();
                match step {
                    Some((delay, assets)) => {
                        tokio::time::sleep(delay).await;
                        Ok(assets)
                    }
                    None => Ok(Vec::new()),
                }
            }
            Behavior::Failing(error) => {
                let error = error.lock().unwrap().take();
                Err(error.unwrap_or_else(|| Error::NetworkError("scripted failure".to_string())))
            }
            Behavior::PanicAfter(ok_calls, assets) => {
                if call > *ok_calls {
                    panic!("scripted scanner panic on call {}", call);
                }
                Ok(assets.clone())
            }
        }
    }
}
