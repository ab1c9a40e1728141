//! Token symbol to price-feed id mapping.
//!
//! Well-known symbols always map to their canonical id, overriding whatever
//! the scanner reported (wrapped and bridged variants share the id of the
//! underlying asset). Anything else keeps the scanner's id, or falls back to
//! the lowercased symbol, which may not resolve to a real price.

use crate::models::RawAsset;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref SYMBOL_PRICE_IDS: HashMap<&'static str, &'static str> = HashMap::from([
        ("ETH", "ethereum"),
        ("WETH", "ethereum"),
        ("BTC", "bitcoin"),
        ("WBTC", "bitcoin"),
        ("USDT", "tether"),
        ("USDC", "usd-coin"),
        ("DAI", "dai"),
        ("MATIC", "matic-network"),
        ("AVAX", "avalanche-2"),
        ("BNB", "binancecoin"),
        ("ARB", "arbitrum"),
        ("OP", "optimism"),
    ]);
}

/// Table lookup only; `symbol` is matched case-insensitively.
pub fn price_id_for_symbol(symbol: &str) -> Option<&'static str> {
    SYMBOL_PRICE_IDS
        .get(symbol.trim().to_uppercase().as_str())
        .copied()
}

/// Table hit, then the scanner's id, then the lowercased symbol.
pub fn resolve_price_id(asset: &RawAsset) -> String {
    if let Some(id) = price_id_for_symbol(&asset.symbol) {
        return id.to_string();
    }
    match &asset.id {
        Some(id) if !id.is_empty() => id.clone(),
        _ => asset.symbol.trim().to_lowercase(),
    }
}

pub fn assign_price_ids(assets: &mut [RawAsset]) {
    for asset in assets.iter_mut() {
        asset.id = Some(resolve_price_id(asset));
    }
}
