use crate::error::{Error, Result};
use crate::models::market::PriceQuote;
use crate::models::{Currency, LinkedWallet, PortfolioSnapshot, PortfolioSummary, PricedAsset, RawAsset};
use crate::pricing::{symbols, PriceFetcher};
use crate::scanner::ScannerRegistry;
use chrono::Utc;
use futures::future::join_all;
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub const DEFAULT_DUST_THRESHOLD: f64 = 0.01;

/// Scans every linked wallet, prices the result and builds a snapshot.
pub struct PortfolioAggregator {
    scanners: ScannerRegistry,
    prices: Arc<PriceFetcher>,
    dust_threshold: f64,
}

impl PortfolioAggregator {
    pub fn new(scanners: ScannerRegistry, prices: Arc<PriceFetcher>, dust_threshold: f64) -> Self {
        Self {
            scanners,
            prices,
            dust_threshold,
        }
    }

    pub fn prices(&self) -> &Arc<PriceFetcher> {
        &self.prices
    }

    /// All balances of all wallets. Wallets are scanned on their own tasks,
    /// the chains of one wallet concurrently within it.
    pub async fn scan_wallets(&self, wallets: &[LinkedWallet]) -> Result<Vec<RawAsset>> {
        let handles: Vec<_> = wallets
            .iter()
            .map(|wallet| {
                let scanners = self.scanners.for_wallet(wallet.wallet_type).to_vec();
                let address = wallet.address.clone();
                tokio::spawn(async move {
                    let scans = scanners.iter().map(|scanner| scanner.scan(&address));
                    join_all(scans).await.into_iter().flatten().collect::<Vec<_>>()
                })
            })
            .collect();

        let mut assets = Vec::new();
        for result in join_all(handles).await {
            let wallet_assets = result.map_err(|e| Error::InternalError(format!("Wallet scan task failed: {}", e)))?;
            assets.extend(wallet_assets);
        }
        Ok(assets)
    }

    pub async fn aggregate(&self, wallets: &[LinkedWallet], currency: &Currency) -> Result<PortfolioSnapshot> {
        if wallets.is_empty() {
            return Ok(PortfolioSnapshot::empty(currency.clone()));
        }

        let mut raw = self.scan_wallets(wallets).await?;
        symbols::assign_price_ids(&mut raw);
        let mut assets: Vec<PricedAsset> = raw.into_iter().map(PricedAsset::unpriced).collect();

        let wanted: Vec<String> = assets
            .iter()
            .filter(|a| a.needs_price())
            .filter_map(|a| a.asset.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        debug!("{} assets found, {} distinct price ids", assets.len(), wanted.len());

        let quotes = self.prices.get_prices(&wanted, currency).await;
        apply_prices(&mut assets, &quotes);

        let mut assets = filter_dust(assets, self.dust_threshold);
        sort_assets(&mut assets);
        let summary = summarize(&assets);
        info!(
            "Portfolio of {} wallets: {} assets, {:.2} {}",
            wallets.len(),
            assets.len(),
            summary.total_value,
            currency
        );

        Ok(PortfolioSnapshot {
            summary,
            assets,
            currency: currency.clone(),
            generated_at: Utc::now(),
        })
    }
}

pub fn apply_prices(assets: &mut [PricedAsset], quotes: &HashMap<String, PriceQuote>) {
    for asset in assets.iter_mut().filter(|a| a.needs_price()) {
        if let Some(quote) = asset.asset.id.as_ref().and_then(|id| quotes.get(id)) {
            asset.apply_quote(quote);
        }
    }
}

/// Drops assets worth `threshold` or less, except on the primary chains.
pub fn filter_dust(assets: Vec<PricedAsset>, threshold: f64) -> Vec<PricedAsset> {
    assets
        .into_iter()
        .filter(|a| a.asset.is_primary_chain() || a.value_or_zero() > threshold)
        .collect()
}

/// Highest value first, unpriced last; equal values fall back to chain,
/// symbol and balance so the order never depends on scan timing.
pub fn sort_assets(assets: &mut [PricedAsset]) {
    assets.sort_by(|a, b| {
        b.value_or_zero()
            .total_cmp(&a.value_or_zero())
            .then_with(|| a.value.is_none().cmp(&b.value.is_none()))
            .then_with(|| a.asset.chain.cmp(&b.asset.chain))
            .then_with(|| a.asset.symbol.cmp(&b.asset.symbol))
            .then_with(|| b.asset.balance.total_cmp(&a.asset.balance))
            .then_with(|| a.asset.contract_address.cmp(&b.asset.contract_address))
    });
}

pub fn summarize(assets: &[PricedAsset]) -> PortfolioSummary {
    let total_value: f64 = assets.iter().map(PricedAsset::value_or_zero).sum();
    let weighted: f64 = assets.iter().map(|a| a.value_or_zero() * a.change_24h).sum();
    let change_24h_percent = if total_value > 0.0 { weighted / total_value } else { 0.0 };

    PortfolioSummary {
        total_value,
        change_24h: total_value * change_24h_percent / 100.0,
        change_24h_percent,
        loading: false,
    }
}
