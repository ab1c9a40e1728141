use super::PortfolioAggregator;
use crate::api::HttpClient;
use crate::config::Config;
use crate::error::Result;
use crate::pricing::PriceFetcher;
use crate::scanner::ScannerRegistry;
use crate::models::{Currency, LinkedWallet, PortfolioSnapshot};
use crate::wallet::{validate_address, WalletSet};
use log::{debug, error, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Owns the linked wallets, the display currency and the last published
/// snapshot. Every change re-runs the whole aggregation.
///
/// Runs are numbered; a run only publishes if no newer run was started
/// while it was in flight, so a slow scan can never overwrite fresher data.
pub struct PortfolioTracker {
    aggregator: PortfolioAggregator,
    wallets: RwLock<WalletSet>,
    currency: RwLock<Currency>,
    snapshot: RwLock<PortfolioSnapshot>,
    generation: AtomicU64,
}

impl PortfolioTracker {
    pub fn new(aggregator: PortfolioAggregator, wallets: WalletSet, currency: Currency) -> Self {
        Self {
            aggregator,
            wallets: RwLock::new(wallets),
            snapshot: RwLock::new(PortfolioSnapshot::empty(currency.clone())),
            currency: RwLock::new(currency),
            generation: AtomicU64::new(0),
        }
    }

    /// Scanners from the configured chain tables, wallets and currency from
    /// the config file.
    pub fn from_config(config: &Config, http: &HttpClient, prices: Arc<PriceFetcher>) -> Self {
        let scanners = ScannerRegistry::from_config(&config.chains, http);
        let aggregator = PortfolioAggregator::new(scanners, prices, config.portfolio.dust_threshold);
        let wallets = WalletSet::from_wallets(config.wallets.iter().cloned());
        Self::new(aggregator, wallets, config.portfolio.currency.clone())
    }

    pub async fn snapshot(&self) -> PortfolioSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn wallets(&self) -> Vec<LinkedWallet> {
        self.wallets.read().await.wallets().to_vec()
    }

    pub async fn currency(&self) -> Currency {
        self.currency.read().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.snapshot.read().await.summary.loading
    }

    /// Links a wallet and refreshes. Returns `false` without refreshing when
    /// the address is already linked.
    pub async fn add_wallet(&self, wallet: LinkedWallet) -> Result<bool> {
        validate_address(wallet.wallet_type, wallet.address.trim())?;
        {
            let mut wallets = self.wallets.write().await;
            if wallets.contains(&wallet.address) {
                debug!("Wallet {} already linked", wallet.address);
                return Ok(false);
            }
            info!("Linking {} wallet {}", wallet.wallet_type, wallet.address);
            wallets.insert(wallet)?;
        }
        self.refresh().await;
        Ok(true)
    }

    pub async fn remove_wallet(&self, address: &str) -> Result<()> {
        let removed = self.wallets.write().await.remove(address)?;
        info!("Unlinked {} wallet {}", removed.wallet_type, removed.address);
        self.refresh().await;
        Ok(())
    }

    pub async fn set_currency(&self, currency: Currency) {
        *self.currency.write().await = currency;
        self.refresh().await;
    }

    /// Re-runs the aggregation. Returns whether this run's result was
    /// published.
    pub async fn refresh(&self) -> bool {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let wallets = self.wallets().await;
        let currency = self.currency().await;
        self.snapshot.write().await.summary.loading = true;

        let result = self.aggregator.aggregate(&wallets, &currency).await;

        let mut snapshot = self.snapshot.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding portfolio run {}, superseded", generation);
            return false;
        }
        match result {
            Ok(fresh) => {
                *snapshot = fresh;
                true
            }
            Err(e) => {
                error!("Portfolio refresh failed: {}", e);
                snapshot.summary.loading = false;
                false
            }
        }
    }
}
