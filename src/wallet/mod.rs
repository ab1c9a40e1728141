use crate::error::{Error, Result};
use crate::models::{LinkedWallet, WalletType};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// `0x` followed by 40 hex digits, any case.
pub fn is_evm_address(address: &str) -> bool {
    match address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) {
        Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// 32 to 44 base58 characters.
pub fn is_solana_address(address: &str) -> bool {
    (32..=44).contains(&address.len()) && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Hex EVM addresses match in any case. Base58 Solana addresses are
/// case-sensitive and match exactly.
pub fn same_address(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if is_evm_address(a) && is_evm_address(b) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

pub fn validate_address(wallet_type: WalletType, address: &str) -> Result<()> {
    let valid = match wallet_type {
        WalletType::Metamask => is_evm_address(address),
        WalletType::Phantom => is_solana_address(address),
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidAddress(address.to_string()))
    }
}

/// The linked wallets of one user. Addresses are unique under
/// [`same_address`].
#[derive(Debug, Clone, Default)]
pub struct WalletSet {
    wallets: Vec<LinkedWallet>,
}

impl WalletSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from stored wallets, skipping duplicates and invalid
    /// addresses.
    pub fn from_wallets(wallets: impl IntoIterator<Item = LinkedWallet>) -> Self {
        let mut set = Self::new();
        for wallet in wallets {
            if let Err(e) = set.insert(wallet) {
                log::warn!("Skipping stored wallet: {}", e);
            }
        }
        set
    }

    pub fn insert(&mut self, mut wallet: LinkedWallet) -> Result<()> {
        wallet.address = wallet.address.trim().to_string();
        validate_address(wallet.wallet_type, &wallet.address)?;
        if self.contains(&wallet.address) {
            return Err(Error::DuplicateWallet(wallet.address));
        }
        self.wallets.push(wallet);
        Ok(())
    }

    pub fn remove(&mut self, address: &str) -> Result<LinkedWallet> {
        let address = address.trim();
        let index = self
            .wallets
            .iter()
            .position(|w| same_address(&w.address, address))
            .ok_or_else(|| Error::WalletNotFound(address.to_string()))?;
        Ok(self.wallets.remove(index))
    }

    pub fn contains(&self, address: &str) -> bool {
        self.wallets.iter().any(|w| same_address(&w.address, address))
    }

    pub fn wallets(&self) -> &[LinkedWallet] {
        &self.wallets
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
