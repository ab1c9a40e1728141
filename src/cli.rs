use crate::models::{Currency, LinkedWallet, WalletType};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Display currency, overrides the config file
    #[arg(long)]
    pub currency: Option<Currency>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Hide balances and values in the output
    #[arg(long)]
    pub ghost: bool,

    /// Keep rescanning at the configured refresh interval
    #[arg(short, long)]
    pub watch: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Scan the linked wallets and print the portfolio (default)
    Scan {
        /// Extra wallet as `metamask:<address>` or `phantom:<address>`
        #[arg(long = "wallet", value_parser = parse_wallet)]
        wallets: Vec<LinkedWallet>,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Print collected metrics after the scan
        #[arg(long)]
        metrics: bool,
    },
    /// Coins ranked by market cap
    Top {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Search coins by name or symbol
    Search { query: String },
    /// Price history of one coin
    History {
        id: String,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Trending coins
    Trending,
}

pub fn parse_wallet(arg: &str) -> Result<LinkedWallet, String> {
    let (kind, address) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected <type>:<address>, got '{}'", arg))?;
    let wallet_type = match kind.trim().to_lowercase().as_str() {
        "metamask" | "evm" => WalletType::Metamask,
        "phantom" | "solana" => WalletType::Phantom,
        other => return Err(format!("unknown wallet type '{}'", other)),
    };
    Ok(LinkedWallet::new(wallet_type, address.trim()))
}

/// Amount with two decimals and the currency code, masked in ghost mode.
pub fn format_value(value: f64, currency: &Currency, ghost: bool) -> String {
    if ghost {
        return "*****".to_string();
    }
    format!("{:.2} {}", value, currency.as_str().to_uppercase())
}

pub fn format_change(percent: f64) -> String {
    format!("{:+.2}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_with_extra_wallets() {
        let cli = Cli::parse_from([
            "portfolio-tracker",
            "--currency",
            "EUR",
            "--ghost",
            "scan",
            "--wallet",
            "metamask:0x00000000219ab540356cbb839cbe05303d7705fa",
            "--wallet",
            "phantom:9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
        ]);

        assert_eq!(cli.currency.unwrap().as_str(), "eur");
        assert!(cli.ghost);
        match cli.command {
            Some(Command::Scan { wallets, json, .. }) => {
                assert!(!json);
                assert_eq!(wallets.len(), 2);
                assert_eq!(wallets[1].wallet_type, WalletType::Phantom);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_wallet_argument() {
        assert!(parse_wallet("0x1234").is_err());
        assert!(parse_wallet("ledger:0x1234").is_err());
        assert!(Cli::try_parse_from(["portfolio-tracker", "--currency", "euro-zone"]).is_err());
    }

    #[test]
    fn test_format_value() {
        let usd = Currency::usd();
        assert_eq!(format_value(1234.567, &usd, false), "1234.57 USD");
        assert_eq!(format_value(1234.567, &usd, true), "*****");
        assert_eq!(format_change(-2.5), "-2.50%");
        assert_eq!(format_change(5.0), "+5.00%");
    }
}
