use std::result::Result as StdResult;
use thiserror::Error;
use std::io;

#[derive(Debug, Error)]
pub enum Error {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("API invalid data: {0}")]
    ApiInvalidData(String),
    #[error("API invalid format: {0}")]
    ApiInvalidFormat(String),
    #[error("API authentication failed: {0}")]
    ApiAuthFailed(String),
    #[error("API maintenance: {0}")]
    ApiMaintenance(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("RPC error: {0}")]
    RpcError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),
    #[error("Wallet already linked: {0}")]
    DuplicateWallet(String),
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),
    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl Error {
    /// Message suitable for showing to the end user. Wallet problems get a
    /// plain explanation, everything else collapses to a generic notice.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidAddress(addr) => format!("\"{}\" is not a valid wallet address", addr),
            Error::DuplicateWallet(addr) => format!("Wallet {} is already linked", addr),
            Error::WalletNotFound(addr) => format!("Wallet {} is not linked", addr),
            Error::InvalidInput(msg) | Error::ValidationError(msg) => msg.clone(),
            Error::RateLimitExceeded(_) => "Price service is busy, showing cached prices".to_string(),
            _ => "Something went wrong while loading your portfolio".to_string(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimitExceeded(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ApiInvalidFormat(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::InternalError(err.to_string())
    }
}

pub type Result<T> = StdResult<T, Error>;
