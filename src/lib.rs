pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod portfolio;
pub mod pricing;
pub mod scanner;
pub mod utils;
pub mod wallet;

pub use error::{Error, Result};

// Declare tests module only when testing
#[cfg(test)]
pub mod tests;
